pub mod stats;

use std::fmt::{Debug, Display};
use std::io::Write;

use parking_lot::Mutex;

/// Severity of a message. `UnrecoverableError` aborts the run unless a
/// callback is installed.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Info = 0,
    Warning = 1,
    Error = 2,
    UnrecoverableError = 3,
}

impl MessageLevel {
    /// Short label printed in front of messages going to stderr
    pub fn tag(self) -> &'static str {
        match self {
            MessageLevel::Info => "info",
            MessageLevel::Warning => "warning",
            MessageLevel::Error => "error",
            MessageLevel::UnrecoverableError => "fatal",
        }
    }
}

static MESSAGES_CALLBACK: Mutex<Option<fn(MessageLevel, &str)>> = Mutex::new(None);

/// Routes every message to `callback` instead of the standard streams.
///
/// The callback is process wide: the last one installed wins, and it also
/// receives unrecoverable errors, which then no longer panic.
pub fn setup_logging_callback(callback: fn(MessageLevel, &str)) {
    *MESSAGES_CALLBACK.lock() = Some(callback);
}

/// Goes back to printing on stdout and stderr.
pub fn clear_logging_callback() {
    *MESSAGES_CALLBACK.lock() = None;
}

/// Without a callback, info goes to stdout, warnings and errors go to stderr
/// with their tag.
pub fn log(level: MessageLevel, message: &str) {
    // The callback may log again, so it runs outside the lock
    let callback = *MESSAGES_CALLBACK.lock();
    if let Some(callback) = callback {
        callback(level, message);
        return;
    }

    match level {
        MessageLevel::UnrecoverableError => panic!("{}", message),
        MessageLevel::Info => println!("{}", message),
        MessageLevel::Warning | MessageLevel::Error => {
            let _ = writeln!(std::io::stderr().lock(), "[{}] {}", level.tag(), message);
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($level:ident, $($arg:tt)*) => {
        $crate::log($crate::MessageLevel::$level, &format!($($arg)*))
    };
}

/// Formats and logs an info message, e.g. a requester status line.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log_at!(Info, $($arg)*);
    };
}

/// Formats and logs a warning.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log_at!(Warning, $($arg)*);
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log_at!(Error, $($arg)*);
    };
}

/// Logs the error of a failed result at the unrecoverable level and passes
/// the result through unchanged, so it can still be propagated with `?`.
pub trait UnrecoverableErrorLogging {
    fn log_unrecoverable_error(self, message: &str) -> Self;

    /// Same as `log_unrecoverable_error`, with `data` (a path, an id)
    /// shown in brackets after the message.
    fn log_unrecoverable_error_with_data<D: Display>(self, message: &str, data: D) -> Self;
}

impl<T, E: Debug> UnrecoverableErrorLogging for std::result::Result<T, E> {
    fn log_unrecoverable_error(self, message: &str) -> Self {
        self.inspect_err(|err| log_at!(UnrecoverableError, "{}: {:?}", message, err))
    }

    fn log_unrecoverable_error_with_data<D: Display>(self, message: &str, data: D) -> Self {
        self.inspect_err(|err| {
            log_at!(UnrecoverableError, "{} [{}]: {:?}", message, data, err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CAPTURED: Mutex<Vec<(MessageLevel, String)>> = Mutex::new(Vec::new());

    fn capture(level: MessageLevel, message: &str) {
        CAPTURED.lock().push((level, message.to_string()));
    }

    #[test]
    fn test_callback_receives_messages() {
        setup_logging_callback(capture);

        info!("requester {} is waiting", 3);
        warn!("slow release");
        let result: Result<(), &str> = Err("broken");
        let _ = result.log_unrecoverable_error_with_data("release failed", 3);
        let fine: Result<u32, &str> = Ok(2);
        assert_eq!(fine.log_unrecoverable_error("never logged"), Ok(2));
        error!("room {} lost", 1);

        clear_logging_callback();

        let captured = CAPTURED.lock();
        assert_eq!(
            captured[0],
            (MessageLevel::Info, "requester 3 is waiting".to_string())
        );
        assert_eq!(captured[1].0, MessageLevel::Warning);
        assert_eq!(
            captured[2],
            (
                MessageLevel::UnrecoverableError,
                "release failed [3]: \"broken\"".to_string()
            )
        );
        assert_eq!(captured.len(), 4);
        assert_eq!(captured[3], (MessageLevel::Error, "room 1 lost".to_string()));
    }
}
