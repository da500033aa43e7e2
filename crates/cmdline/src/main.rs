use backtrace::Backtrace;
use fairgate_api::{FairgateConfig, FairgateInstance, ReservationReport, WakePolicy};
use fairgate_logging::UnrecoverableErrorLogging;
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::exit;
use std::sync::atomic::Ordering;
use std::time::Duration;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
enum CliArgs {
    /// Lets a group of requesters share a fixed number of rooms, first come first served
    Simulate(SimulateArgs),
}

#[derive(StructOpt, Debug)]
struct SimulateArgs {
    /// Number of rooms
    #[structopt(short, long, default_value = "3")]
    pub rooms: usize,

    /// Number of requesters, all started at the same time
    #[structopt(short = "n", long, default_value = "10")]
    pub requesters: u32,

    /// Minimum time a requester keeps its room (milliseconds)
    #[structopt(long = "min-hold-ms", default_value = "1000")]
    pub min_hold_ms: u64,

    /// Maximum time a requester keeps its room (milliseconds)
    #[structopt(long = "max-hold-ms", default_value = "5000")]
    pub max_hold_ms: u64,

    /// Wake only the oldest waiter when a room is freed
    #[structopt(long = "head-only")]
    pub head_only: bool,

    /// Requesters give up after waiting this long (milliseconds)
    #[structopt(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Seed for the hold times
    #[structopt(short, long)]
    pub seed: Option<u64>,

    /// The path to an optional json-formatted stats file
    #[structopt(long = "stats-file")]
    pub stats_file: Option<PathBuf>,

    /// Do not print the status of each requester
    #[structopt(short, long)]
    pub quiet: bool,
}

impl SimulateArgs {
    fn to_config(&self) -> FairgateConfig {
        FairgateConfig {
            rooms: self.rooms,
            requesters: self.requesters,
            min_hold: Duration::from_millis(self.min_hold_ms),
            max_hold: Duration::from_millis(self.max_hold_ms),
            wake_policy: if self.head_only {
                WakePolicy::HeadOnly
            } else {
                WakePolicy::Broadcast
            },
            acquire_timeout: self.timeout_ms.map(Duration::from_millis),
            seed: self.seed,
            stats_file: self.stats_file.clone(),
            messages_callback: None,
        }
    }
}

fn print_summary(report: &ReservationReport) {
    println!(
        "Served {} requesters in {:.2?}, at most {} rooms in use at once",
        report.grant_order.len(),
        report.total_time,
        report.max_concurrent_holders
    );
    println!("Grant order: {:?}", report.grant_order);
    println!("Longest wait: {:.2?}", report.longest_wait());
    if !report.timed_out.is_empty() {
        println!("Gave up: {:?}", report.timed_out);
    }
}

fn run_simulation(args: SimulateArgs) -> anyhow::Result<()> {
    config::PRINT_STATUS.store(!args.quiet, Ordering::Relaxed);

    let instance = FairgateInstance::create(args.to_config())?;
    let report = instance.run_reservations()?;
    print_summary(&report);
    Ok(())
}

fn main() {
    let args: CliArgs = CliArgs::from_args();

    panic::set_hook(Box::new(move |info| {
        let stdout = std::io::stdout();
        let mut _lock = stdout.lock();

        let stderr = std::io::stderr();
        let mut err_lock = stderr.lock();

        if let Some(location) = info.location() {
            let _ = writeln!(err_lock, "Thread panicked at location: {}", location);
        }
        if let Some(s) = info.payload().downcast_ref::<&str>() {
            let _ = writeln!(err_lock, "Panic payload: {:?}", s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            let _ = writeln!(err_lock, "Panic payload: {:?}", s);
        }

        let _ = writeln!(err_lock, "Backtrace: {:?}", Backtrace::new());

        exit(1);
    }));

    match args {
        CliArgs::Simulate(args) => {
            let _ = run_simulation(args).log_unrecoverable_error("Simulation failed");
        }
    }
}
