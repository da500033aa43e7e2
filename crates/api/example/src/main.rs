use fairgate_api::{FairgateConfig, FairgateInstance, WakePolicy};
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    let instance = FairgateInstance::create(FairgateConfig {
        rooms: 2,
        requesters: 6,
        min_hold: Duration::from_millis(100),
        max_hold: Duration::from_millis(400),
        wake_policy: WakePolicy::HeadOnly,
        acquire_timeout: None,
        seed: Some(2024),
        stats_file: Some(PathBuf::from("/tmp/fairgate-example-stats")),
        messages_callback: Some(|lvl, msg| match lvl {
            fairgate_api::MessageLevel::Info => {
                println!("Info: {}", msg);
            }
            fairgate_api::MessageLevel::Warning => {
                println!("Warning: {}", msg);
            }
            fairgate_api::MessageLevel::Error => {
                println!("Error: {}", msg);
            }
            fairgate_api::MessageLevel::UnrecoverableError => {
                panic!("Unrecoverable error: {}", msg);
            }
        }),
    })
    .unwrap();

    let report = instance.run_reservations().unwrap();

    for record in &report.records {
        println!(
            "Requester {} waited {:?} and held its room for {:?}",
            record.id,
            record.wait_time(),
            record.hold_time()
        );
    }
    println!("Grant order: {:?}", report.grant_order);
}
