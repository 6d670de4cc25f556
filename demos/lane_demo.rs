use std::sync::Arc;

use laned::{LanedManager, RoundRobin};
use laned_testkit::InMemoryTransportFactory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let manager = LanedManager::new(
        "demo-upstream",
        8,
        InMemoryTransportFactory::new(),
        Arc::new(RoundRobin::new()),
    )
    .await?;

    println!(
        "laned manager up with {} lanes",
        manager.open_lane_count()
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let handle = manager.acquire().await?;
        println!("acquired lane {}", handle.lane_index());
        handles.push(handle);
    }
    drop(handles);

    manager.teardown().await?;
    println!("torn down");

    Ok(())
}
