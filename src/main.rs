//! Headless match-3 runner (default binary).
//!
//! Owns the board engine, serves it over the TCP adapter, and paces
//! cascades so a connected presentation layer can animate each step.

use std::time::{Duration, Instant};

use anyhow::Result;
use env_logger::Env;
use log::info;

use match_three::adapter::{Adapter, GameConfig};
use match_three::driver::Driver;

/// Upper bound on how long the loop sleeps waiting for commands
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = GameConfig::from_env();
    info!(
        "starting {}x{} board, {} kinds, target {}",
        config.engine.width, config.engine.height, config.engine.kind_count, config.engine.target_score
    );

    let mut driver = Driver::new(config)?;
    info!("seed {}", driver.engine().seed());
    let mut adapter = Adapter::start_from_env()?;

    loop {
        let now = Instant::now();
        while let Some(inbound) = adapter.try_recv() {
            for msg in driver.handle(inbound, now)? {
                adapter.send(msg);
            }
        }

        if let Some(msg) = driver.tick(Instant::now())? {
            adapter.send(msg);
        }

        let wait = driver
            .due_in(Instant::now())
            .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL));
        std::thread::sleep(wait);
    }
}
