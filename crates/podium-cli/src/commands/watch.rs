//! Live standings in the terminal.
//!
//! Another process writes `scores.json`; a poller thread reloads it when its
//! modification time changes, which publishes a change to the live feed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use podium::{Config, Engine, StandingsVersion, TournamentId};
use tracing::{debug, info, warn};

use super::standings::format_table;
use crate::shutdown::ShutdownSignal;

pub fn run(
    engine: &Engine,
    config: &Config,
    tournament_id: TournamentId,
    interval_ms: u64,
) -> Result<()> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let on_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        on_ctrlc.trigger();
    })?;

    let interval = Duration::from_millis(interval_ms.max(50));
    let poller = spawn_poller(
        engine.clone(),
        config.storage.scores_path(),
        interval,
        Arc::clone(&shutdown),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let result = runtime.block_on(follow(engine, tournament_id, interval * 4, &shutdown));

    shutdown.trigger();
    if poller.join().is_err() {
        warn!("Score poller panicked");
    }
    result
}

/// Print standings on every change until shutdown.
///
/// An idle feed closes; the loop then subscribes again, which pulls fresh
/// standings but only prints them if the version moved.
async fn follow(
    engine: &Engine,
    tournament_id: TournamentId,
    idle: Duration,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let mut printed: Option<StandingsVersion> = None;
    while !shutdown.is_shutdown() {
        let mut feed = engine
            .subscribe_standings(tournament_id)?
            .with_idle_timeout(idle);
        while let Some(standings) = feed.next().await {
            let standings = standings?;
            if printed != Some(standings.version) {
                printed = Some(standings.version);
                println!("{}", format_table(&standings));
            }
            if shutdown.is_shutdown() {
                break;
            }
        }
    }
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn spawn_poller(
    engine: Engine,
    path: PathBuf,
    interval: Duration,
    shutdown: Arc<ShutdownSignal>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut seen = modified(&path);
        while !shutdown.wait(interval) {
            let current = modified(&path);
            if current == seen {
                continue;
            }
            seen = current;
            match engine.reload_scores() {
                Ok(changed) if !changed.is_empty() => {
                    debug!("Reloaded scores, changed tournaments: {:?}", changed)
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to reload {}: {}", path.display(), e),
            }
        }
    })
}
