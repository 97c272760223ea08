//! Clone command

use crate::executor::clone;
use crate::types::{CloneError, CloneStats};
use crate::Config;
use tokio::runtime::Builder;

/// Run one clone on a dedicated multi-thread runtime
pub fn run(config: Config) -> Result<CloneStats, CloneError> {
    // Configs built in code may skip Config::validate; tokio panics on 0 workers
    let runtime = Builder::new_multi_thread()
        .worker_threads(config.worker_threads.max(1))
        .enable_all()
        .build()
        .map_err(|e| CloneError::Runtime(e.to_string()))?;

    let request = config.to_request();
    log::debug!("Request: {:?}", request);
    log::info!(
        "Cloning {} into {}",
        config.source.display(),
        config.destination_root.display()
    );

    let stats = runtime.block_on(clone(&request))?;
    log::info!("{}", format_summary(&stats));
    Ok(stats)
}

/// One-line human summary of a finished clone
pub fn format_summary(stats: &CloneStats) -> String {
    let mut summary = format!(
        "Clone complete: {} file(s), {} director{}, {} byte(s)",
        stats.files_copied,
        stats.dirs_created,
        if stats.dirs_created == 1 { "y" } else { "ies" },
        stats.bytes_copied
    );
    if stats.replaced_existing {
        summary.push_str(" (replaced existing entry)");
    }
    summary
}
