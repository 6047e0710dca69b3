use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background task that rewrites a tenant's WAL once enough appends
/// have accumulated since the last compaction. Purely ambient storage
/// maintenance; request semantics never wait on it.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let appends = engine.wal_appends_since_compact().await;
        if appends < threshold {
            continue;
        }
        match engine.compact_wal().await {
            Ok(()) => info!("compacted WAL after {appends} appends"),
            Err(e) => tracing::warn!("WAL compaction failed: {e}"),
        }
    }
}
