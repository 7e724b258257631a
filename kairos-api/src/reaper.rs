use kairos_availability::SlotHoldArbiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Background sweep that reclaims expired slot holds. Acquisition also
/// reclaims lazily, so this only bounds how long stale holds linger.
pub fn spawn_hold_reaper(arbiter: Arc<SlotHoldArbiter>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let now = chrono::Local::now().naive_local();
            let reclaimed = arbiter.reclaim_expired(now).await;
            if reclaimed > 0 {
                info!(reclaimed, "expired slot holds reclaimed");
            }
        }
    })
}
