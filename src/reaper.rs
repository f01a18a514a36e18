use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::vacation::VacationService;

/// Periodically rejects pending requests that outlived the expiry policy.
/// Runs until the runtime shuts down. Sweep failures are logged and the next
/// tick tries again.
pub async fn run_reaper(service: Arc<VacationService>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = every.as_secs(), "Pending request reaper started");

    loop {
        ticker.tick().await;
        match service.expire_stale_pending().await {
            Ok(0) => debug!("Reaper found nothing to expire"),
            Ok(expired) => info!(expired, "Reaper expired stale vacation requests"),
            Err(e) => error!(error = %e, "Reaper sweep failed"),
        }
    }
}
