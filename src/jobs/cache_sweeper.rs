// ==================== OTP CACHE SWEEPER ====================
// Background job that drops expired one-time codes so abandoned
// signups don't accumulate entries. Reads already skip expired codes;
// this only reclaims memory.

use crate::utils::cache::OtpCache;
use std::sync::Arc;
use tokio::time::{interval, Duration};

const SWEEP_INTERVAL_SECS: u64 = 60;

pub fn start_cache_sweeper(cache: Arc<OtpCache>) {
    log::info!("🧹 Starting OTP cache sweeper (every {}s)", SWEEP_INTERVAL_SECS);

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        // First tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                log::debug!("🧹 Purged {} expired OTP entries ({} live)", purged, cache.len());
            }
        }
    });
}
