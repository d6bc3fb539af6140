//! Position sampling with timeout and cache policy.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::position::{PositionError, PositionOptions, PositionSource};
use domain::models::PositionFix;

struct CachedFix {
    fix: PositionFix,
    fetched_at: Instant,
}

/// Wraps a [`PositionSource`] with the two sampling profiles.
///
/// One-shot reads honour the profile's cache window and return a recent fix
/// without touching the source. Watch samples always pull a fresh fix (the
/// profile's max age is advisory to the source) but still refresh the cache
/// for later one-shot reads. Requests that outlive the profile timeout fail
/// with a timeout position error.
pub struct PositionSampler {
    source: Arc<dyn PositionSource>,
    cache: Mutex<Option<CachedFix>>,
}

impl PositionSampler {
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(None),
        }
    }

    /// One-shot position read (15 s timeout, 5-minute cache).
    pub async fn one_shot(&self) -> Result<PositionFix, PositionError> {
        let options = PositionOptions::one_shot();
        if let Some(cached) = self.cached_fix(&options) {
            return Ok(cached);
        }
        self.fetch(&options).await
    }

    /// Continuous-tracking sample (20 s timeout, always fresh).
    pub async fn watch_sample(&self) -> Result<PositionFix, PositionError> {
        self.fetch(&PositionOptions::watch()).await
    }

    fn cached_fix(&self, options: &PositionOptions) -> Option<PositionFix> {
        let cache = self.cache.lock().expect("sampler cache poisoned");
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() <= options.max_age)
            .map(|c| c.fix.clone())
    }

    async fn fetch(&self, options: &PositionOptions) -> Result<PositionFix, PositionError> {
        let fix = match tokio::time::timeout(
            options.timeout,
            self.source.current_position(options),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(PositionError::timeout()),
        };

        let mut cache = self.cache.lock().expect("sampler cache poisoned");
        *cache = Some(CachedFix {
            fix: fix.clone(),
            fetched_at: Instant::now(),
        });
        Ok(fix)
    }
}
