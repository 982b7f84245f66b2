//! Request-scoped state threaded through one generation call.

use crate::error::{AppError, Result};
use crate::models::{Coordinates, SearchAttempt};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

pub struct RequestContext {
    /// Seeds the candidate jitter RNG. Same seed, same request → same waypoints.
    pub seed: u64,
    pub cancel: CancellationToken,
    /// Receives every routed attempt as it completes.
    pub events: Option<UnboundedSender<SearchAttempt>>,
}

impl RequestContext {
    pub fn new(seed: u64) -> Self {
        RequestContext {
            seed,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    /// Explicit seed when given, otherwise one derived from the request.
    pub fn for_request(start: &Coordinates, target_km: f64, seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(|| derive_seed(start, target_km)))
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<SearchAttempt>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    pub fn publish(&self, attempt: SearchAttempt) {
        if let Some(events) = &self.events {
            // A dropped receiver just means nobody is listening anymore.
            let _ = events.send(attempt);
        }
    }
}

/// Deterministic seed from start coordinates and target distance.
pub fn derive_seed(start: &Coordinates, target_km: f64) -> u64 {
    // Shifted to non-negative so mirrored hemispheres hash apart.
    (((start.lat + 90.0) * 1000.0) as u64)
        .wrapping_mul(31)
        .wrapping_add(((start.lng + 180.0) * 1000.0) as u64)
        .wrapping_mul(37)
        .wrapping_add((target_km * 100.0) as u64)
}
