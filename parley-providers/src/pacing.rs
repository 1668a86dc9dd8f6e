//! Delays between simulated stream emits

use crate::constants::DEFAULT_STREAM_DELAY_MS;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Waits between two emits of a simulated stream
#[async_trait]
pub trait Pacer: Send + Sync + Debug {
    /// Wait before the next emit
    async fn pause(&self);
}

/// Sleeps a fixed duration on the tokio clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPacer(pub Duration);

impl FixedPacer {
    /// Pacer sleeping `millis` between emits
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }
}

impl Default for FixedPacer {
    fn default() -> Self {
        Self::from_millis(DEFAULT_STREAM_DELAY_MS)
    }
}

#[async_trait]
impl Pacer for FixedPacer {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacer;

#[async_trait]
impl Pacer for NoPacer {
    async fn pause(&self) {}
}
