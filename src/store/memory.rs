//! In-process store for local demos and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::store::{PeopleStore, StoreError};

/// A store that keeps only a row count.
///
/// Reachability can be toggled at runtime to simulate a database outage, and an
/// artificial latency makes queries take a known amount of time.
#[derive(Debug)]
pub struct MemoryStore {
    rows: AtomicU64,
    reachable: AtomicBool,
    latency: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rows: AtomicU64::new(0),
            reachable: AtomicBool::new(true),
            latency: Duration::ZERO,
        }
    }

    /// Start with `rows` people already present.
    pub fn with_rows(self, rows: u64) -> Self {
        self.rows.store(rows, Ordering::Relaxed);
        self
    }

    /// Delay every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulate the database going away (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    async fn round_trip(&self) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unreachable("in-memory store marked unreachable".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeopleStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "In-memory"
    }

    fn client_version(&self) -> &'static str {
        concat!("people-app ", env!("CARGO_PKG_VERSION"))
    }

    fn host(&self) -> Option<String> {
        None
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.round_trip().await
    }

    async fn count_people(&self) -> Result<u64, StoreError> {
        self.round_trip().await?;
        Ok(self.rows.load(Ordering::Relaxed))
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.round_trip().await
    }
}
