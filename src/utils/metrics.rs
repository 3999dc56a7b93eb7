//! Observability and Metrics
//!
//! Counters for query traffic: how many handshakes and information requests were
//! answered, how many datagrams were rejected and why, and how many bytes moved.
//!
//! Uses atomic counters for thread-safe metrics collection. Each handler owns an
//! `Arc<Metrics>` so several query ports in one process keep separate numbers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for query operations
#[derive(Debug)]
pub struct Metrics {
    /// Handshake responses produced
    pub handshakes: AtomicU64,
    /// Information responses produced
    pub information_responses: AtomicU64,
    /// Information requests rejected for a wrong token
    pub token_mismatches: AtomicU64,
    /// Datagrams that failed to decode
    pub decode_errors: AtomicU64,
    /// Datagrams received by the listener
    pub datagrams_received: AtomicU64,
    /// Total bytes received
    pub bytes_received: AtomicU64,
    /// Datagrams sent by the listener
    pub datagrams_sent: AtomicU64,
    /// Total bytes sent
    pub bytes_sent: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            handshakes: AtomicU64::new(0),
            information_responses: AtomicU64::new(0),
            token_mismatches: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            datagrams_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            datagrams_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn handshake(&self) {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn information_response(&self) {
        self.information_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn token_mismatch(&self) {
        self.token_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram received
    pub fn datagram_received(&self, byte_count: u64) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a datagram sent
    pub fn datagram_sent(&self, byte_count: u64) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            handshakes: self.handshakes.load(Ordering::Relaxed),
            information_responses: self.information_responses.load(Ordering::Relaxed),
            token_mismatches: self.token_mismatches.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            handshakes = snapshot.handshakes,
            information_responses = snapshot.information_responses,
            token_mismatches = snapshot.token_mismatches,
            decode_errors = snapshot.decode_errors,
            datagrams_received = snapshot.datagrams_received,
            bytes_received = snapshot.bytes_received,
            datagrams_sent = snapshot.datagrams_sent,
            bytes_sent = snapshot.bytes_sent,
            uptime_seconds = snapshot.uptime_seconds,
            "Query metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub handshakes: u64,
    pub information_responses: u64,
    pub token_mismatches: u64,
    pub decode_errors: u64,
    pub datagrams_received: u64,
    pub bytes_received: u64,
    pub datagrams_sent: u64,
    pub bytes_sent: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Datagrams dropped without a response
    pub fn rejected(&self) -> u64 {
        self.token_mismatches + self.decode_errors
    }
}
