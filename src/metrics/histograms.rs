//! Histogram helpers

use super::labels;

/// Handshake duration in milliseconds
pub fn handshake_duration(duration_ms: u64) {
    metrics::histogram!(labels::HANDSHAKE_DURATION_MS).record(duration_ms as f64);
}

/// Syscalls used by a successful handshake
pub fn handshake_syscalls(syscalls: u64) {
    metrics::histogram!(labels::HANDSHAKE_SYSCALLS).record(syscalls as f64);
}
