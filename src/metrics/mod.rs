//! Metrics for handshake observability
//!
//! Recorded through the [`metrics`] facade; nothing is exported unless the application
//! installs a recorder.
//!
//! - `mysql_wire_handshakes_total{outcome}`
//! - `mysql_wire_handshake_failures_total{category}`
//! - `mysql_wire_handshake_duration_ms`
//! - `mysql_wire_handshake_syscalls`
//! - `mysql_wire_connections_closed_total`

pub mod counters;
pub mod histograms;
pub mod labels;
