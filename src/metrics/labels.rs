//! Metric names and label values

/// Handshake attempts by outcome
pub const HANDSHAKES_TOTAL: &str = "mysql_wire_handshakes_total";

/// Failed handshakes by error category
pub const HANDSHAKE_FAILURES_TOTAL: &str = "mysql_wire_handshake_failures_total";

/// Wall time from dial to `Ready`
pub const HANDSHAKE_DURATION_MS: &str = "mysql_wire_handshake_duration_ms";

/// Socket syscalls spent on a successful handshake
pub const HANDSHAKE_SYSCALLS: &str = "mysql_wire_handshake_syscalls";

/// Connections closed by the client
pub const CONNECTIONS_CLOSED_TOTAL: &str = "mysql_wire_connections_closed_total";

/// `outcome` label for a completed handshake
pub const OUTCOME_SUCCESS: &str = "success";

/// `outcome` label for an aborted handshake
pub const OUTCOME_FAILURE: &str = "failure";
