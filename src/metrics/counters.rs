//! Counter helpers

use super::labels;

/// A handshake reached `Ready`
pub fn handshake_succeeded() {
    metrics::counter!(labels::HANDSHAKES_TOTAL, "outcome" => labels::OUTCOME_SUCCESS)
        .increment(1);
}

/// A handshake was aborted; `category` is [`Error::category`](crate::Error::category)
pub fn handshake_failed(category: &'static str) {
    metrics::counter!(labels::HANDSHAKES_TOTAL, "outcome" => labels::OUTCOME_FAILURE)
        .increment(1);
    metrics::counter!(labels::HANDSHAKE_FAILURES_TOTAL, "category" => category).increment(1);
}

/// A ready connection was closed
pub fn connection_closed() {
    metrics::counter!(labels::CONNECTIONS_CLOSED_TOTAL).increment(1);
}
