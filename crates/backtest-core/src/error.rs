//! Error types for the order model.

use thiserror::Error;

use crate::types::OrderId;

/// Errors raised by the order book and order queue.
///
/// Malformed order construction is not represented here: it is a caller bug
/// and fails the construction call itself.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order queue is empty")]
    EmptyQueue,
}
