//! Network layer - HTTP exchange execution
//!
//! [`HttpExecutor`] owns the request pipeline (validation, timing, sizing,
//! formatting); [`Transport`] is the seam to the wire.

pub mod client;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{
    ExchangeError, ExchangeFailure, ExchangeResponse, ExchangeResult, ExchangeSpec, HttpExecutor,
};
pub use transport::{OutgoingRequest, RawResponse, ReqwestTransport, Transport};
