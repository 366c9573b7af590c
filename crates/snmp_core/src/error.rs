//! Error types for the transport driver and scrape orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to resolve or connect to target: {0}")]
    Connect(String),
    #[error("GET request failed: {0}")]
    Get(String),
    #[error("WALK request failed: {0}")]
    Walk(String),
    #[error("SNMP packet-level error: {0}")]
    PacketError(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("configuration error: {0}")]
    Config(String),
}
