//! Core pipeline for scraping an SNMP agent into typed metric samples:
//! configuration data model, wire-value decoding, index/label decoding,
//! the metric matching trie, the transport driver, and the scrape
//! orchestrator. Loading configuration from disk, wire-format exposition,
//! and scheduling repeated scrapes are all out of scope. This crate turns
//! one `(Target, Module)` pair into a stream of `Sample`s for a caller's
//! own `MetricSink`.

pub mod counter;
pub mod decode;
pub mod error;
pub mod index;
pub mod model;
pub mod pdu;
pub mod scrape;
pub mod sink;
pub mod transport;
pub mod trie;
pub mod value;

pub use error::{ScrapeError, TransportError};
pub use model::{
    Auth, Index, IndexType, Lookup, Metric, MetricKind, Module, RegexpExtracts, Target,
    WalkParams,
};
pub use pdu::{Pdu, PduIndex, PduType, PduValue};
pub use scrape::run_scrape;
pub use sink::{MetricSink, Sample, VecSink};
pub use transport::{FakeTransport, RealSnmpTransport, SnmpTransport};
