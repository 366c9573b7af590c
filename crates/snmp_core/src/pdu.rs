//! PDU representation and the scrape-wide OID -> PDU index.

use std::collections::HashMap;

/// SNMP wire type tag, carried alongside the decoded value so the value
/// decoder can special-case `ObjectIdentifier` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    Integer,
    OctetString,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Gauge32,
    TimeTicks,
    Opaque,
    OpaqueFloat,
    OpaqueDouble,
    Counter64,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Null,
}

/// The sum type spanning every runtime shape a decoded SNMP value can take.
#[derive(Debug, Clone, PartialEq)]
pub enum PduValue {
    Signed(i64),
    Unsigned(u64),
    Counter64(u64),
    OpaqueFloat(f32),
    OpaqueDouble(f64),
    String(String),
    Bytes(Vec<u8>),
    Null,
    /// Forward-compatibility bucket for wire shapes this crate doesn't
    /// special-case; rendering falls back to a generic representation and
    /// increments the unexpected-type counter.
    Unsupported,
}

/// One SNMP variable binding: OID (dotted, possibly with a leading `.`),
/// wire type, and decoded value.
#[derive(Debug, Clone)]
pub struct Pdu {
    pub name: String,
    pub pdu_type: PduType,
    pub value: PduValue,
}

impl Pdu {
    /// `name` stripped of a single leading `.`, if present. A blind strip
    /// of the first byte would corrupt OIDs lacking a leading separator,
    /// so this checks before stripping.
    pub fn stripped_name(&self) -> &str {
        self.name.strip_prefix('.').unwrap_or(&self.name)
    }

    pub fn oid_components(&self) -> Vec<u32> {
        self.stripped_name()
            .split('.')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect()
    }
}

/// O(1) cross-reference from OID (leading separator stripped) to PDU,
/// rebuilt once per scrape.
#[derive(Debug, Default)]
pub struct PduIndex {
    by_oid: HashMap<String, Pdu>,
}

impl PduIndex {
    pub fn build(pdus: Vec<Pdu>) -> PduIndex {
        let mut by_oid = HashMap::with_capacity(pdus.len());
        for pdu in pdus {
            by_oid.insert(pdu.stripped_name().to_string(), pdu);
        }
        PduIndex { by_oid }
    }

    pub fn get(&self, oid: &str) -> Option<&Pdu> {
        self.by_oid.get(oid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Pdu)> {
        self.by_oid.iter()
    }

    pub fn len(&self) -> usize {
        self.by_oid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_oid.is_empty()
    }
}
