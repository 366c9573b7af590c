//! The SNMP transport driver. One session is opened per scrape, used for
//! every GET/WALK the module declares, then closed unconditionally. Runs a
//! blocking session inside `spawn_blocking`, batches GETs, walks
//! version-aware (GETNEXT vs. GETBULK), and handles SNMPv1 error codes.

use std::net::ToSocketAddrs;
use std::time::Duration;

use async_trait::async_trait;
use snmp::{SyncSession, Value};
use tokio::task;

use crate::error::TransportError;
use crate::model::{Auth, SnmpVersion, Target, WalkParams};
use crate::pdu::{Pdu, PduType, PduValue};

/// Packet-level error code returned alongside a GET response's varbinds,
/// distinct from a transport-level failure. An SNMPv1 `NoSuchName` on a
/// GET batch is a per-batch skip, not an abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    NoError,
    NoSuchName,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct GetResponse {
    pub error: PacketError,
    pub varbinds: Vec<Pdu>,
}

/// Abstraction over "do SNMP I/O", so the scrape orchestrator and its tests
/// never depend on a live device.
#[async_trait]
pub trait SnmpTransport {
    async fn connect(&mut self, target: &Target, params: &WalkParams) -> Result<(), TransportError>;
    async fn get(&mut self, oids: &[String]) -> Result<GetResponse, TransportError>;
    async fn walk_all(&mut self, root: &str) -> Result<Vec<Pdu>, TransportError>;
    async fn bulk_walk_all(&mut self, root: &str, max_repetitions: u8) -> Result<Vec<Pdu>, TransportError>;
    async fn close(&mut self);
}

/// Converts an `snmp` crate wire value into our owned `PduValue`/`PduType`
/// pair. `Opaque` additionally gets sniffed for the RFC 2856 Float/Double
/// wrapper tags (`0x9f 0x78`/`0x9f 0x79`); the `snmp` crate hands back the
/// wrapper bytes as-is and does not decode them itself.
fn to_owned(value: Value) -> (PduType, PduValue) {
    match value {
        Value::Null => (PduType::Null, PduValue::Null),
        Value::Integer(i) => (PduType::Integer, PduValue::Signed(i)),
        Value::OctetString(bytes) => (PduType::OctetString, PduValue::Bytes(bytes.to_vec())),
        Value::ObjectIdentifier(oid_ref) => {
            let mut buf = [0u32; 128];
            match oid_ref.read_name(&mut buf) {
                Ok(parts) => {
                    let dotted = parts
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(".");
                    (PduType::ObjectIdentifier, PduValue::String(dotted))
                }
                Err(_) => (PduType::ObjectIdentifier, PduValue::Unsupported),
            }
        }
        Value::IpAddress(ip) => (
            PduType::IpAddress,
            PduValue::String(format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3])),
        ),
        Value::Counter32(c) => (PduType::Counter32, PduValue::Unsigned(c as u64)),
        Value::Unsigned32(g) => (PduType::Gauge32, PduValue::Unsigned(g as u64)),
        Value::Timeticks(t) => (PduType::TimeTicks, PduValue::Unsigned(t as u64)),
        Value::Opaque(bytes) => decode_opaque(bytes),
        Value::Counter64(c) => (PduType::Counter64, PduValue::Counter64(c)),
        Value::EndOfMibView => (PduType::EndOfMibView, PduValue::Null),
        Value::NoSuchObject => (PduType::NoSuchObject, PduValue::Null),
        Value::NoSuchInstance => (PduType::NoSuchInstance, PduValue::Null),
        other => {
            tracing::warn!(value_type = ?other, "unhandled SNMP value type");
            (PduType::Opaque, PduValue::Unsupported)
        }
    }
}

fn decode_opaque(bytes: &[u8]) -> (PduType, PduValue) {
    if bytes.len() >= 7 && bytes[0] == 0x9f && bytes[1] == 0x78 && bytes[2] == 0x04 {
        let arr: [u8; 4] = bytes[3..7].try_into().unwrap();
        return (PduType::OpaqueFloat, PduValue::OpaqueFloat(f32::from_be_bytes(arr)));
    }
    if bytes.len() >= 11 && bytes[0] == 0x9f && bytes[1] == 0x79 && bytes[2] == 0x08 {
        let arr: [u8; 8] = bytes[3..11].try_into().unwrap();
        return (PduType::OpaqueDouble, PduValue::OpaqueDouble(f64::from_be_bytes(arr)));
    }
    (PduType::Opaque, PduValue::Bytes(bytes.to_vec()))
}

fn parse_oid(oid: &str) -> Vec<u32> {
    oid.trim_start_matches('.')
        .split('.')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn format_oid(oid: &[u32]) -> String {
    oid.iter().map(u32::to_string).collect::<Vec<_>>().join(".")
}

fn community_bytes(auth: &Auth) -> Vec<u8> {
    auth.community
        .as_deref()
        .unwrap_or("public")
        .as_bytes()
        .to_vec()
}

/// A live transport backed by the `snmp` crate's blocking `SyncSession`,
/// driven through `spawn_blocking` so the async scrape loop never blocks
/// the executor on socket I/O.
///
/// SNMPv3 USM is accepted at the configuration layer (`Auth`'s
/// username/auth/priv fields) but the underlying `snmp` crate only speaks
/// v1/v2c community-based sessions. A v3 `connect` returns
/// `TransportError::Connect`.
pub struct RealSnmpTransport {
    target_addr: Option<String>,
    community: Vec<u8>,
    version: SnmpVersion,
    timeout: Duration,
}

impl Default for RealSnmpTransport {
    fn default() -> Self {
        RealSnmpTransport {
            target_addr: None,
            community: Vec::new(),
            version: SnmpVersion::V2c,
            timeout: Duration::from_secs(5),
        }
    }
}

impl RealSnmpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn socket_addr(&self) -> Result<String, TransportError> {
        self.target_addr
            .clone()
            .ok_or_else(|| TransportError::Connect("transport not connected".to_string()))
    }
}

#[async_trait]
impl SnmpTransport for RealSnmpTransport {
    async fn connect(&mut self, target: &Target, params: &WalkParams) -> Result<(), TransportError> {
        if params.version == SnmpVersion::V3 {
            return Err(TransportError::Connect(
                "SNMPv3 USM is not supported by the underlying session library".to_string(),
            ));
        }
        self.target_addr = Some(target.socket_addr_string());
        self.community = community_bytes(&params.auth);
        self.version = params.version;
        // Total session deadline is retries * per-attempt timeout; the
        // `snmp` crate's own retry knob isn't exposed, so a single
        // request-level timeout stands in for the whole budget.
        self.timeout = params.timeout * params.retries.max(1);
        Ok(())
    }

    async fn get(&mut self, oids: &[String]) -> Result<GetResponse, TransportError> {
        let addr = self.socket_addr()?;
        let community = self.community.clone();
        let timeout = self.timeout;
        let oids: Vec<String> = oids.to_vec();

        task::spawn_blocking(move || -> Result<GetResponse, TransportError> {
            let socket_addr = addr.as_str()
                .to_socket_addrs()
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .next()
                .ok_or_else(|| TransportError::Connect("could not resolve target address".to_string()))?;

            let mut sess = SyncSession::new(socket_addr, &community, Some(timeout), 0)
                .map_err(|e| TransportError::Connect(format!("{e:?}")))?;

            let mut varbinds = Vec::with_capacity(oids.len());
            for oid in &oids {
                let components = parse_oid(oid);
                let pdu = match sess.get(&components) {
                    Ok(pdu) => pdu,
                    Err(e) => {
                        return Ok(GetResponse {
                            error: classify_get_error(&e),
                            varbinds: Vec::new(),
                        });
                    }
                };

                for (name, value) in pdu.varbinds {
                    let mut buf = [0u32; 128];
                    let components = name
                        .read_name(&mut buf)
                        .map(|c| c.to_vec())
                        .unwrap_or_default();
                    let (pdu_type, pdu_value) = to_owned(value);
                    varbinds.push(Pdu {
                        name: format_oid(&components),
                        pdu_type,
                        value: pdu_value,
                    });
                }
            }

            Ok(GetResponse {
                error: PacketError::NoError,
                varbinds,
            })
        })
        .await
        .map_err(|e| TransportError::Get(e.to_string()))?
    }

    async fn walk_all(&mut self, root: &str) -> Result<Vec<Pdu>, TransportError> {
        let addr = self.socket_addr()?;
        let community = self.community.clone();
        let timeout = self.timeout;
        let root_oid = parse_oid(root);

        task::spawn_blocking(move || -> Result<Vec<Pdu>, TransportError> {
            let socket_addr = addr.as_str()
                .to_socket_addrs()
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .next()
                .ok_or_else(|| TransportError::Connect("could not resolve target address".to_string()))?;

            let mut sess = SyncSession::new(socket_addr, &community, Some(timeout), 0)
                .map_err(|e| TransportError::Connect(format!("{e:?}")))?;

            let mut results = Vec::new();
            let mut current = root_oid.clone();

            loop {
                let pdu = sess
                    .getnext(&current)
                    .map_err(|e| TransportError::Walk(format!("{e:?}")))?;

                let mut iter = pdu.varbinds.into_iter();
                let Some((name, value)) = iter.next() else {
                    break;
                };

                let mut buf = [0u32; 128];
                let components = name.read_name(&mut buf).map(|c| c.to_vec()).unwrap_or_default();
                if !components.starts_with(&root_oid) {
                    break;
                }
                let (pdu_type, pdu_value) = to_owned(value);
                if matches!(pdu_type, PduType::EndOfMibView) {
                    break;
                }

                results.push(Pdu {
                    name: format_oid(&components),
                    pdu_type,
                    value: pdu_value,
                });
                current = components;
            }

            Ok(results)
        })
        .await
        .map_err(|e| TransportError::Walk(e.to_string()))?
    }

    async fn bulk_walk_all(&mut self, root: &str, max_repetitions: u8) -> Result<Vec<Pdu>, TransportError> {
        let addr = self.socket_addr()?;
        let community = self.community.clone();
        let timeout = self.timeout;
        let root_oid = parse_oid(root);
        let max_repetitions = max_repetitions.max(1) as u32;

        task::spawn_blocking(move || -> Result<Vec<Pdu>, TransportError> {
            let socket_addr = addr.as_str()
                .to_socket_addrs()
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .next()
                .ok_or_else(|| TransportError::Connect("could not resolve target address".to_string()))?;

            let mut sess = SyncSession::new(socket_addr, &community, Some(timeout), 0)
                .map_err(|e| TransportError::Connect(format!("{e:?}")))?;

            let mut results = Vec::new();
            let mut current = root_oid.clone();

            'outer: loop {
                let pdu = sess
                    .getbulk(&[current.as_slice()], 0, max_repetitions)
                    .map_err(|e| TransportError::Walk(format!("{e:?}")))?;

                if pdu.varbinds.is_empty() {
                    break;
                }

                let mut last_in_subtree = None;
                for (name, value) in pdu.varbinds {
                    let mut buf = [0u32; 128];
                    let components = name.read_name(&mut buf).map(|c| c.to_vec()).unwrap_or_default();
                    if !components.starts_with(&root_oid) {
                        break 'outer;
                    }
                    let (pdu_type, pdu_value) = to_owned(value);
                    if matches!(pdu_type, PduType::EndOfMibView) {
                        break 'outer;
                    }

                    last_in_subtree = Some(components.clone());
                    results.push(Pdu {
                        name: format_oid(&components),
                        pdu_type,
                        value: pdu_value,
                    });
                }

                match last_in_subtree {
                    Some(next) => current = next,
                    None => break,
                }
            }

            Ok(results)
        })
        .await
        .map_err(|e| TransportError::Walk(e.to_string()))?
    }

    async fn close(&mut self) {
        self.target_addr = None;
    }
}

/// The `snmp` crate surfaces packet-level errors (as opposed to I/O/decode
/// failures) as an opaque error value; `NoSuchName` is recognized by its
/// `Debug` text since the crate doesn't expose a matchable variant for it.
fn classify_get_error(e: &snmp::SnmpError) -> PacketError {
    let text = format!("{e:?}");
    if text.contains("NoSuchName") {
        PacketError::NoSuchName
    } else {
        PacketError::Other(text)
    }
}

/// In-memory transport for tests and the demonstration binary: GET answers
/// are keyed by OID, WALK/BULKWALK answers are pre-baked PDU lists per root.
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub gets: std::collections::HashMap<String, Pdu>,
    pub walks: std::collections::HashMap<String, Vec<Pdu>>,
    pub get_error: Option<PacketError>,
    pub connected: bool,
    pub closed: bool,
}

#[async_trait]
impl SnmpTransport for FakeTransport {
    async fn connect(&mut self, _target: &Target, _params: &WalkParams) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    async fn get(&mut self, oids: &[String]) -> Result<GetResponse, TransportError> {
        if let Some(err) = &self.get_error {
            return Ok(GetResponse {
                error: err.clone(),
                varbinds: Vec::new(),
            });
        }
        let varbinds = oids
            .iter()
            .filter_map(|oid| self.gets.get(oid).cloned())
            .collect();
        Ok(GetResponse {
            error: PacketError::NoError,
            varbinds,
        })
    }

    async fn walk_all(&mut self, root: &str) -> Result<Vec<Pdu>, TransportError> {
        Ok(self.walks.get(root).cloned().unwrap_or_default())
    }

    async fn bulk_walk_all(&mut self, root: &str, _max_repetitions: u8) -> Result<Vec<Pdu>, TransportError> {
        Ok(self.walks.get(root).cloned().unwrap_or_default())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::parse("device.example.com:161")
    }

    #[tokio::test]
    async fn fake_transport_records_connect_and_close() {
        let mut t = FakeTransport::default();
        t.connect(&target(), &WalkParams::default()).await.unwrap();
        assert!(t.connected);
        t.close().await;
        assert!(t.closed);
    }

    #[tokio::test]
    async fn fake_transport_get_returns_configured_pdus() {
        let mut t = FakeTransport::default();
        t.gets.insert(
            "1.3.6.1.2.1.1.3.0".to_string(),
            Pdu {
                name: "1.3.6.1.2.1.1.3.0".to_string(),
                pdu_type: PduType::TimeTicks,
                value: PduValue::Unsigned(123),
            },
        );
        let resp = t.get(&["1.3.6.1.2.1.1.3.0".to_string()]).await.unwrap();
        assert_eq!(resp.error, PacketError::NoError);
        assert_eq!(resp.varbinds.len(), 1);
    }

    #[tokio::test]
    async fn fake_transport_get_error_short_circuits_varbinds() {
        let mut t = FakeTransport {
            get_error: Some(PacketError::NoSuchName),
            ..Default::default()
        };
        let resp = t.get(&["1.1.1".to_string()]).await.unwrap();
        assert_eq!(resp.error, PacketError::NoSuchName);
        assert!(resp.varbinds.is_empty());
    }

    #[test]
    fn decode_opaque_float_matches_rfc2856_tag() {
        let bytes = [0x9f, 0x78, 0x04, 0x40, 0x49, 0x0f, 0xdb];
        let (ty, value) = decode_opaque(&bytes);
        assert_eq!(ty, PduType::OpaqueFloat);
        match value {
            PduValue::OpaqueFloat(f) => assert!((f - std::f32::consts::PI).abs() < 1e-5),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn decode_opaque_without_tag_falls_back_to_bytes() {
        let bytes = [0x01, 0x02, 0x03];
        let (ty, value) = decode_opaque(&bytes);
        assert_eq!(ty, PduType::Opaque);
        assert_eq!(value, PduValue::Bytes(vec![0x01, 0x02, 0x03]));
    }

    #[test]
    fn parse_oid_strips_leading_dot() {
        assert_eq!(parse_oid(".1.3.6.1"), vec![1, 3, 6, 1]);
        assert_eq!(parse_oid("1.3.6.1"), vec![1, 3, 6, 1]);
    }
}
