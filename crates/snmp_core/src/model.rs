//! Configuration data model: the shape an external loader (out of scope)
//! hands to the scrape pipeline. Every type here is plain data; no network
//! or decoding logic lives in this module.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

/// Host and UDP port of the device being scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    const DEFAULT_PORT: u16 = 161;

    /// Parse `host` or `host:port`. No port means 161.
    pub fn parse(target: &str) -> Self {
        match target.rsplit_once(':') {
            Some((host, port_str)) => match port_str.parse::<u16>() {
                Ok(port) => Target {
                    host: host.to_string(),
                    port,
                },
                Err(_) => Target {
                    host: target.to_string(),
                    port: Self::DEFAULT_PORT,
                },
            },
            None => Target {
                host: target.to_string(),
                port: Self::DEFAULT_PORT,
            },
        }
    }

    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2c")]
    V2c,
    #[serde(rename = "3")]
    V3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AuthProtocol {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA")]
    Sha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PrivProtocol {
    #[serde(rename = "DES")]
    Des,
    #[serde(rename = "AES")]
    Aes,
}

/// Authentication and community parameters. Secret fields are never logged
/// directly; only the non-secret fields are traced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Auth {
    pub community: Option<String>,
    pub security_level: Option<SecurityLevel>,
    pub username: Option<String>,
    pub auth_protocol: Option<AuthProtocol>,
    pub auth_password: Option<String>,
    pub priv_protocol: Option<PrivProtocol>,
    pub priv_password: Option<String>,
    pub context_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkParams {
    pub version: SnmpVersion,
    #[serde(default)]
    pub max_repetitions: u8,
    pub retries: u32,
    #[serde(with = "duration_secs")]
    pub timeout: std::time::Duration,
    #[serde(default)]
    pub auth: Auth,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IndexType {
    Integer32,
    Integer,
    Gauge,
    Counter,
    PhysAddress48,
    OctetString,
    DisplayString,
    IpAddr,
    InetAddressType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Index {
    pub labelname: String,
    #[serde(rename = "type")]
    pub ty: IndexType,
    /// 0 means length-prefixed.
    #[serde(default)]
    pub fixed_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lookup {
    pub labels: Vec<String>,
    pub oid: String,
    pub labelname: String,
    /// Free-form type hint passed straight through to `pduValueAsString`;
    /// only the literal strings `"OctetString"`/`"DisplayString"` affect
    /// rendering, so unlike `Index::ty` this is not validated against a
    /// closed enum.
    #[serde(rename = "type")]
    pub ty: String,
}

/// A single compiled (regex, replacement-template) entry, matched
/// unanchored against the rendered value (`RegexpExtracts::compile`).
#[derive(Debug, Clone)]
pub struct RegexpExtractEntry {
    pub regex: Regex,
    pub template: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegexpExtracts {
    /// suffix -> ordered candidates, first match wins.
    pub by_suffix: HashMap<String, Vec<RegexpExtractEntry>>,
}

/// Raw, uncompiled form as it would arrive from an external loader.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRegexpExtract {
    pub regex: String,
    pub template: String,
}

impl RegexpExtracts {
    /// Compiles each pattern as given, not full-line anchored. Candidate
    /// selection is "does this pattern occur anywhere in the rendered
    /// value", and extraction expands the template against that match's
    /// captures only (see `decode::emit_regexp_extracts`), so a pattern can
    /// pull a capture out of a longer surrounding string.
    pub fn compile(
        raw: HashMap<String, Vec<RawRegexpExtract>>,
    ) -> Result<RegexpExtracts, regex::Error> {
        let mut by_suffix = HashMap::with_capacity(raw.len());
        for (suffix, entries) in raw {
            let mut compiled = Vec::with_capacity(entries.len());
            for entry in entries {
                compiled.push(RegexpExtractEntry {
                    regex: Regex::new(&entry.regex)?,
                    template: entry.template,
                });
            }
            by_suffix.insert(suffix, compiled);
        }
        Ok(RegexpExtracts { by_suffix })
    }
}

/// Metric type tag: `counter`, `gauge`, `Float`, `Double`, anything else is
/// "string". The raw name is kept for the string variant since it doubles
/// as the `indexType` hint passed to `pduValueAsString` when the underlying
/// PDU value is a byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Float,
    Double,
    String(String),
}

impl MetricKind {
    pub fn is_string(&self) -> bool {
        matches!(self, MetricKind::String(_))
    }

    /// The raw type name as declared in configuration, used to derive the
    /// `pduValueAsString` rendering hint (`"OctetString"`/`"DisplayString"`/
    /// anything else).
    pub fn raw_name(&self) -> &str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Float => "Float",
            MetricKind::Double => "Double",
            MetricKind::String(name) => name,
        }
    }
}

impl<'de> Deserialize<'de> for MetricKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "counter" => MetricKind::Counter,
            "gauge" => MetricKind::Gauge,
            "Float" => MetricKind::Float,
            "Double" => MetricKind::Double,
            _ => MetricKind::String(raw),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub oid: String,
    pub kind: MetricKind,
    pub help: String,
    pub indexes: Vec<Index>,
    pub lookups: Vec<Lookup>,
    pub regexp_extracts: RegexpExtracts,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub get: Vec<String>,
    pub walk: Vec<String>,
    pub metrics: Vec<Metric>,
    pub walk_params: WalkParams,
}

impl Default for WalkParams {
    fn default() -> Self {
        WalkParams {
            version: SnmpVersion::V2c,
            max_repetitions: 25,
            retries: 3,
            timeout: std::time::Duration::from_secs(5),
            auth: Auth::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parses_host_and_port() {
        let t = Target::parse("switch1:1161");
        assert_eq!(t.host, "switch1");
        assert_eq!(t.port, 1161);
    }

    #[test]
    fn target_defaults_port_161() {
        let t = Target::parse("switch1");
        assert_eq!(t.host, "switch1");
        assert_eq!(t.port, 161);
    }

    #[test]
    fn target_ignores_non_numeric_suffix_and_defaults() {
        // Open question resolution: literal split on the last ':', not a
        // general socket-address parser. A non-numeric trailing segment
        // falls back to treating the whole string as the host.
        let t = Target::parse("switch1:not-a-port");
        assert_eq!(t.host, "switch1:not-a-port");
        assert_eq!(t.port, 161);
    }

    #[test]
    fn regexp_extracts_compile_matches_anywhere_in_value() {
        let mut raw = HashMap::new();
        raw.insert(
            "Suffix".to_string(),
            vec![RawRegexpExtract {
                regex: "foo".to_string(),
                template: "1".to_string(),
            }],
        );
        let compiled = RegexpExtracts::compile(raw).unwrap();
        let entry = &compiled.by_suffix["Suffix"][0];
        assert!(entry.regex.is_match("foo"));
        assert!(entry.regex.is_match("xfoox"));
        assert!(!entry.regex.is_match("bar"));
    }
}
