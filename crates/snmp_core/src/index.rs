//! Index/label decoding: interprets OID suffix components as structured
//! index values and renders them as label strings.

use thiserror::Error;

use crate::model::{Index, IndexType};

#[derive(Debug, Error)]
pub enum IndexDecodeError {
    #[error("invalid UTF-8 in DisplayString index {label:?}: {source}")]
    InvalidUtf8 {
        label: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Right-pad `oid` with zeros to length `n`; returns the head (exactly `n`
/// components) and the remainder.
pub fn split_oid(oid: &[u32], n: usize) -> (Vec<u32>, &[u32]) {
    let take = oid.len().min(n);
    let mut head = oid[..take].to_vec();
    head.resize(n, 0);
    (head, &oid[take..])
}

pub struct DecodedIndex {
    pub label_value: String,
    /// Raw OID components consumed for this index; recorded so lookups can
    /// reference them later.
    pub label_oid: Vec<u32>,
}

/// Consume one declared `Index` from the head of `tail`.
pub fn consume_index<'a>(
    index: &Index,
    tail: &'a [u32],
) -> Result<(DecodedIndex, &'a [u32]), IndexDecodeError> {
    match index.ty {
        IndexType::Integer32 | IndexType::Integer | IndexType::Gauge | IndexType::Counter => {
            let (head, rest) = split_oid(tail, 1);
            Ok((
                DecodedIndex {
                    label_value: head[0].to_string(),
                    label_oid: head,
                },
                rest,
            ))
        }
        IndexType::PhysAddress48 => {
            let (head, rest) = split_oid(tail, 6);
            Ok((
                DecodedIndex {
                    label_value: render_hex_colon(&head),
                    label_oid: head,
                },
                rest,
            ))
        }
        IndexType::OctetString => {
            if index.fixed_size > 0 {
                let (head, rest) = split_oid(tail, index.fixed_size);
                Ok((
                    DecodedIndex {
                        label_value: render_octet_string(&head),
                        label_oid: head,
                    },
                    rest,
                ))
            } else {
                let (len_head, rest) = split_oid(tail, 1);
                let len = len_head[0] as usize;
                let (content, rest) = split_oid(rest, len);
                let mut label_oid = len_head;
                label_oid.extend_from_slice(&content);
                Ok((
                    DecodedIndex {
                        label_value: render_octet_string(&content),
                        label_oid,
                    },
                    rest,
                ))
            }
        }
        IndexType::DisplayString => {
            if index.fixed_size > 0 {
                let (head, rest) = split_oid(tail, index.fixed_size);
                let label_value = render_display_string(&index.labelname, &head)?;
                Ok((
                    DecodedIndex {
                        label_value,
                        label_oid: head,
                    },
                    rest,
                ))
            } else {
                let (len_head, rest) = split_oid(tail, 1);
                let len = len_head[0] as usize;
                let (content, rest) = split_oid(rest, len);
                let label_value = render_display_string(&index.labelname, &content)?;
                let mut label_oid = len_head;
                label_oid.extend_from_slice(&content);
                Ok((
                    DecodedIndex {
                        label_value,
                        label_oid,
                    },
                    rest,
                ))
            }
        }
        IndexType::IpAddr => {
            let (head, rest) = split_oid(tail, 4);
            let label_value = format!("{}.{}.{}.{}", head[0], head[1], head[2], head[3]);
            Ok((
                DecodedIndex {
                    label_value,
                    label_oid: head,
                },
                rest,
            ))
        }
        IndexType::InetAddressType => {
            let (head, rest) = split_oid(tail, 1);
            Ok((
                DecodedIndex {
                    label_value: render_inet_address_type(head[0]),
                    label_oid: head,
                },
                rest,
            ))
        }
    }
}

pub fn render_hex_colon(components: &[u32]) -> String {
    components
        .iter()
        .map(|b| format!("{:02X}", *b as u8))
        .collect::<Vec<_>>()
        .join(":")
}

pub fn render_octet_string(components: &[u32]) -> String {
    if components.is_empty() {
        return String::new();
    }
    let hex: String = components.iter().map(|b| format!("{:02X}", *b as u8)).collect();
    format!("0x{hex}")
}

pub fn render_display_string(labelname: &str, components: &[u32]) -> Result<String, IndexDecodeError> {
    let bytes: Vec<u8> = components.iter().map(|c| *c as u8).collect();
    String::from_utf8(bytes).map_err(|source| IndexDecodeError::InvalidUtf8 {
        label: labelname.to_string(),
        source,
    })
}

pub fn render_inet_address_type(value: u32) -> String {
    match value {
        0 => "unknown".to_string(),
        1 => "ipv4".to_string(),
        2 => "ipv6".to_string(),
        3 => "ipv4z".to_string(),
        4 => "ipv6z".to_string(),
        16 => "dns".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_oid_pads_short_tail_with_zeros() {
        let (head, tail) = split_oid(&[1, 2], 4);
        assert_eq!(head, vec![1, 2, 0, 0]);
        assert!(tail.is_empty());
    }

    #[test]
    fn split_oid_returns_remaining_tail() {
        let (head, tail) = split_oid(&[1, 2, 3, 4, 5], 2);
        assert_eq!(head, vec![1, 2]);
        assert_eq!(tail, &[3, 4, 5]);
    }

    fn index(labelname: &str, ty: IndexType, fixed_size: usize) -> Index {
        Index {
            labelname: labelname.to_string(),
            ty,
            fixed_size,
        }
    }

    #[test]
    fn display_string_fixed_size() {
        // fixed_size 0 means length-prefixed: first component is the
        // length (2), then 2 content bytes "AA".
        let idx = index("foo", IndexType::DisplayString, 0);
        let (decoded, rest) = consume_index(&idx, &[2, 65, 65]).unwrap();
        assert_eq!(decoded.label_value, "AA");
        assert!(rest.is_empty());
    }

    #[test]
    fn display_string_invalid_utf8_is_an_error() {
        // byte 255 is not valid UTF-8.
        let idx = index("foo", IndexType::DisplayString, 0);
        let err = consume_index(&idx, &[2, 65, 255]).unwrap_err();
        assert!(matches!(err, IndexDecodeError::InvalidUtf8 { .. }));
    }

    #[test]
    fn phys_address_48_renders_uppercase_colon_hex() {
        let idx = index("mac", IndexType::PhysAddress48, 0);
        let (decoded, rest) = consume_index(&idx, &[1, 255, 0, 0, 0, 16]).unwrap();
        assert_eq!(decoded.label_value, "01:FF:00:00:00:10");
        assert!(rest.is_empty());
    }

    #[test]
    fn octet_string_length_prefixed_records_label_oid_for_lookup() {
        let idx = index("oct", IndexType::OctetString, 0);
        let (decoded, rest) = consume_index(&idx, &[3, 65, 32, 255]).unwrap();
        assert_eq!(decoded.label_value, "0x4120FF");
        assert_eq!(decoded.label_oid, vec![3, 65, 32, 255]);
        assert!(rest.is_empty());
    }

    #[test]
    fn inet_address_type_enumeration() {
        let idx = index("t", IndexType::InetAddressType, 0);
        let expected = [
            (0u32, "unknown"),
            (1, "ipv4"),
            (2, "ipv6"),
            (3, "ipv4z"),
            (4, "ipv6z"),
            (16, "dns"),
            (42, "42"),
        ];
        let tail = [0u32, 1, 2, 3, 4, 16, 42];
        let mut rest = &tail[..];
        for (_, expected_value) in expected {
            let (decoded, new_rest) = consume_index(&idx, rest).unwrap();
            assert_eq!(decoded.label_value, expected_value);
            rest = new_rest;
        }
        assert!(rest.is_empty());
    }

    #[test]
    fn ip_addr_renders_dotted_decimal() {
        let idx = index("ip", IndexType::IpAddr, 0);
        let (decoded, rest) = consume_index(&idx, &[192, 168, 1, 1]).unwrap();
        assert_eq!(decoded.label_value, "192.168.1.1");
        assert!(rest.is_empty());
    }

    #[test]
    fn octet_string_fixed_size_empty_renders_empty_string() {
        let idx = index("oct", IndexType::OctetString, 0);
        // Length-prefixed with L=0: no content components consumed.
        let (decoded, rest) = consume_index(&idx, &[0, 9, 9]).unwrap();
        assert_eq!(decoded.label_value, "");
        assert_eq!(decoded.label_oid, vec![0]);
        assert_eq!(rest, &[9, 9]);
    }
}
