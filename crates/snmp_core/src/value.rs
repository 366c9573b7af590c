//! Value decoding: PDU wire values to numeric samples (`get_pdu_value`) and
//! to canonical strings (`pdu_value_as_string`) for string-valued metrics,
//! lookups, and diagnostics.

use crate::counter::increment_unexpected_pdu_type;
use crate::pdu::{Pdu, PduType, PduValue};

/// Which string rendering a byte sequence should get, threaded through
/// from the metric/lookup's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringRenderHint {
    None,
    OctetString,
    DisplayString,
}

/// Derives a rendering hint from a free-form type name (a `Metric::kind`
/// raw name or a `Lookup::ty`). Only the two literal type names matter.
pub fn hint_for_type_str(raw: &str) -> StringRenderHint {
    match raw {
        "OctetString" => StringRenderHint::OctetString,
        "DisplayString" => StringRenderHint::DisplayString,
        _ => StringRenderHint::None,
    }
}

/// `getPduValue`: PDU value to `f64` for numeric (counter/gauge/float/
/// double) metrics.
pub fn get_pdu_value(value: &PduValue) -> f64 {
    match value {
        PduValue::Counter64(v) => *v as f64,
        PduValue::OpaqueFloat(v) => *v as f64,
        PduValue::OpaqueDouble(v) => *v,
        PduValue::Signed(v) => *v as f64,
        PduValue::Unsigned(v) => (*v as i64) as f64,
        PduValue::String(_) | PduValue::Bytes(_) | PduValue::Null | PduValue::Unsupported => 0.0,
    }
}

/// `pduValueAsString`: the canonical string renderer.
pub fn pdu_value_as_string(pdu: &Pdu, hint: StringRenderHint) -> String {
    match &pdu.value {
        PduValue::Signed(v) => v.to_string(),
        PduValue::Unsigned(v) => v.to_string(),
        PduValue::Counter64(v) => v.to_string(),
        PduValue::OpaqueFloat(v) => v.to_string(),
        PduValue::OpaqueDouble(v) => v.to_string(),
        PduValue::String(s) => {
            if pdu.pdu_type == PduType::ObjectIdentifier {
                s.strip_prefix('.').unwrap_or(s).to_string()
            } else {
                s.clone()
            }
        }
        PduValue::Bytes(bytes) => render_bytes(bytes, hint),
        PduValue::Null => String::new(),
        PduValue::Unsupported => {
            increment_unexpected_pdu_type();
            format!("<unsupported:{:?}>", pdu.pdu_type)
        }
    }
}

fn render_bytes(bytes: &[u8], hint: StringRenderHint) -> String {
    match hint {
        StringRenderHint::DisplayString => String::from_utf8_lossy(bytes).into_owned(),
        StringRenderHint::None | StringRenderHint::OctetString => {
            if bytes.is_empty() {
                String::new()
            } else {
                let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
                format!("0x{hex}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdu_with(value: PduValue, pdu_type: PduType) -> Pdu {
        Pdu {
            name: "1.1.1.1.1".to_string(),
            pdu_type,
            value,
        }
    }

    #[test]
    fn counter64_at_2_pow_63_is_strictly_positive() {
        // Counter64 must be read as unsigned, not cast through i64.
        let value = PduValue::Counter64(1u64 << 63);
        let f = get_pdu_value(&value);
        assert!(f > 0.0);
    }

    #[test]
    fn signed_negative_is_preserved() {
        let f = get_pdu_value(&PduValue::Signed(-2));
        assert_eq!(f, -2.0);
    }

    #[test]
    fn object_identifier_string_strips_one_leading_dot() {
        let pdu = pdu_with(
            PduValue::String(".1.3.6.1.2.1".to_string()),
            PduType::ObjectIdentifier,
        );
        assert_eq!(pdu_value_as_string(&pdu, StringRenderHint::None), "1.3.6.1.2.1");
    }

    #[test]
    fn object_identifier_without_leading_dot_is_untouched() {
        let pdu = pdu_with(
            PduValue::String("1.3.6.1.2.1".to_string()),
            PduType::ObjectIdentifier,
        );
        assert_eq!(pdu_value_as_string(&pdu, StringRenderHint::None), "1.3.6.1.2.1");
    }

    #[test]
    fn plain_string_is_verbatim() {
        let pdu = pdu_with(PduValue::String(".weird".to_string()), PduType::OctetString);
        assert_eq!(pdu_value_as_string(&pdu, StringRenderHint::None), ".weird");
    }

    #[test]
    fn null_renders_empty() {
        let pdu = pdu_with(PduValue::Null, PduType::Null);
        assert_eq!(pdu_value_as_string(&pdu, StringRenderHint::None), "");
    }

    #[test]
    fn unsupported_increments_counter() {
        let before = crate::counter::unexpected_pdu_type_total();
        let pdu = pdu_with(PduValue::Unsupported, PduType::Integer);
        let _ = pdu_value_as_string(&pdu, StringRenderHint::None);
        assert_eq!(crate::counter::unexpected_pdu_type_total(), before + 1);
    }

    #[test]
    fn display_string_bytes_decode_ascii() {
        let pdu = pdu_with(PduValue::Bytes(vec![65, 66]), PduType::OctetString);
        assert_eq!(
            pdu_value_as_string(&pdu, StringRenderHint::DisplayString),
            "AB"
        );
    }

    #[test]
    fn octet_string_bytes_render_as_hex() {
        let pdu = pdu_with(PduValue::Bytes(vec![0x41, 0x20, 0xFF]), PduType::OctetString);
        assert_eq!(
            pdu_value_as_string(&pdu, StringRenderHint::OctetString),
            "0x4120FF"
        );
    }

    #[test]
    fn empty_bytes_render_empty_string() {
        let pdu = pdu_with(PduValue::Bytes(vec![]), PduType::OctetString);
        assert_eq!(pdu_value_as_string(&pdu, StringRenderHint::None), "");
    }
}
