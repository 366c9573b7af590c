//! PDU-to-sample emission: combines index decoding, lookups, and value
//! decoding into the samples a scrape emits.

use crate::index::consume_index;
use crate::model::Metric;
use crate::pdu::PduIndex;
use crate::sink::MetricSink;
use crate::value::{get_pdu_value, hint_for_type_str, pdu_value_as_string};

/// Upsert-by-name into a label vector: a later lookup may overwrite a
/// previously-set index label of the same name.
fn set_label(labels: &mut Vec<(String, String)>, name: &str, value: String) {
    if let Some(existing) = labels.iter_mut().find(|(n, _)| n == name) {
        existing.1 = value;
    } else {
        labels.push((name.to_string(), value));
    }
}

/// Decode and emit samples for one matched `(metric, pdu, tail)` triple.
/// Never propagates an error: construction failures become an inline
/// `Sample::Invalid`.
pub fn decode_and_emit(
    metric: &Metric,
    pdu: &crate::pdu::Pdu,
    tail: &[u32],
    pdu_index: &PduIndex,
    sink: &mut impl MetricSink,
) {
    let mut labels: Vec<(String, String)> = Vec::with_capacity(metric.indexes.len() + metric.lookups.len());
    // label name -> raw OID components consumed for it, for lookup OID construction.
    let mut label_oids: std::collections::HashMap<&str, Vec<u32>> = std::collections::HashMap::new();

    let mut remaining = tail;
    for index in &metric.indexes {
        match consume_index(index, remaining) {
            Ok((decoded, rest)) => {
                set_label(&mut labels, &index.labelname, decoded.label_value);
                label_oids.insert(index.labelname.as_str(), decoded.label_oid);
                remaining = rest;
            }
            Err(err) => {
                sink.emit_invalid(&metric.name, &err.to_string());
                return;
            }
        }
    }

    for lookup in &metric.lookups {
        let mut oid = lookup.oid.clone();
        for source_label in &lookup.labels {
            if let Some(components) = label_oids.get(source_label.as_str()) {
                for component in components {
                    oid.push('.');
                    oid.push_str(&component.to_string());
                }
            }
        }

        let value = match pdu_index.get(&oid) {
            Some(found) => pdu_value_as_string(found, hint_for_type_str(&lookup.ty)),
            None => String::new(),
        };
        set_label(&mut labels, &lookup.labelname, value);
    }

    emit_value(metric, pdu, &labels, sink);
}

fn emit_value(
    metric: &Metric,
    pdu: &crate::pdu::Pdu,
    labels: &[(String, String)],
    sink: &mut impl MetricSink,
) {
    use crate::model::MetricKind;

    match &metric.kind {
        MetricKind::Counter => {
            sink.emit_counter(&metric.name, &metric.help, labels, get_pdu_value(&pdu.value));
        }
        MetricKind::Gauge | MetricKind::Float | MetricKind::Double => {
            sink.emit_gauge(&metric.name, &metric.help, labels, get_pdu_value(&pdu.value));
        }
        MetricKind::String(_) => {
            let rendered = pdu_value_as_string(pdu, hint_for_type_str(metric.kind.raw_name()));
            if metric.regexp_extracts.by_suffix.is_empty() {
                let mut labels = labels.to_vec();
                if !labels.iter().any(|(n, _)| n == &metric.name) {
                    labels.push((metric.name.clone(), rendered));
                }
                sink.emit_gauge(&metric.name, &metric.help, &labels, 1.0);
            } else {
                emit_regexp_extracts(metric, &rendered, labels, sink);
            }
        }
    }
}

fn emit_regexp_extracts(
    metric: &Metric,
    rendered: &str,
    labels: &[(String, String)],
    sink: &mut impl MetricSink,
) {
    for (suffix, candidates) in &metric.regexp_extracts.by_suffix {
        // First regex in the list whose pattern occurs anywhere in the
        // rendered value wins; the template is expanded against that
        // match's captures alone, not substituted back into the full
        // string.
        let Some((entry, caps)) = candidates
            .iter()
            .find_map(|entry| entry.regex.captures(rendered).map(|c| (entry, c)))
        else {
            continue;
        };
        let mut expanded = String::new();
        caps.expand(&entry.template, &mut expanded);
        let Ok(value) = expanded.parse::<f64>() else {
            continue;
        };
        let name = format!("{}{}", metric.name, suffix);
        let help = format!("{} (regex extracted)", metric.help);
        sink.emit_gauge(&name, &help, labels, value);
    }
}
