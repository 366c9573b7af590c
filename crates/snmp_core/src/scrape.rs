//! Scrape orchestration: drives the transport, builds the per-scrape
//! indices, and emits every sample a module's metrics produce.

use std::time::Instant;

use crate::decode::decode_and_emit;
use crate::error::ScrapeError;
use crate::model::{Module, SnmpVersion, Target};
use crate::pdu::{Pdu, PduIndex, PduType};
use crate::sink::MetricSink;
use crate::transport::{PacketError, SnmpTransport};

/// GETs are batched to `max_repetitions` OIDs per request, except on SNMPv1
/// or when `max_repetitions` is unset (0), where every GET is its own
/// single-OID batch.
fn max_oids_per_batch(module: &Module) -> usize {
    if module.walk_params.version == SnmpVersion::V1 || module.walk_params.max_repetitions == 0 {
        1
    } else {
        module.walk_params.max_repetitions as usize
    }
}

async fn collect_pdus(
    transport: &mut impl SnmpTransport,
    target: &Target,
    module: &Module,
) -> Result<Vec<Pdu>, ScrapeError> {
    transport.connect(target, &module.walk_params).await?;
    let result = collect_pdus_inner(transport, module).await;
    transport.close().await;
    result
}

async fn collect_pdus_inner(
    transport: &mut impl SnmpTransport,
    module: &Module,
) -> Result<Vec<Pdu>, ScrapeError> {
    let mut pdus = Vec::new();
    let batch_size = max_oids_per_batch(module).max(1);

    for batch in module.get.chunks(batch_size) {
        let response = transport.get(batch).await?;
        match response.error {
            PacketError::NoError => {}
            PacketError::NoSuchName if module.walk_params.version == SnmpVersion::V1 => {
                tracing::warn!(?batch, "SNMPv1 NoSuchName on GET batch, skipping");
                continue;
            }
            PacketError::NoSuchName => {
                return Err(crate::error::TransportError::PacketError(
                    "NoSuchName".to_string(),
                )
                .into());
            }
            PacketError::Other(msg) => {
                return Err(crate::error::TransportError::PacketError(msg).into());
            }
        }

        for pdu in response.varbinds {
            if matches!(pdu.pdu_type, PduType::NoSuchObject | PduType::NoSuchInstance) {
                continue;
            }
            pdus.push(pdu);
        }
    }

    for root in &module.walk {
        let walked = if module.walk_params.version == SnmpVersion::V1 {
            transport.walk_all(root).await?
        } else {
            transport
                .bulk_walk_all(root, module.walk_params.max_repetitions)
                .await?
        };
        pdus.extend(walked);
    }

    Ok(pdus)
}

/// Runs one full scrape against `target` using `module`'s GET/WALK list and
/// metric definitions, emitting every sample into `sink`:
///
/// 1. record the start time
/// 2. drive the transport; a transport failure emits a single `snmp_error`
///    invalid sample and stops the scrape
/// 3. emit `snmp_scrape_walk_duration_seconds`
/// 4. emit `snmp_scrape_pdus_returned`
/// 5. index the returned PDUs by OID
/// 6. build the metric trie
/// 7. for each returned PDU, match it against the trie and decode+emit
/// 8. emit `snmp_scrape_duration_seconds`
pub async fn run_scrape(
    transport: &mut impl SnmpTransport,
    target: &Target,
    module: &Module,
    sink: &mut impl MetricSink,
) {
    let scrape_start = Instant::now();
    let walk_start = Instant::now();

    let pdus = match collect_pdus(transport, target, module).await {
        Ok(pdus) => pdus,
        Err(err) => {
            sink.emit_invalid("snmp_error", &err.to_string());
            return;
        }
    };

    let walk_duration = walk_start.elapsed();
    sink.emit_gauge(
        "snmp_scrape_walk_duration_seconds",
        "Time SNMP walk/gets took",
        &[],
        walk_duration.as_secs_f64(),
    );
    sink.emit_gauge(
        "snmp_scrape_pdus_returned",
        "PDUs returned from walk",
        &[],
        pdus.len() as f64,
    );

    let pdu_index = PduIndex::build(pdus);
    let trie = crate::trie::MetricTrie::build(&module.metrics);

    for (oid, pdu) in pdu_index.iter() {
        let components = pdu.oid_components();
        let Some((metric_idx, tail)) = trie.lookup(&components) else {
            tracing::trace!(%oid, "no metric matched this OID");
            continue;
        };
        let metric = &module.metrics[metric_idx];
        decode_and_emit(metric, pdu, tail, &pdu_index, sink);
    }

    sink.emit_gauge(
        "snmp_scrape_duration_seconds",
        "Total time the scrape took",
        &[],
        scrape_start.elapsed().as_secs_f64(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metric, MetricKind, RegexpExtracts, WalkParams};
    use crate::pdu::PduValue;
    use crate::sink::{Sample, VecSink};
    use crate::transport::FakeTransport;

    fn target() -> Target {
        Target::parse("device:161")
    }

    fn simple_module() -> Module {
        Module {
            get: vec!["1.3.6.1.2.1.1.3.0".to_string()],
            walk: vec![],
            metrics: vec![Metric {
                name: "sysUpTime".to_string(),
                oid: "1.3.6.1.2.1.1.3".to_string(),
                kind: MetricKind::Gauge,
                help: "uptime".to_string(),
                indexes: vec![],
                lookups: vec![],
                regexp_extracts: RegexpExtracts::default(),
            }],
            walk_params: WalkParams::default(),
        }
    }

    #[tokio::test]
    async fn scrape_emits_metric_and_meta_gauges() {
        let module = simple_module();
        let mut transport = FakeTransport::default();
        transport.gets.insert(
            "1.3.6.1.2.1.1.3.0".to_string(),
            Pdu {
                name: "1.3.6.1.2.1.1.3.0".to_string(),
                pdu_type: PduType::TimeTicks,
                value: PduValue::Unsigned(4200),
            },
        );
        let mut sink = VecSink::default();

        run_scrape(&mut transport, &target(), &module, &mut sink).await;

        assert!(transport.connected);
        assert!(transport.closed);

        let has_metric = sink.samples.iter().any(|s| matches!(
            s,
            Sample::Gauge { name, value, .. } if name == "sysUpTime" && *value == 4200.0
        ));
        assert!(has_metric, "expected sysUpTime sample, got {:?}", sink.samples);

        for meta in [
            "snmp_scrape_walk_duration_seconds",
            "snmp_scrape_pdus_returned",
            "snmp_scrape_duration_seconds",
        ] {
            assert!(
                sink.samples
                    .iter()
                    .any(|s| matches!(s, Sample::Gauge { name, .. } if name == meta)),
                "expected meta gauge {meta}"
            );
        }
    }

    #[tokio::test]
    async fn transport_failure_emits_single_invalid_sample_and_stops() {
        let module = simple_module();
        let mut transport = FakeTransport {
            get_error: Some(crate::transport::PacketError::Other("boom".to_string())),
            ..Default::default()
        };
        let mut sink = VecSink::default();

        run_scrape(&mut transport, &target(), &module, &mut sink).await;

        assert_eq!(sink.samples.len(), 1);
        assert!(matches!(&sink.samples[0], Sample::Invalid { name, .. } if name == "snmp_error"));
    }

    #[tokio::test]
    async fn v1_nosuchname_skips_batch_instead_of_aborting() {
        let mut module = simple_module();
        module.walk_params.version = SnmpVersion::V1;
        let mut transport = FakeTransport {
            get_error: Some(crate::transport::PacketError::NoSuchName),
            ..Default::default()
        };
        let mut sink = VecSink::default();

        run_scrape(&mut transport, &target(), &module, &mut sink).await;

        // No fatal snmp_error sample; scrape completes and still emits the
        // meta gauges even though the GET produced nothing.
        assert!(!sink
            .samples
            .iter()
            .any(|s| matches!(s, Sample::Invalid { name, .. } if name == "snmp_error")));
        assert!(sink
            .samples
            .iter()
            .any(|s| matches!(s, Sample::Gauge { name, .. } if name == "snmp_scrape_pdus_returned")));
    }
}
