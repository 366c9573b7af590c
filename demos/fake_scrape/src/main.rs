//! Runs one scrape against a canned `FakeTransport` standing in for a
//! switch's `sysUpTime` and an interface table, and prints every emitted
//! sample. No network access, no live device: just the decode pipeline.

use snmp_core::{
    FakeTransport, Index, IndexType, Metric, MetricKind, Module, Pdu, PduType, PduValue,
    RegexpExtracts, Sample, Target, VecSink, WalkParams, run_scrape,
};

fn interface_table_pdus() -> Vec<Pdu> {
    vec![
        Pdu {
            name: "1.3.6.1.2.1.2.2.1.10.1".to_string(),
            pdu_type: PduType::Counter32,
            value: PduValue::Unsigned(1_000_000),
        },
        Pdu {
            name: "1.3.6.1.2.1.2.2.1.10.2".to_string(),
            pdu_type: PduType::Counter32,
            value: PduValue::Unsigned(2_500_000),
        },
    ]
}

#[tokio::main]
async fn main() {
    let target = Target::parse("switch1.example.net:161");

    let module = Module {
        get: vec!["1.3.6.1.2.1.1.3.0".to_string()],
        walk: vec!["1.3.6.1.2.1.2.2.1.10".to_string()],
        metrics: vec![
            Metric {
                name: "sysUpTime".to_string(),
                oid: "1.3.6.1.2.1.1.3".to_string(),
                kind: MetricKind::Gauge,
                help: "Time since the device booted".to_string(),
                indexes: vec![],
                lookups: vec![],
                regexp_extracts: RegexpExtracts::default(),
            },
            Metric {
                name: "ifInOctets".to_string(),
                oid: "1.3.6.1.2.1.2.2.1.10".to_string(),
                kind: MetricKind::Counter,
                help: "Octets received on the interface".to_string(),
                indexes: vec![Index {
                    labelname: "ifIndex".to_string(),
                    ty: IndexType::Integer32,
                    fixed_size: 0,
                }],
                lookups: vec![],
                regexp_extracts: RegexpExtracts::default(),
            },
        ],
        walk_params: WalkParams::default(),
    };

    let mut transport = FakeTransport::default();
    transport.gets.insert(
        "1.3.6.1.2.1.1.3.0".to_string(),
        Pdu {
            name: "1.3.6.1.2.1.1.3.0".to_string(),
            pdu_type: PduType::TimeTicks,
            value: PduValue::Unsigned(8_640_000),
        },
    );
    transport
        .walks
        .insert("1.3.6.1.2.1.2.2.1.10".to_string(), interface_table_pdus());

    let mut sink = VecSink::default();
    run_scrape(&mut transport, &target, &module, &mut sink).await;

    for sample in &sink.samples {
        match sample {
            Sample::Counter {
                name, labels, value, ..
            } => println!("{name} {labels:?} {value} (counter)"),
            Sample::Gauge {
                name, labels, value, ..
            } => println!("{name} {labels:?} {value} (gauge)"),
            Sample::Invalid { name, error } => println!("{name} INVALID: {error}"),
        }
    }
}
