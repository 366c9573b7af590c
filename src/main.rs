//! Demonstration binary: parses a target and a YAML module file, runs one
//! scrape through `snmp_core`, and prints the resulting samples. Module
//! loading itself (this file's `RawModule`/`RawMetric` and their
//! conversion into `snmp_core::Module`) lives here rather than in the
//! core crate. Configuration loading is an out-of-scope collaborator;
//! the core only defines the target shape for it.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use snmp_core::{
    Index, Lookup, Metric, MetricKind, Module, RealSnmpTransport, Sample, Target, VecSink,
    WalkParams, run_scrape,
};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Scrape one SNMP target against a module definition")]
struct Cli {
    /// Target host, or host:port (defaults to port 161)
    target: String,
    /// Path to a YAML module file
    module: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawMetric {
    name: String,
    oid: String,
    #[serde(rename = "type")]
    kind: MetricKind,
    #[serde(default)]
    help: String,
    #[serde(default)]
    indexes: Vec<Index>,
    #[serde(default)]
    lookups: Vec<Lookup>,
    #[serde(default)]
    regexp_extracts: HashMap<String, Vec<snmp_core::model::RawRegexpExtract>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawModule {
    #[serde(default)]
    get: Vec<String>,
    #[serde(default)]
    walk: Vec<String>,
    #[serde(default)]
    metrics: Vec<RawMetric>,
    #[serde(default)]
    walk_params: WalkParams,
}

fn into_module(raw: RawModule) -> anyhow::Result<Module> {
    let metrics = raw
        .metrics
        .into_iter()
        .map(|m| {
            let regexp_extracts = snmp_core::model::RegexpExtracts::compile(m.regexp_extracts)?;
            Ok(Metric {
                name: m.name,
                oid: m.oid,
                kind: m.kind,
                help: m.help,
                indexes: m.indexes,
                lookups: m.lookups,
                regexp_extracts,
            })
        })
        .collect::<Result<Vec<_>, regex::Error>>()?;

    Ok(Module {
        get: raw.get,
        walk: raw.walk,
        metrics,
        walk_params: raw.walk_params,
    })
}

fn print_sample(sample: &Sample) {
    match sample {
        Sample::Counter {
            name,
            labels,
            value,
            ..
        } => println!("{name}{{{}}} {value} (counter)", format_labels(labels)),
        Sample::Gauge {
            name,
            labels,
            value,
            ..
        } => println!("{name}{{{}}} {value} (gauge)", format_labels(labels)),
        Sample::Invalid { name, error } => println!("{name} INVALID: {error}"),
    }
}

fn format_labels(labels: &[(String, String)]) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v:?}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    let args = Cli::parse();
    let target = Target::parse(&args.target);

    let raw_yaml = std::fs::read_to_string(&args.module)?;
    let raw_module: RawModule = serde_yaml::from_str(&raw_yaml)?;
    let module = into_module(raw_module)?;

    tracing::info!(target = %target.socket_addr_string(), module = %args.module.display(), "starting scrape");

    let mut transport = RealSnmpTransport::new();
    let mut sink = VecSink::default();
    run_scrape(&mut transport, &target, &module, &mut sink).await;

    for sample in &sink.samples {
        print_sample(sample);
    }

    tracing::info!(samples = sink.samples.len(), "scrape finished");
    Ok(())
}
