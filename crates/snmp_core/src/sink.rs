//! The pull-based telemetry collector interface: a narrow sink the core
//! emits decoded samples into. Production exposition (Prometheus text
//! format, HTTP handler, registry) is the out-of-scope collaborator that
//! would drain this; only the interface and an in-memory recorder live
//! here.

/// One decoded or diagnostic sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Counter {
        name: String,
        help: String,
        labels: Vec<(String, String)>,
        value: f64,
    },
    Gauge {
        name: String,
        help: String,
        labels: Vec<(String, String)>,
        value: f64,
    },
    /// A metric-construction failure surfaced inline, or the fatal
    /// `snmp_error` sample for a failed transport stage.
    Invalid { name: String, error: String },
}

pub trait MetricSink {
    fn emit_counter(&mut self, name: &str, help: &str, labels: &[(String, String)], value: f64);
    fn emit_gauge(&mut self, name: &str, help: &str, labels: &[(String, String)], value: f64);
    fn emit_invalid(&mut self, name: &str, error: &str);
}

/// Records emitted samples in order. Used by tests and the demonstration
/// binary; a production caller would instead bridge this interface to its
/// own metrics registry.
#[derive(Debug, Default)]
pub struct VecSink {
    pub samples: Vec<Sample>,
}

impl MetricSink for VecSink {
    fn emit_counter(&mut self, name: &str, help: &str, labels: &[(String, String)], value: f64) {
        self.samples.push(Sample::Counter {
            name: name.to_string(),
            help: help.to_string(),
            labels: labels.to_vec(),
            value,
        });
    }

    fn emit_gauge(&mut self, name: &str, help: &str, labels: &[(String, String)], value: f64) {
        self.samples.push(Sample::Gauge {
            name: name.to_string(),
            help: help.to_string(),
            labels: labels.to_vec(),
            value,
        });
    }

    fn emit_invalid(&mut self, name: &str, error: &str) {
        self.samples.push(Sample::Invalid {
            name: name.to_string(),
            error: error.to_string(),
        });
    }
}
