//! Prefix tree over integer OID components, matching returned PDUs to
//! metric definitions.

use std::collections::HashMap;

use crate::model::Metric;

#[derive(Default)]
struct TrieNode {
    children: HashMap<u32, TrieNode>,
    metric: Option<usize>,
}

/// Built once per scrape from `module.metrics`. Stores metric indices
/// rather than owned `Metric`s so callers can hold a borrow of the
/// original `Module` metrics slice alongside the trie.
pub struct MetricTrie {
    root: TrieNode,
}

impl MetricTrie {
    pub fn build(metrics: &[Metric]) -> MetricTrie {
        let mut root = TrieNode::default();
        for (idx, metric) in metrics.iter().enumerate() {
            let components: Vec<u32> = metric
                .oid
                .split('.')
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
            let mut node = &mut root;
            for component in components {
                node = node.children.entry(component).or_default();
            }
            // Last write wins when two metrics share an exact OID.
            node.metric = Some(idx);
        }
        MetricTrie { root }
    }

    /// Descend `oid_components` until the first node carrying a terminal
    /// metric is reached. Returns the matched metric index and the
    /// remaining (tail) components, or `None` if descent fails before any
    /// terminal is hit.
    pub fn lookup<'a>(&self, oid_components: &'a [u32]) -> Option<(usize, &'a [u32])> {
        let mut node = &self.root;
        for (i, component) in oid_components.iter().enumerate() {
            node = node.children.get(component)?;
            if let Some(metric_idx) = node.metric {
                return Some((metric_idx, &oid_components[i + 1..]));
            }
        }
        None
    }
}
