use serde::Serialize;

use crate::config::RankConfig;
use crate::model::MethodName;
use crate::summary::{MethodSummary, MethodTable};

/// A single row of the ranked method list.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub name: MethodName,
    pub called: u64,
    pub total_time: f64,
    pub self_time: f64,
    pub wait_time: f64,
    pub children_time: f64,
    pub min_depth: u32,
    /// Share of the tree's total time, 0-100.
    pub total_percent: f64,
    pub self_percent: f64,
}

impl RankedEntry {
    fn from_summary(method: &MethodSummary<'_>, tree_total: f64) -> Self {
        Self {
            name: method.full_name().clone(),
            called: method.called(),
            total_time: method.total_time(),
            self_time: method.self_time(),
            wait_time: method.wait_time(),
            children_time: method.children_time(),
            min_depth: method.min_depth(),
            total_percent: percent(method.total_time(), tree_total),
            self_percent: percent(method.self_time(), tree_total),
        }
    }
}

/// Rows for every method in ranking order, filtered by `config.min_percent`.
pub fn ranked_entries(table: &MethodTable<'_>, config: &RankConfig) -> Vec<RankedEntry> {
    let tree_total = table.tree().total_time();

    let mut methods: Vec<_> = table.iter().collect();
    if config.descending {
        methods.sort_by(|a, b| b.compare(a));
    } else {
        methods.sort_by(|a, b| a.compare(b));
    }

    let entries: Vec<RankedEntry> = methods
        .into_iter()
        .map(|m| RankedEntry::from_summary(m, tree_total))
        .filter(|e| e.total_percent >= config.min_percent)
        .collect();

    tracing::debug!(
        rows = entries.len(),
        methods = table.len(),
        min_percent = config.min_percent,
        "ranked methods"
    );
    entries
}

fn percent(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}
