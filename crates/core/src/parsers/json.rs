use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::TreeConfig;
use crate::model::{CallTree, CallTreeBuilder, CallTreeError, EdgeId, EdgeMetrics};

#[derive(Debug, Error)]
pub enum JsonParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Tree(#[from] CallTreeError),
    #[error("call tree has no roots")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct JsonCallTree {
    roots: Vec<JsonEdge>,
}

#[derive(Debug, Deserialize)]
struct JsonEdge {
    method: String,
    #[serde(default = "default_called")]
    called: u64,
    self_time: f64,
    #[serde(default)]
    wait_time: f64,
    children_time: Option<f64>,
    total_time: Option<f64>,
    #[serde(default)]
    children: Vec<JsonEdge>,
}

fn default_called() -> u64 {
    1
}

/// A [`JsonEdge`] detached from its children, in pre-order position.
struct FlatEdge {
    method: String,
    parent: Option<usize>,
    called: u64,
    self_time: f64,
    wait_time: f64,
    children_time: Option<f64>,
    total_time: Option<f64>,
}

impl FlatEdge {
    fn metrics(&self, child_totals: f64) -> EdgeMetrics {
        let children_time = self.children_time.unwrap_or(child_totals);
        let mut metrics =
            EdgeMetrics::new(self.called, self.self_time, children_time).with_wait(self.wait_time);
        if let Some(total) = self.total_time {
            metrics.total_time = total;
        }
        metrics
    }
}

/// Flatten the nested export in pre-order without recursing, so call trees
/// of any depth load and drop on a bounded stack.
fn flatten(roots: Vec<JsonEdge>) -> Vec<FlatEdge> {
    let mut flat: Vec<FlatEdge> = Vec::new();
    let mut stack: Vec<(Option<usize>, JsonEdge)> =
        roots.into_iter().rev().map(|r| (None, r)).collect();

    while let Some((parent, mut node)) = stack.pop() {
        let children = std::mem::take(&mut node.children);
        let index = flat.len();
        flat.push(FlatEdge {
            method: node.method,
            parent,
            called: node.called,
            self_time: node.self_time,
            wait_time: node.wait_time,
            children_time: node.children_time,
            total_time: node.total_time,
        });
        stack.extend(children.into_iter().rev().map(|c| (Some(index), c)));
    }
    flat
}

/// `serde_json::from_slice` without the nesting limit, growing the stack
/// on demand instead.
pub(crate) fn from_slice_unbounded<T: DeserializeOwned>(
    data: &[u8],
) -> Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(data);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Parse a nested JSON call tree export.
///
/// ```json
/// { "roots": [ { "method": "main", "called": 1, "self_time": 0.5,
///                "children": [ { "method": "work", "self_time": 2.0 } ] } ] }
/// ```
///
/// `called` defaults to 1, `wait_time` to 0, `children_time` to the sum of
/// the children's totals and `total_time` to `self_time + children_time`.
/// Nesting depth is unbounded.
pub fn parse_call_tree_json(data: &[u8], config: &TreeConfig) -> Result<CallTree, JsonParseError> {
    let parsed: JsonCallTree = from_slice_unbounded(data)?;
    if parsed.roots.is_empty() {
        return Err(JsonParseError::Empty);
    }

    let flat = flatten(parsed.roots);

    // Descendants sit after their ancestors, so one reverse pass rolls
    // child totals up before each parent is resolved.
    let mut child_totals = vec![0.0; flat.len()];
    let mut metrics = vec![EdgeMetrics::ZERO; flat.len()];
    for i in (0..flat.len()).rev() {
        metrics[i] = flat[i].metrics(child_totals[i]);
        if let Some(p) = flat[i].parent {
            child_totals[p] += metrics[i].total_time;
        }
    }

    let mut builder = CallTreeBuilder::new(*config);
    let mut ids: Vec<EdgeId> = Vec::with_capacity(flat.len());
    for (edge, metrics) in flat.iter().zip(metrics) {
        let id = match edge.parent {
            Some(p) => builder.add_child(ids[p], &edge.method, metrics)?,
            None => builder.add_root(&edge.method, metrics)?,
        };
        ids.push(id);
    }

    tracing::debug!(edges = ids.len(), "parsed JSON call tree");
    Ok(builder.finish())
}
