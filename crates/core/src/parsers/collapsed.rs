use std::collections::HashMap;

use thiserror::Error;

use crate::config::TreeConfig;
use crate::model::{CallTree, CallTreeBuilder, CallTreeError, EdgeId, EdgeMetrics};

#[derive(Debug, Error)]
pub enum CollapsedParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Tree(#[from] CallTreeError),
    #[error("no valid stack lines found")]
    Empty,
}

/// A call path prefix shared by one or more stack lines.
struct PathNode<'a> {
    name: &'a str,
    parent: Option<usize>,
    children: Vec<usize>,
    by_name: HashMap<&'a str, usize>,
    /// Stack lines passing through this node.
    lines: u64,
    /// Samples where this node was the leaf.
    self_count: f64,
}

/// Parse folded stacks (`main;foo;bar 42`) into a call tree.
///
/// Lines sharing a path prefix share call edges. Each edge's `called` is the
/// number of lines through it and the sample count becomes the leaf's self
/// time; totals roll up to the parents.
pub fn parse_collapsed(data: &[u8], config: &TreeConfig) -> Result<CallTree, CollapsedParseError> {
    let text = std::str::from_utf8(data)?;
    let mut nodes: Vec<PathNode<'_>> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    let mut root_index: HashMap<&str, usize> = HashMap::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((stack, count)) = line.rsplit_once(' ') else {
            tracing::warn!(line = line_no + 1, "skipping stack line without a count");
            continue;
        };
        let count: f64 = match count.trim().parse() {
            Ok(c) if c >= 0.0 && f64::is_finite(c) => c,
            _ => {
                tracing::warn!(line = line_no + 1, count, "skipping stack line with bad count");
                continue;
            }
        };

        let mut current: Option<usize> = None;
        for name in stack.split(';').map(str::trim).filter(|n| !n.is_empty()) {
            let index = match current {
                Some(p) => nodes[p].by_name.get(name).copied(),
                None => root_index.get(name).copied(),
            };
            let index = match index {
                Some(i) => i,
                None => {
                    let i = nodes.len();
                    nodes.push(PathNode {
                        name,
                        parent: current,
                        children: Vec::new(),
                        by_name: HashMap::new(),
                        lines: 0,
                        self_count: 0.0,
                    });
                    match current {
                        Some(p) => {
                            nodes[p].children.push(i);
                            nodes[p].by_name.insert(name, i);
                        }
                        None => {
                            roots.push(i);
                            root_index.insert(name, i);
                        }
                    }
                    i
                }
            };
            nodes[index].lines += 1;
            current = Some(index);
        }

        if let Some(leaf) = current {
            nodes[leaf].self_count += count;
        }
    }

    if nodes.is_empty() {
        return Err(CollapsedParseError::Empty);
    }

    // Children always come after their parent, so one reverse pass rolls
    // totals up.
    let mut totals: Vec<f64> = nodes.iter().map(|n| n.self_count).collect();
    for i in (0..nodes.len()).rev() {
        if let Some(p) = nodes[i].parent {
            totals[p] += totals[i];
        }
    }

    let mut builder = CallTreeBuilder::new(*config);
    let mut stack: Vec<(Option<EdgeId>, usize)> = roots.iter().rev().map(|&r| (None, r)).collect();
    while let Some((parent, index)) = stack.pop() {
        let node = &nodes[index];
        let metrics =
            EdgeMetrics::new(node.lines, node.self_count, totals[index] - node.self_count);
        let id = match parent {
            Some(p) => builder.add_child(p, node.name, metrics)?,
            None => builder.add_root(node.name, metrics)?,
        };
        stack.extend(node.children.iter().rev().map(|&c| (Some(id), c)));
    }

    tracing::debug!(paths = nodes.len(), "parsed collapsed stacks");
    Ok(builder.finish())
}
