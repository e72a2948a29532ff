//! Per-method rollup of every call edge that targets the same method.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::aggregate::{self, EdgeGroup};
use crate::model::{CallTree, EdgeId, EdgeMetrics, MethodId, MethodName};

/// `min_depth()` of a summary with no call edges.
pub const UNBOUNDED_DEPTH: u32 = u32::MAX;

/// Every call edge in a run that targets one method, plus the memoized sums
/// over them.
///
/// Each derived value is computed on first access and cached in a
/// [`OnceLock`], so summaries can be shared between threads rendering
/// different reports and still compute each value once.
#[derive(Debug)]
pub struct MethodSummary<'t> {
    tree: &'t CallTree,
    method: MethodId,
    call_edges: Vec<EdgeId>,
    metrics: OnceLock<EdgeMetrics>,
    min_depth: OnceLock<u32>,
    is_root: OnceLock<bool>,
    children: OnceLock<Vec<EdgeId>>,
}

impl<'t> MethodSummary<'t> {
    pub fn new(tree: &'t CallTree, method: MethodId, call_edges: Vec<EdgeId>) -> Self {
        Self {
            tree,
            method,
            call_edges,
            metrics: OnceLock::new(),
            min_depth: OnceLock::new(),
            is_root: OnceLock::new(),
            children: OnceLock::new(),
        }
    }

    pub fn tree(&self) -> &'t CallTree {
        self.tree
    }

    pub fn method_id(&self) -> MethodId {
        self.method
    }

    pub fn full_name(&self) -> &'t MethodName {
        self.tree.method_name(self.method)
    }

    pub fn call_edges(&self) -> &[EdgeId] {
        &self.call_edges
    }

    /// Summed metrics over all call edges.
    pub fn metrics(&self) -> &EdgeMetrics {
        self.metrics.get_or_init(|| {
            self.call_edges
                .iter()
                .map(|&e| &self.tree.edge(e).metrics)
                .sum()
        })
    }

    pub fn called(&self) -> u64 {
        self.metrics().called
    }

    pub fn total_time(&self) -> f64 {
        self.metrics().total_time
    }

    pub fn self_time(&self) -> f64 {
        self.metrics().self_time
    }

    pub fn wait_time(&self) -> f64 {
        self.metrics().wait_time
    }

    pub fn children_time(&self) -> f64 {
        self.metrics().children_time
    }

    /// Shallowest depth the method was called at, or [`UNBOUNDED_DEPTH`]
    /// when there are no call edges.
    pub fn min_depth(&self) -> u32 {
        *self.min_depth.get_or_init(|| {
            self.call_edges
                .iter()
                .map(|&e| self.tree.edge(e).depth)
                .min()
                .unwrap_or(UNBOUNDED_DEPTH)
        })
    }

    /// True when the method was only ever invoked as a root.
    pub fn is_root(&self) -> bool {
        *self
            .is_root
            .get_or_init(|| self.call_edges.iter().all(|&e| self.tree.edge(e).is_root()))
    }

    /// Every edge this method directly invoked, across all its call sites.
    pub fn children(&self) -> &[EdgeId] {
        self.children.get_or_init(|| {
            self.call_edges
                .iter()
                .flat_map(|&e| self.tree.edge(e).children.iter().copied())
                .collect()
        })
    }

    /// True when some call edge has an ancestor edge for the same method.
    pub fn is_recursive(&self) -> bool {
        self.call_edges.iter().any(|&e| {
            self.tree
                .ancestors(e)
                .any(|a| self.tree.edge(a).target == self.method)
        })
    }

    /// Callers of this method, grouped by the calling method.
    pub fn aggregate_parents(&self) -> Vec<EdgeGroup<'t>> {
        aggregate::aggregate_parents(self)
    }

    /// Callees of this method, grouped by caller (always this method).
    pub fn aggregate_children(&self) -> Vec<EdgeGroup<'t>> {
        aggregate::aggregate_children(self)
    }

    /// Callees of this method, grouped by the called method.
    pub fn aggregate_callees(&self) -> Vec<EdgeGroup<'t>> {
        aggregate::aggregate_callees(self)
    }

    /// Ranking order: ascending total time, then deeper methods first, then
    /// names in reverse lexicographic order.
    pub fn compare(&self, other: &Self) -> Ordering {
        RANKING
            .iter()
            .map(|key| key.compare(self, other))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy)]
enum RankKey {
    TotalTime(Direction),
    MinDepth(Direction),
    FullName(Direction),
}

/// Applied in order until one key tells the two methods apart.
const RANKING: [RankKey; 3] = [
    RankKey::TotalTime(Direction::Ascending),
    // A shallower method sorts after a deeper one.
    RankKey::MinDepth(Direction::Descending),
    RankKey::FullName(Direction::Descending),
];

impl RankKey {
    fn compare(self, a: &MethodSummary<'_>, b: &MethodSummary<'_>) -> Ordering {
        let (ordering, direction) = match self {
            RankKey::TotalTime(d) => (a.total_time().total_cmp(&b.total_time()), d),
            RankKey::MinDepth(d) => (a.min_depth().cmp(&b.min_depth()), d),
            RankKey::FullName(d) => (a.full_name().cmp(b.full_name()), d),
        };
        match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl PartialEq for MethodSummary<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for MethodSummary<'_> {}

impl PartialOrd for MethodSummary<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MethodSummary<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl std::fmt::Display for MethodSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.full_name().fmt(f)
    }
}

/// One [`MethodSummary`] per method identity met while walking a tree.
#[derive(Debug)]
pub struct MethodTable<'t> {
    tree: &'t CallTree,
    summaries: Vec<MethodSummary<'t>>,
    by_method: HashMap<MethodId, usize>,
}

impl<'t> MethodTable<'t> {
    /// Walk the tree depth-first from its roots, creating a summary the
    /// first time each method is referenced.
    pub fn build(tree: &'t CallTree) -> Self {
        let mut edges_by_slot: Vec<Vec<EdgeId>> = Vec::new();
        let mut order: Vec<MethodId> = Vec::new();
        let mut by_method: HashMap<MethodId, usize> = HashMap::new();

        let mut stack: Vec<EdgeId> = tree.roots().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let edge = tree.edge(id);
            let slot = *by_method.entry(edge.target).or_insert_with(|| {
                order.push(edge.target);
                edges_by_slot.push(Vec::new());
                order.len() - 1
            });
            edges_by_slot[slot].push(id);
            stack.extend(edge.children.iter().rev().copied());
        }

        let summaries: Vec<MethodSummary<'t>> = order
            .into_iter()
            .zip(edges_by_slot)
            .map(|(method, edges)| MethodSummary::new(tree, method, edges))
            .collect();

        tracing::debug!(methods = summaries.len(), edges = tree.len(), "method table built");

        Self {
            tree,
            summaries,
            by_method,
        }
    }

    pub fn tree(&self) -> &'t CallTree {
        self.tree
    }

    pub fn get(&self, name: &str) -> Option<&MethodSummary<'t>> {
        self.tree.method_id(name).and_then(|id| self.get_by_id(id))
    }

    pub fn get_by_id(&self, id: MethodId) -> Option<&MethodSummary<'t>> {
        self.by_method.get(&id).map(|&slot| &self.summaries[slot])
    }

    /// Summaries in first-reference order.
    pub fn iter(&self) -> std::slice::Iter<'_, MethodSummary<'t>> {
        self.summaries.iter()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Methods only ever invoked as roots.
    pub fn roots(&self) -> impl Iterator<Item = &MethodSummary<'t>> {
        self.summaries.iter().filter(|m| m.is_root())
    }

    /// Hottest method first: the ranking order, reversed.
    pub fn ranked(&self) -> Vec<&MethodSummary<'t>> {
        let mut ranked: Vec<_> = self.summaries.iter().collect();
        ranked.sort_by(|a, b| b.compare(a));
        ranked
    }
}

impl<'a, 't> IntoIterator for &'a MethodTable<'t> {
    type Item = &'a MethodSummary<'t>;
    type IntoIter = std::slice::Iter<'a, MethodSummary<'t>>;

    fn into_iter(self) -> Self::IntoIter {
        self.summaries.iter()
    }
}
