//! Collapse call edges into caller/callee groups.

use std::collections::HashMap;

use crate::model::{CallTree, EdgeId, EdgeMetrics, MethodId};
use crate::summary::MethodSummary;

/// Identity a group of call edges is merged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Method(MethodId),
    /// Edges with no parent: root invocations of the method.
    Root,
}

/// Call edges sharing a [`GroupKey`], with their metrics summed.
#[derive(Debug, Clone)]
pub struct EdgeGroup<'t> {
    tree: &'t CallTree,
    key: GroupKey,
    edges: Vec<EdgeId>,
    metrics: EdgeMetrics,
}

impl<'t> EdgeGroup<'t> {
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Display name of the key; `[root]` for root invocations.
    pub fn key_name(&self) -> &'t str {
        match self.key {
            GroupKey::Method(id) => self.tree.method_name(id).as_str(),
            GroupKey::Root => "[root]",
        }
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn metrics(&self) -> &EdgeMetrics {
        &self.metrics
    }

    pub fn called(&self) -> u64 {
        self.metrics.called
    }

    pub fn total_time(&self) -> f64 {
        self.metrics.total_time
    }

    pub fn self_time(&self) -> f64 {
        self.metrics.self_time
    }

    pub fn wait_time(&self) -> f64 {
        self.metrics.wait_time
    }

    pub fn children_time(&self) -> f64 {
        self.metrics.children_time
    }

    /// Method called by the first member edge. Groups are never empty.
    pub fn target(&self) -> MethodId {
        self.tree.edge(self.edges[0]).target
    }

    /// Children of every member edge, in member order.
    pub fn children(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .flat_map(|&e| self.tree.edge(e).children.iter().copied())
            .collect()
    }
}

impl std::fmt::Display for EdgeGroup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.key_name(),
            self.tree.method_name(self.target())
        )
    }
}

/// Group edges by the method of their parent edge; parentless edges form
/// the [`GroupKey::Root`] group. Groups come out in first-seen key order.
pub fn group_by_caller<'t>(tree: &'t CallTree, edges: &[EdgeId]) -> Vec<EdgeGroup<'t>> {
    group_by(tree, edges, |tree, id| match tree.edge(id).parent {
        Some(parent) => GroupKey::Method(tree.edge(parent).target),
        None => GroupKey::Root,
    })
}

/// Group edges by the method they call.
pub fn group_by_callee<'t>(tree: &'t CallTree, edges: &[EdgeId]) -> Vec<EdgeGroup<'t>> {
    group_by(tree, edges, |tree, id| GroupKey::Method(tree.edge(id).target))
}

/// Callers of `method`.
pub fn aggregate_parents<'t>(method: &MethodSummary<'t>) -> Vec<EdgeGroup<'t>> {
    group_by_caller(method.tree(), method.call_edges())
}

/// Edges called by `method`, grouped by their caller.
pub fn aggregate_children<'t>(method: &MethodSummary<'t>) -> Vec<EdgeGroup<'t>> {
    group_by_caller(method.tree(), method.children())
}

/// Edges called by `method`, grouped by the callee.
pub fn aggregate_callees<'t>(method: &MethodSummary<'t>) -> Vec<EdgeGroup<'t>> {
    group_by_callee(method.tree(), method.children())
}

fn group_by<'t, F>(tree: &'t CallTree, edges: &[EdgeId], key_of: F) -> Vec<EdgeGroup<'t>>
where
    F: Fn(&CallTree, EdgeId) -> GroupKey,
{
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<EdgeGroup<'t>> = Vec::new();

    for &id in edges {
        let key = key_of(tree, id);
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(EdgeGroup {
                tree,
                key,
                edges: Vec::new(),
                metrics: EdgeMetrics::ZERO,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.edges.push(id);
        group.metrics += &tree.edge(id).metrics;
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallTreeBuilder;
    use crate::summary::MethodTable;

    /// `A` calls `M` twice from different depths, `M` is also a root.
    fn tree() -> CallTree {
        let mut b = CallTreeBuilder::default();
        let a = b.add_root("A", EdgeMetrics::new(1, 1.0, 11.0)).unwrap();
        b.add_child(a, "M", EdgeMetrics::new(2, 5.0, 0.0)).unwrap();
        let x = b.add_child(a, "X", EdgeMetrics::new(1, 0.0, 6.0)).unwrap();
        let a2 = b.add_child(x, "A", EdgeMetrics::new(1, 0.0, 6.0)).unwrap();
        let m2 = b.add_child(a2, "M", EdgeMetrics::new(1, 4.0, 2.0)).unwrap();
        b.add_child(m2, "Z", EdgeMetrics::new(1, 2.0, 0.0)).unwrap();
        let m3 = b.add_root("M", EdgeMetrics::new(1, 1.0, 2.0)).unwrap();
        b.add_child(m3, "Z", EdgeMetrics::new(1, 1.5, 0.0)).unwrap();
        b.add_child(m3, "Y", EdgeMetrics::new(1, 0.5, 0.0)).unwrap();
        b.finish()
    }

    #[test]
    fn groups_by_caller_identity() {
        let tree = tree();
        let table = MethodTable::build(&tree);
        let m = table.get("M").unwrap();
        let groups = m.aggregate_parents();
        assert_eq!(groups.len(), 2);

        let a = tree.method_id("A").unwrap();
        assert_eq!(groups[0].key(), GroupKey::Method(a));
        assert_eq!(groups[0].edges().len(), 2);
        assert_eq!(groups[0].total_time(), 11.0);
        assert_eq!(groups[0].called(), 3);
        assert_eq!(groups[0].to_string(), "A -> M");

        assert_eq!(groups[1].key(), GroupKey::Root);
        assert_eq!(groups[1].total_time(), 3.0);
        assert_eq!(groups[1].key_name(), "[root]");
    }

    #[test]
    fn parent_groups_partition_the_method() {
        let tree = tree();
        let table = MethodTable::build(&tree);
        let m = table.get("M").unwrap();
        let summed: EdgeMetrics = m.aggregate_parents().iter().map(|g| g.metrics()).sum();
        assert_eq!(&summed, m.metrics());
    }

    #[test]
    fn children_group_under_the_method_itself() {
        let tree = tree();
        let table = MethodTable::build(&tree);
        let m = table.get("M").unwrap();
        let groups = m.aggregate_children();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key(), GroupKey::Method(m.method_id()));
        assert_eq!(groups[0].edges().len(), 3);
        assert_eq!(groups[0].total_time(), 4.0);
    }

    #[test]
    fn callees_group_by_target() {
        let tree = tree();
        let table = MethodTable::build(&tree);
        let m = table.get("M").unwrap();
        let groups = m.aggregate_callees();
        let names: Vec<_> = groups.iter().map(EdgeGroup::key_name).collect();
        assert_eq!(names, vec!["Z", "Y"]);
        assert_eq!(groups[0].total_time(), 3.5);
        assert_eq!(groups[0].called(), 2);
        let total: f64 = groups.iter().map(EdgeGroup::total_time).sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn group_children_flatten_members() {
        let tree = tree();
        let table = MethodTable::build(&tree);
        let m = table.get("M").unwrap();
        let parents = m.aggregate_parents();
        assert_eq!(parents[0].children().len(), 1);
        assert_eq!(parents[1].children().len(), 2);
        assert_eq!(parents[0].target(), m.method_id());
    }

    #[test]
    fn recursive_self_call_is_not_merged_with_root_group() {
        let mut b = CallTreeBuilder::default();
        let r = b.add_root("f", EdgeMetrics::new(1, 1.0, 1.0)).unwrap();
        b.add_child(r, "f", EdgeMetrics::new(1, 1.0, 0.0)).unwrap();
        let tree = b.finish();
        let table = MethodTable::build(&tree);
        let groups = table.get("f").unwrap().aggregate_parents();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key(), GroupKey::Root);
        assert_eq!(groups[1].key(), GroupKey::Method(tree.method_id("f").unwrap()));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let tree = tree();
        assert!(group_by_caller(&tree, &[]).is_empty());
        assert!(group_by_callee(&tree, &[]).is_empty());
    }
}
