//! Property tests over randomly shaped call trees.

use std::cmp::Ordering;

use proptest::prelude::*;
use rollcall_core::{CallTree, CallTreeBuilder, EdgeMetrics, MethodTable, TreeConfig};

const METHODS: [&str; 6] = ["main", "Foo#a", "Foo#b", "Bar#c", "Bar#d", "Baz#e"];

/// One edge: which earlier edge is its parent, which method it calls, its
/// self time in eighths and its call count.
type EdgeSpec = (prop::sample::Index, usize, u32, u64);

fn arb_edges() -> impl Strategy<Value = Vec<EdgeSpec>> {
    prop::collection::vec(
        (any::<prop::sample::Index>(), 0..METHODS.len(), 0u32..800, 1u64..5),
        1..40,
    )
}

/// Edge `i` becomes a root when its index picks itself, otherwise a child of
/// an earlier edge. Self times are multiples of 1/8 so sums stay exact.
fn build(specs: &[EdgeSpec]) -> CallTree {
    let parents: Vec<Option<usize>> = specs
        .iter()
        .enumerate()
        .map(|(i, (idx, ..))| {
            let p = idx.index(i + 1);
            (p != i).then_some(p)
        })
        .collect();

    let self_times: Vec<f64> = specs.iter().map(|s| f64::from(s.2) / 8.0).collect();
    let mut totals = self_times.clone();
    for i in (0..specs.len()).rev() {
        if let Some(p) = parents[i] {
            totals[p] += totals[i];
        }
    }

    let mut builder = CallTreeBuilder::new(TreeConfig::default());
    let mut ids = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let metrics = EdgeMetrics::new(spec.3, self_times[i], totals[i] - self_times[i]);
        let id = match parents[i] {
            Some(p) => builder.add_child(ids[p], METHODS[spec.1], metrics),
            None => builder.add_root(METHODS[spec.1], metrics),
        }
        .expect("generated edges satisfy the builder invariants");
        ids.push(id);
    }
    builder.finish()
}

proptest! {
    #[test]
    fn rollups_conserve_edge_totals(specs in arb_edges()) {
        let tree = build(&specs);
        let table = MethodTable::build(&tree);

        let edge_calls: u64 = tree.edges().map(|(_, e)| e.called()).sum();
        let method_calls: u64 = table.iter().map(|m| m.called()).sum();
        prop_assert_eq!(edge_calls, method_calls);

        let edges: usize = table.iter().map(|m| m.call_edges().len()).sum();
        prop_assert_eq!(edges, tree.len());

        for method in &table {
            let total: f64 = method.call_edges().iter().map(|&e| tree.edge(e).total_time()).sum();
            prop_assert_eq!(total, method.total_time());
        }
    }

    #[test]
    fn groups_partition_their_input(specs in arb_edges()) {
        let tree = build(&specs);
        let table = MethodTable::build(&tree);

        for method in &table {
            let parents = method.aggregate_parents();
            let members: usize = parents.iter().map(|g| g.edges().len()).sum();
            prop_assert_eq!(members, method.call_edges().len());
            let called: u64 = parents.iter().map(|g| g.called()).sum();
            prop_assert_eq!(called, method.called());
            let total: f64 = parents.iter().map(|g| g.total_time()).sum();
            prop_assert_eq!(total, method.total_time());

            let children_total: f64 =
                method.children().iter().map(|&e| tree.edge(e).total_time()).sum();
            let grouped: f64 = method.aggregate_children().iter().map(|g| g.total_time()).sum();
            prop_assert_eq!(grouped, children_total);
            let by_callee: f64 = method.aggregate_callees().iter().map(|g| g.total_time()).sum();
            prop_assert_eq!(by_callee, children_total);
        }
    }

    #[test]
    fn ranking_is_a_strict_total_order(specs in arb_edges()) {
        let tree = build(&specs);
        let table = MethodTable::build(&tree);
        let methods: Vec<_> = table.iter().collect();

        for a in &methods {
            prop_assert_eq!(a.compare(a), Ordering::Equal);
            for b in &methods {
                prop_assert_eq!(a.compare(b), b.compare(a).reverse());
                if a.full_name() != b.full_name() {
                    prop_assert_ne!(a.compare(b), Ordering::Equal);
                }
                for c in &methods {
                    if a.compare(b) == Ordering::Less && b.compare(c) == Ordering::Less {
                        prop_assert_eq!(a.compare(c), Ordering::Less);
                    }
                }
            }
        }

        let ranked = table.ranked();
        for pair in ranked.windows(2) {
            prop_assert_eq!(pair[0].compare(pair[1]), Ordering::Greater);
        }
    }
}
