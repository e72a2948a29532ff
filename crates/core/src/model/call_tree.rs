use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::{EdgeMetrics, MethodName};
use crate::config::TreeConfig;

/// Handle of a method identity inside a [`CallTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MethodId(pub(crate) u32);

/// Handle of a call edge inside a [`CallTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId(pub(crate) u32);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One occurrence of a method being called from one call site at one depth.
#[derive(Debug, Clone, Serialize)]
pub struct CallEdge {
    pub target: MethodId,
    /// `None` for a root invocation.
    pub parent: Option<EdgeId>,
    /// Distance from the root (root = 0).
    pub depth: u32,
    pub metrics: EdgeMetrics,
    /// Edges invoked directly from this one, in call order.
    pub children: Vec<EdgeId>,
}

impl CallEdge {
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

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CallTreeError {
    #[error("edge for `{method}` has invalid {field}: {value}")]
    InvalidMetric {
        method: String,
        field: &'static str,
        value: f64,
    },
    #[error(
        "edge for `{method}` breaks total = self + children: {total} != {self_time} + {children_time}"
    )]
    TimeIdentity {
        method: String,
        total: f64,
        self_time: f64,
        children_time: f64,
    },
    #[error("parent edge {0:?} does not exist")]
    UnknownParent(EdgeId),
    #[error("call tree exceeds {max} edges or methods", max = u32::MAX)]
    TooLarge,
}

/// The frozen call tree produced at the end of a measurement run.
///
/// An arena: edges reference their parent and children by [`EdgeId`] and
/// their target by [`MethodId`]. Only [`CallTreeBuilder`] creates one, and
/// nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CallTree {
    edges: Vec<CallEdge>,
    roots: Vec<EdgeId>,
    methods: Vec<MethodName>,
    #[serde(skip)]
    by_name: HashMap<MethodName, MethodId>,
}

impl CallTree {
    pub fn edge(&self, id: EdgeId) -> &CallEdge {
        &self.edges[id.index()]
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&CallEdge> {
        self.edges.get(id.index())
    }

    /// All edges with their handles, in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &CallEdge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId(i as u32), e))
    }

    pub fn roots(&self) -> &[EdgeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn method_name(&self, id: MethodId) -> &MethodName {
        &self.methods[id.index()]
    }

    pub fn method_id(&self, name: &str) -> Option<MethodId> {
        self.by_name.get(name).copied()
    }

    /// Target name of an edge.
    pub fn target_name(&self, id: EdgeId) -> &MethodName {
        self.method_name(self.edge(id).target)
    }

    /// Measured time of the whole run: the sum over root invocations.
    pub fn total_time(&self) -> f64 {
        self.roots.iter().map(|&r| self.edge(r).total_time()).sum()
    }

    /// Walk from the edge's parent up to its root.
    pub fn ancestors(&self, id: EdgeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.edge(id).parent,
        }
    }

    pub fn is_descendant_of(&self, id: EdgeId, ancestor: EdgeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Path of method names from the root down to this edge: `main->A->B`.
    pub fn call_sequence(&self, id: EdgeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .map(|a| self.target_name(a).as_str())
            .collect();
        names.reverse();
        names.push(self.target_name(id).as_str());
        names.join("->")
    }
}

pub struct Ancestors<'t> {
    tree: &'t CallTree,
    next: Option<EdgeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let current = self.next?;
        self.next = self.tree.edge(current).parent;
        Some(current)
    }
}

/// Records call edges as the measurement engine reports them and freezes
/// them into a [`CallTree`].
#[derive(Debug, Default)]
pub struct CallTreeBuilder {
    config: TreeConfig,
    edges: Vec<CallEdge>,
    roots: Vec<EdgeId>,
    methods: Vec<MethodName>,
    by_name: HashMap<MethodName, MethodId>,
}

impl CallTreeBuilder {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn add_root(
        &mut self,
        method: &str,
        metrics: EdgeMetrics,
    ) -> Result<EdgeId, CallTreeError> {
        let id = self.push(method, None, 0, metrics)?;
        self.roots.push(id);
        Ok(id)
    }

    pub fn add_child(
        &mut self,
        parent: EdgeId,
        method: &str,
        metrics: EdgeMetrics,
    ) -> Result<EdgeId, CallTreeError> {
        let depth = self
            .edges
            .get(parent.index())
            .map(|p| p.depth + 1)
            .ok_or(CallTreeError::UnknownParent(parent))?;
        let id = self.push(method, Some(parent), depth, metrics)?;
        self.edges[parent.index()].children.push(id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn finish(self) -> CallTree {
        tracing::debug!(
            edges = self.edges.len(),
            roots = self.roots.len(),
            methods = self.methods.len(),
            "call tree frozen"
        );
        CallTree {
            edges: self.edges,
            roots: self.roots,
            methods: self.methods,
            by_name: self.by_name,
        }
    }

    fn push(
        &mut self,
        method: &str,
        parent: Option<EdgeId>,
        depth: u32,
        metrics: EdgeMetrics,
    ) -> Result<EdgeId, CallTreeError> {
        let metrics = metrics.normalized();
        self.validate(method, &metrics)?;
        let target = self.intern(method)?;
        let id = EdgeId(u32::try_from(self.edges.len()).map_err(|_| CallTreeError::TooLarge)?);
        tracing::trace!(?id, method, depth, "edge recorded");
        self.edges.push(CallEdge {
            target,
            parent,
            depth,
            metrics,
            children: Vec::new(),
        });
        Ok(id)
    }

    fn validate(&self, method: &str, metrics: &EdgeMetrics) -> Result<(), CallTreeError> {
        if let Some((field, value)) = metrics.invalid_field() {
            return Err(CallTreeError::InvalidMetric {
                method: method.to_string(),
                field,
                value,
            });
        }
        let allowed = self.config.time_tolerance * metrics.total_time.abs().max(1.0);
        if self.config.validate_time_identity && metrics.time_identity_error() > allowed {
            return Err(CallTreeError::TimeIdentity {
                method: method.to_string(),
                total: metrics.total_time,
                self_time: metrics.self_time,
                children_time: metrics.children_time,
            });
        }
        Ok(())
    }

    fn intern(&mut self, method: &str) -> Result<MethodId, CallTreeError> {
        if let Some(&id) = self.by_name.get(method) {
            return Ok(id);
        }
        let id = MethodId(u32::try_from(self.methods.len()).map_err(|_| CallTreeError::TooLarge)?);
        let name = MethodName::from(method);
        self.methods.push(name.clone());
        self.by_name.insert(name, id);
        Ok(id)
    }
}
