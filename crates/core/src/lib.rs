//! Aggregation engine for call-record profiles.
//!
//! A finished measurement run is frozen into a [`CallTree`] arena. A
//! [`MethodTable`] rolls every edge targeting the same method into one
//! [`MethodSummary`], and [`aggregate`] collapses a method's incoming and
//! outgoing edges into [`EdgeGroup`]s for graph-style reports.

pub mod aggregate;
pub mod config;
pub mod model;
pub mod parsers;
pub mod summary;
pub mod views;

pub use aggregate::{EdgeGroup, GroupKey};
pub use config::{RankConfig, TreeConfig};
pub use model::{CallEdge, CallTree, CallTreeBuilder, CallTreeError, EdgeId, EdgeMetrics, MethodId};
pub use summary::{MethodSummary, MethodTable, UNBOUNDED_DEPTH};
