pub mod call_tree;
pub mod method_name;
pub mod metrics;

pub use call_tree::{Ancestors, CallEdge, CallTree, CallTreeBuilder, CallTreeError, EdgeId, MethodId};
pub use method_name::MethodName;
pub use metrics::EdgeMetrics;
