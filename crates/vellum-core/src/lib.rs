pub mod hit;
pub mod id;
pub mod layout;
pub mod model;
pub mod props;
pub mod resolve;

pub use hit::{hit_test, hit_test_rect, visual_bounds};
pub use id::{NodeId, VariableId};
pub use layout::{LayoutEngine, LayoutMap, StackLayout, Viewport, layout_mode};
pub use model::*;
pub use props::*;
pub use resolve::{ensure_resolved, kind_defaults, resolve_properties};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
