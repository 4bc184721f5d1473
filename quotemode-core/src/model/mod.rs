mod node;
mod rule;

pub use node::{DocumentTree, NodeId, NodeKind};
pub use rule::{Rule, RuleSet};
