pub mod node;
pub mod tree;

pub use node::{ElementNode, NodePath, NodeValue, SequenceHop};
pub use tree::{ElementTree, Traverse};
