pub mod tree;

pub use tree::{
    Alignment, DateFormat, DocumentNode, Mark, MarkSet, NodeKind,
};
