//! Delivered results and the handler boundary.

pub mod tree;
pub mod handler;

// Re-export main types
pub use tree::ResultTree;
pub use handler::ResultHandler;
