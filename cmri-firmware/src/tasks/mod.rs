//! Embassy async tasks

pub mod node;

pub use node::node_task;
