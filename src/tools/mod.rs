//! Tool system.
//!
//! Every operation kind is exposed as its own tool, next to the
//! `batch_operations` tool that runs many of them at once.

pub mod builtin;

mod registry;
mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolError, ToolOutput, ToolSchema};
