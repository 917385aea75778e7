//! Built-in slide tools.

mod batch;
mod slides;

pub use batch::BatchOperationsTool;
pub use slides::SlidesOperationTool;
