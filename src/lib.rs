//! Slide-deck editing tools for the Google Slides API.
//!
//! Each operation kind is available as a standalone tool. The
//! [`batch::BatchOrchestrator`] runs a list of them, packing every
//! operation it can into a single `batchUpdate` call.

pub mod batch;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod ops;
pub mod slides;
pub mod tools;
