//! The question-answering pipeline.
//!
//! Ties schema introspection, statement proposal, the safety gate and
//! execution together, independently of the HTTP layer.

mod service;

pub use service::{AskResponse, AskService};
