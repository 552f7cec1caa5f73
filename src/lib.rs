//! data-agent - a natural-language query service over a SQLite store.
//!
//! Questions are turned into candidate SQL by a [`proposer`], checked by the
//! [`safety`] gate, and executed through [`db`]. The [`loader`] fills the
//! store from CSV files and [`server`] exposes the pipeline over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod loader;
pub mod logging;
pub mod proposer;
pub mod query;
pub mod safety;
pub mod server;
