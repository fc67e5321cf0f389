//! Virtual TA - retrieval question answering over course material
//!
//! Loads course content and forum posts, embeds them into an in-memory
//! vector index and answers student questions with an extracted span plus
//! supporting links, over a CLI or a small HTTP API.

pub mod answer;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod qa;
pub mod server;

pub use error::{Result, TaError};
