//! Retrieval-QA orchestration
//!
//! Every question is checked against the override table first. Otherwise the
//! engine makes sure the knowledge base exists, embeds the question, retrieves
//! the nearest documents, extracts an answer from the leading ones and returns
//! it with a short list of citations.

mod engine;
mod knowledge_base;
mod overrides;

pub use engine::QaEngine;
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseStats, ScoredDocument};
pub use overrides::{OverrideRule, OverrideTable};

use serde::{Deserialize, Serialize};

/// Citation attached to an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Answer returned to callers. `answer` may be empty when nothing in the
/// retrieved context supports one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub links: Vec<Link>,
}
