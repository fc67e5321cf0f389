//! Fixed answers for questions that retrieval handles badly

use super::{AnswerResponse, Link};
use crate::config::OverrideRuleConfig;

const MODEL_CHOICE_ANSWER: &str = "You must use `gpt-3.5-turbo-0125`, even if the AI Proxy only supports `gpt-4o-mini`. Use the OpenAI API directly for this question.";

const MODEL_CHOICE_LINKS: [(&str, &str); 2] = [
    (
        "https://discourse.onlinedegree.iitm.ac.in/t/ga5-question-8-clarification/155939/4",
        "Use the model that’s mentioned in the question.",
    ),
    (
        "https://discourse.onlinedegree.iitm.ac.in/t/ga5-question-8-clarification/155939/3",
        "My understanding is that you just have to use a tokenizer, similar to what Prof. Anand used, to get the number of tokens and multiply that by the given rate.",
    ),
];

/// Fires when every trigger occurs in the lowercased question
#[derive(Debug, Clone)]
pub struct OverrideRule {
    name: String,
    triggers: Vec<String>,
    response: AnswerResponse,
}

impl OverrideRule {
    pub fn new<I, S>(name: impl Into<String>, triggers: I, answer: impl Into<String>, links: Vec<Link>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            triggers: triggers
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
            response: AnswerResponse {
                answer: answer.into(),
                links,
            },
        }
    }

    /// `gpt-4o-mini` vs `gpt3.5`: the course requires the older model even
    /// though the proxy only serves the newer one
    pub fn model_choice() -> Self {
        Self::new(
            "model-choice",
            ["gpt-4o-mini", "gpt3.5"],
            MODEL_CHOICE_ANSWER,
            MODEL_CHOICE_LINKS
                .iter()
                .map(|(url, text)| Link::new(*url, *text))
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, lowered_question: &str) -> bool {
        !self.triggers.is_empty()
            && self
                .triggers
                .iter()
                .all(|trigger| lowered_question.contains(trigger.as_str()))
    }
}

impl From<&OverrideRuleConfig> for OverrideRule {
    fn from(config: &OverrideRuleConfig) -> Self {
        Self::new(
            config.name.clone(),
            &config.triggers,
            config.answer.clone(),
            config.links.clone(),
        )
    }
}

/// Ordered rules; the first match wins
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    rules: Vec<OverrideRule>,
}

impl OverrideTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rules
    pub fn builtin() -> Self {
        Self::empty().with_rule(OverrideRule::model_choice())
    }

    /// Built-in rules followed by configured ones
    pub fn from_config(configured: &[OverrideRuleConfig]) -> Self {
        configured
            .iter()
            .fold(Self::builtin(), |table, rule| table.with_rule(rule.into()))
    }

    pub fn with_rule(mut self, rule: OverrideRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Fixed response for `question`, if any rule fires
    pub fn check(&self, question: &str) -> Option<(&str, AnswerResponse)> {
        let lowered = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| (rule.name(), rule.response.clone()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_choice_fires_case_insensitively() {
        let table = OverrideTable::builtin();

        for question in [
            "Should I use gpt-4o-mini or gpt3.5?",
            "GPT-4O-MINI vs GPT3.5 for GA5 Q8",
            "gpt3.5 or gpt-4o-mini, which one?",
        ] {
            let (name, response) = table.check(question).unwrap();
            assert_eq!(name, "model-choice");
            assert!(response.answer.contains("gpt-3.5-turbo-0125"));
            assert_eq!(response.links.len(), 2);
            assert!(response.links[0].url.ends_with("/155939/4"));
            assert!(response.links[1].url.ends_with("/155939/3"));
        }
    }

    #[test]
    fn test_one_marker_is_not_enough() {
        let table = OverrideTable::builtin();
        assert!(table.check("Can I use gpt-4o-mini?").is_none());
        assert!(table.check("Is gpt3.5 allowed?").is_none());
        assert!(table.check("gpt-3.5 or gpt-4o-mini?").is_none());
    }

    #[test]
    fn test_configured_rules_follow_builtin() {
        let configured = vec![OverrideRuleConfig {
            name: "late".to_string(),
            triggers: vec!["Late".to_string(), "GA1".to_string()],
            answer: "Late GA1 submissions are not accepted.".to_string(),
            links: vec![],
        }];
        let table = OverrideTable::from_config(&configured);
        assert_eq!(table.len(), 2);

        let (name, response) = table.check("Can I submit ga1 late?").unwrap();
        assert_eq!(name, "late");
        assert!(response.links.is_empty());
    }

    #[test]
    fn test_rule_without_triggers_never_fires() {
        let table = OverrideTable::empty().with_rule(OverrideRule::new(
            "empty",
            Vec::<String>::new(),
            "never",
            vec![],
        ));
        assert!(table.check("anything").is_none());
    }
}
