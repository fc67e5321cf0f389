use crate::answer::EXTRACTOR_KINDS;
use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{Result, TaError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every failure
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_data(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_extractor(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_timeouts(config, &mut errors);
        Self::validate_server(config, &mut errors);
        Self::validate_overrides(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_data(config: &Config, errors: &mut Vec<ValidationError>) {
        // Source files may legitimately be missing; only the paths themselves are checked
        if config.data.course_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "data.course_file",
                "Course file path cannot be empty",
            ));
        }

        if config.data.forum_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "data.forum_file",
                "Forum file path cannot be empty",
            ));
        }

        if config.data.snippet_chars == 0 {
            errors.push(ValidationError::new(
                "data.snippet_chars",
                "Snippet length must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
    }

    fn validate_extractor(config: &Config, errors: &mut Vec<ValidationError>) {
        let kind = &config.extractor.kind;
        if !EXTRACTOR_KINDS.contains(&kind.as_str()) {
            errors.push(ValidationError::new(
                "extractor.kind",
                format!("Kind must be one of {:?}, got '{}'", EXTRACTOR_KINDS, kind),
            ));
        }

        let confidence = config.extractor.min_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            errors.push(ValidationError::new(
                "extractor.min_confidence",
                format!("Confidence must be between 0.0 and 1.0, got {}", confidence),
            ));
        }

        if config.extractor.max_span_chars == 0 {
            errors.push(ValidationError::new(
                "extractor.max_span_chars",
                "Span length must be greater than 0",
            ));
        }

        if kind == "cross-encoder" && config.extractor.model.is_empty() {
            errors.push(ValidationError::new(
                "extractor.model",
                "Cross-encoder model name cannot be empty",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        if retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if retrieval.context_docs == 0 {
            errors.push(ValidationError::new(
                "retrieval.context_docs",
                "context_docs must be greater than 0",
            ));
        }

        if retrieval.max_links == 0 {
            errors.push(ValidationError::new(
                "retrieval.max_links",
                "max_links must be greater than 0",
            ));
        }

        if retrieval.max_concurrent_inference == 0 {
            errors.push(ValidationError::new(
                "retrieval.max_concurrent_inference",
                "max_concurrent_inference must be greater than 0",
            ));
        }
    }

    fn validate_timeouts(config: &Config, errors: &mut Vec<ValidationError>) {
        let timeouts = &config.timeouts;
        for (path, secs) in [
            ("timeouts.build_secs", timeouts.build_secs),
            ("timeouts.embed_secs", timeouts.embed_secs),
            ("timeouts.extract_secs", timeouts.extract_secs),
        ] {
            if secs == 0 {
                errors.push(ValidationError::new(path, "Timeout must be greater than 0"));
            }
        }
    }

    fn validate_server(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.server.host.is_empty() {
            errors.push(ValidationError::new(
                "server.host",
                "Host cannot be empty",
            ));
        }

        if config.server.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "server.request_timeout_secs",
                "Request timeout must be greater than 0",
            ));
        }
    }

    fn validate_overrides(config: &Config, errors: &mut Vec<ValidationError>) {
        for (i, rule) in config.overrides.iter().enumerate() {
            let path = format!("overrides[{}]", i);

            if rule.triggers.is_empty() || rule.triggers.iter().any(|t| t.trim().is_empty()) {
                errors.push(ValidationError::new(
                    format!("{}.triggers", path),
                    "Override needs at least one non-empty trigger",
                ));
            }

            if rule.answer.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("{}.answer", path),
                    "Override answer cannot be empty",
                ));
            }

            if rule.links.len() > config.retrieval.max_links {
                errors.push(ValidationError::new(
                    format!("{}.links", path),
                    format!(
                        "Override has {} links, more than max_links ({})",
                        rule.links.len(),
                        config.retrieval.max_links
                    ),
                ));
            }
        }
    }
}
