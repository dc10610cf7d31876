//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.sessions.default_session.trim().is_empty() {
        errors.push("sessions.default_session must not be empty".to_string());
    }

    if config.model.name.trim().is_empty() {
        errors.push("model.name must not be empty".to_string());
    } else if !config.model.available.is_empty()
        && !config.model.available.contains(&config.model.name)
    {
        errors.push(format!(
            "model.name {:?} must be one of model.available ({})",
            config.model.name,
            config.model.available.join(", ")
        ));
    }
    if !(0.0..=2.0).contains(&config.model.temperature) {
        errors.push("model.temperature must be in [0.0, 2.0]".to_string());
    }

    if config.summarizer.chunk_size == 0 {
        errors.push("summarizer.chunk_size must be > 0".to_string());
    }
    if config.summarizer.chunk_overlap > config.summarizer.chunk_size {
        errors.push("summarizer.chunk_overlap must not exceed summarizer.chunk_size".to_string());
    }
    if config.summarizer.token_max == 0 {
        errors.push("summarizer.token_max must be > 0".to_string());
    }

    let format = config.logging.format.to_lowercase();
    if format != "text" && format != "json" {
        errors.push("logging.format must be \"text\" or \"json\"".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
