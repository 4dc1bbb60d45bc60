//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }
    if config.server.port == 0 {
        errors.push("server.port must be > 0".to_string());
    }

    if config.gemini.api_base.trim().is_empty() {
        errors.push("gemini.api_base must not be empty".to_string());
    }
    if config.gemini.models.iter().all(|m| m.trim().is_empty()) {
        errors.push("gemini.models must name at least one model".to_string());
    }
    if config.gemini.timeout_secs == 0 {
        errors.push("gemini.timeout_secs must be > 0".to_string());
    }

    if config.knowledge.path.trim().is_empty() {
        errors.push("knowledge.path must not be empty".to_string());
    }
    if config.knowledge.max_context_entries == 0 {
        errors.push("knowledge.max_context_entries must be > 0".to_string());
    }

    if config.sessions.max_history == 0 {
        errors.push("sessions.max_history must be > 0".to_string());
    }
    if config.sessions.render_window == 0 {
        errors.push("sessions.render_window must be > 0".to_string());
    }
    if config.sessions.render_window > config.sessions.max_history {
        errors.push(format!(
            "sessions.render_window ({}) must not exceed sessions.max_history ({})",
            config.sessions.render_window, config.sessions.max_history
        ));
    }

    let format = config.logging.format.to_lowercase();
    if format != "text" && format != "json" {
        errors.push(format!(
            "logging.format must be \"text\" or \"json\", got \"{}\"",
            config.logging.format
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
