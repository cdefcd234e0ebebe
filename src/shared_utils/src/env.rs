use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Blank values count as missing: an exported-but-empty `OPENAI_API_KEY=` is
/// as good as no key at all.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Reads an optional environment variable.
///
/// Returns `None` when the variable is unset, blank, or not valid unicode.
/// Used for optional credentials where absence selects a fallback path.
pub fn get_optional_env_var(name: &str) -> Option<String> {
    get_env_var(name).ok()
}
