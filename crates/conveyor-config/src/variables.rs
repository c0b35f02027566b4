//! Placeholder resolution for secret values.
//!
//! A secret value written as `${NAME}` (the whole value, surrounding
//! whitespace aside) is replaced by the environment variable `NAME`.
//! Anything else is left alone, including `${NAME}` embedded in a longer
//! string. A placeholder whose variable is not set stays as written, so a
//! missing variable shows up verbatim instead of becoming an empty string.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// A value that is exactly one ${...} placeholder
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{(.+)\}$").unwrap());

/// Variables available for placeholder resolution.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    /// Environment variables
    pub env: HashMap<String, String>,
}

impl VariableContext {
    /// Create a new empty variable context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding the current process environment.
    pub fn from_process_env() -> Self {
        let mut ctx = Self::new();
        ctx.populate_env();
        ctx
    }

    /// Populate environment variables from the current process environment.
    pub fn populate_env(&mut self) {
        for (key, value) in std::env::vars() {
            self.env.insert(key, value);
        }
    }

    /// Add a variable, replacing any previous value.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, var_name: &str) -> Option<&str> {
        self.env.get(var_name).map(String::as_str)
    }

    /// Variable name of `value` if the whole value is a placeholder.
    pub fn placeholder_name(value: &str) -> Option<&str> {
        PLACEHOLDER_REGEX
            .captures(value.trim())
            .and_then(|caps| caps.get(1))
            .map(|name| name.as_str())
    }

    /// Resolve `value` if it is a placeholder for a known variable,
    /// otherwise return it unchanged.
    pub fn interpolate(&self, value: &str) -> String {
        Self::placeholder_name(value)
            .and_then(|name| self.resolve(name))
            .unwrap_or(value)
            .to_string()
    }

    /// Variable name of `value` if it is a placeholder this context
    /// cannot resolve.
    pub fn unresolved<'a>(&self, value: &'a str) -> Option<&'a str> {
        Self::placeholder_name(value).filter(|name| self.resolve(name).is_none())
    }
}
