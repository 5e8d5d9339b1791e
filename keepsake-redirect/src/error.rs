use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading redirect rules.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// The rule file exists but could not be read.
    #[error("failed to read redirect rules from {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rule file is not a YAML mapping of strings to strings.
    #[error("failed to parse redirect rules: {0}")]
    Parse(String),

    /// A pattern is not a valid regular expression.
    #[error("invalid redirect pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as written in the rule file.
        pattern: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A target has unbalanced braces.
    #[error("invalid redirect target '{template}': {reason}")]
    InvalidTemplate {
        /// Target as written in the rule file.
        template: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}
