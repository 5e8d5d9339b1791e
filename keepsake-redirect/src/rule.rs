use regex::Regex;

use crate::error::RedirectError;
use crate::template::Template;

/// One redirect: a full-path regex and the target it rewrites to.
#[derive(Debug, Clone)]
pub struct RedirectRule {
    pattern: String,
    regex: Regex,
    target: Template,
}

impl RedirectRule {
    /// Compiles a rule.
    ///
    /// A leading `/` is added to `pattern` when missing (after a leading `^`,
    /// if any). The pattern always has to match the whole path.
    pub fn new(pattern: &str, target: &str) -> Result<Self, RedirectError> {
        let pattern = with_leading_slash(pattern);
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            RedirectError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            }
        })?;

        Ok(Self {
            pattern,
            regex,
            target: Template::parse(target)?,
        })
    }

    /// The pattern, with its leading `/`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The target template.
    pub fn target(&self) -> &Template {
        &self.target
    }

    /// Returns the rewritten target if `path` matches.
    pub fn apply(&self, path: &str) -> Option<String> {
        let captures = self.regex.captures(path)?;
        Some(
            self.target
                .render(|name| captures.name(name).map(|m| m.as_str())),
        )
    }
}

fn with_leading_slash(pattern: &str) -> String {
    let (anchor, rest) = match pattern.strip_prefix('^') {
        Some(rest) => ("^", rest),
        None => ("", pattern),
    };
    if rest.starts_with('/') {
        pattern.to_owned()
    } else {
        format!("{anchor}/{rest}")
    }
}
