use std::io::ErrorKind;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::RedirectError;
use crate::rule::RedirectRule;

/// Ordered redirect rules. The first rule matching a path wins.
///
/// ```
/// use keepsake_redirect::RedirectRuleSet;
///
/// let rules = RedirectRuleSet::from_yaml_str(r#"
/// old/(?P<id>\d+): /new/{id}
/// old/.*: /new
/// "#).unwrap();
///
/// assert_eq!(rules.find("/old/42", Some("x=1")).as_deref(), Some("/new/42?x=1"));
/// assert_eq!(rules.find("/old/abc", None).as_deref(), Some("/new"));
/// assert_eq!(rules.find("/other", None), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RedirectRuleSet {
    rules: Vec<RedirectRule>,
}

impl RedirectRuleSet {
    /// A set with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a YAML mapping of patterns to targets, keeping document order.
    /// An empty document gives an empty set.
    pub fn from_yaml_str(source: &str) -> Result<Self, RedirectError> {
        if source.trim().is_empty() {
            return Ok(Self::empty());
        }
        let mapping: Option<IndexMap<String, String>> = serde_saphyr::from_str(source)
            .map_err(|error| RedirectError::Parse(error.to_string()))?;

        mapping
            .unwrap_or_default()
            .iter()
            .map(|(pattern, target)| RedirectRule::new(pattern, target))
            .collect()
    }

    /// Loads rules from a YAML file. A missing file gives an empty set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RedirectError> {
        let path = path.as_ref();
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no redirect rules file");
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(RedirectError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        let rules = Self::from_yaml_str(&source)?;
        debug!(path = %path.display(), rules = rules.len(), "loaded redirect rules");
        Ok(rules)
    }

    /// Like [`load`](Self::load), but logs a failure and returns an empty set.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|error| {
            warn!(path = %path.display(), %error, "ignoring redirect rules that failed to load");
            Self::empty()
        })
    }

    /// Target of the first rule matching `path`, with `query` carried over.
    pub fn find(&self, path: &str, query: Option<&str>) -> Option<String> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(path))
            .map(|target| append_query(target, query))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in match order.
    pub fn iter(&self) -> impl Iterator<Item = &RedirectRule> {
        self.rules.iter()
    }
}

impl FromIterator<RedirectRule> for RedirectRuleSet {
    fn from_iter<I: IntoIterator<Item = RedirectRule>>(rules: I) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }
}

/// Appends `query` to `target`, decoding and re-encoding its pairs.
pub(crate) fn append_query(mut target: String, query: Option<&str>) -> String {
    let Some(query) = query.filter(|query| !query.is_empty()) else {
        return target;
    };
    let encoded = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()
        .and_then(|pairs| serde_urlencoded::to_string(pairs).ok())
        .unwrap_or_else(|| query.to_owned());
    if encoded.is_empty() {
        return target;
    }

    target.push(if target.contains('?') { '&' } else { '?' });
    target.push_str(&encoded);
    target
}
