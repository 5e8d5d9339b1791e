use std::path::Path;

use http::header::{CACHE_CONTROL, LOCATION};
use http::{HeaderValue, Response, StatusCode};

use crate::rule_set::{RedirectRuleSet, append_query};

/// Whether clients may cache a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// 301, cacheable.
    Permanent,
    /// 302, not to be cached.
    Temporary,
}

/// Where to send a request instead of routing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
    kind: RedirectKind,
}

impl Redirect {
    /// Creates a redirect to `location`.
    pub fn new(location: impl Into<String>, kind: RedirectKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }

    /// Target URL.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Permanent or temporary.
    pub fn kind(&self) -> RedirectKind {
        self.kind
    }

    /// Returns `true` for permanent redirects.
    pub fn is_permanent(&self) -> bool {
        self.kind == RedirectKind::Permanent
    }

    /// `301 Moved Permanently` or `302 Found`.
    pub fn status(&self) -> StatusCode {
        match self.kind {
            RedirectKind::Permanent => StatusCode::MOVED_PERMANENTLY,
            RedirectKind::Temporary => StatusCode::FOUND,
        }
    }

    /// `Cache-Control` to send along: none for permanent, `no-store` for temporary.
    pub fn cache_control(&self) -> Option<HeaderValue> {
        match self.kind {
            RedirectKind::Permanent => None,
            RedirectKind::Temporary => Some(HeaderValue::from_static("no-store")),
        }
    }

    /// Builds the redirect response with an empty body.
    ///
    /// Fails if the location is not a valid header value.
    pub fn to_response<B: Default>(&self) -> Result<Response<B>, http::Error> {
        let mut builder = Response::builder()
            .status(self.status())
            .header(LOCATION, self.location.as_str());
        if let Some(cache_control) = self.cache_control() {
            builder = builder.header(CACHE_CONTROL, cache_control);
        }
        builder.body(B::default())
    }
}

/// Resolves request paths against permanent, then temporary redirect rules.
///
/// ```
/// use keepsake_redirect::{RedirectDispatcher, RedirectKind, RedirectRuleSet};
///
/// let permanent = RedirectRuleSet::from_yaml_str(r"^/old/(?P<id>\d+)$: /new/{id}").unwrap();
/// let temporary = RedirectRuleSet::from_yaml_str("/old/.*: /archive").unwrap();
/// let dispatcher = RedirectDispatcher::new(permanent, temporary);
///
/// let redirect = dispatcher.resolve("/old/42", Some("x=1")).unwrap();
/// assert_eq!(redirect.location(), "/new/42?x=1");
/// assert_eq!(redirect.kind(), RedirectKind::Permanent);
///
/// let redirect = dispatcher.resolve("/old/abc", None).unwrap();
/// assert_eq!(redirect.kind(), RedirectKind::Temporary);
///
/// assert!(dispatcher.resolve("/elsewhere", None).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RedirectDispatcher {
    permanent: RedirectRuleSet,
    temporary: RedirectRuleSet,
    strip_trailing_slash: bool,
}

impl RedirectDispatcher {
    /// Creates a dispatcher over two rule sets.
    pub fn new(permanent: RedirectRuleSet, temporary: RedirectRuleSet) -> Self {
        Self {
            permanent,
            temporary,
            strip_trailing_slash: false,
        }
    }

    /// Loads both rule files. Each one that is missing or fails to load is
    /// empty; failures are logged.
    pub fn from_files(permanent: impl AsRef<Path>, temporary: impl AsRef<Path>) -> Self {
        Self::new(
            RedirectRuleSet::load_or_empty(permanent),
            RedirectRuleSet::load_or_empty(temporary),
        )
    }

    /// Also redirect paths ending in `/` (other than `/` itself) to the same
    /// path without it, temporarily. Tried after both rule sets.
    pub fn strip_trailing_slash(mut self, enabled: bool) -> Self {
        self.strip_trailing_slash = enabled;
        self
    }

    /// Permanent rules.
    pub fn permanent(&self) -> &RedirectRuleSet {
        &self.permanent
    }

    /// Temporary rules.
    pub fn temporary(&self) -> &RedirectRuleSet {
        &self.temporary
    }

    /// Finds where to redirect `path`, if anywhere.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<Redirect> {
        if let Some(location) = self.permanent.find(path, query) {
            return Some(Redirect::new(location, RedirectKind::Permanent));
        }
        if let Some(location) = self.temporary.find(path, query) {
            return Some(Redirect::new(location, RedirectKind::Temporary));
        }
        if self.strip_trailing_slash
            && path != "/"
            && let Some(stripped) = path.strip_suffix('/')
        {
            let location = append_query(stripped.to_owned(), query);
            return Some(Redirect::new(location, RedirectKind::Temporary));
        }
        None
    }
}
