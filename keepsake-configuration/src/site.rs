use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use keepsake::backend::Backend as BackendTrait;
use keepsake::{FetchPolicy, Fetcher, KeyNamespace, Upstream};
use keepsake_redirect::RedirectDispatcher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::Backend;
use crate::error::ConfigError;
use crate::redirect::Redirects;

/// Fetcher built from a [`SiteConfig`].
pub type SiteFetcher<U> = Fetcher<Arc<dyn BackendTrait + Send + 'static>, U>;

/// Prefix and version of every stored key.
///
/// Bumping `version` makes every previously stored response unreachable.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Namespace {
    /// Key prefix, e.g. the site name.
    pub prefix: String,
    /// Key version.
    pub version: u32,
}

impl From<Namespace> for KeyNamespace {
    fn from(namespace: Namespace) -> Self {
        KeyNamespace::new(namespace.prefix, namespace.version)
    }
}

/// Everything a site needs to fetch, store and redirect.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Expiry, per-attempt timeout and retries.
    pub fetch: FetchPolicy,
    /// Store for fetched responses.
    pub backend: Backend,
    /// Key namespace.
    pub namespace: Namespace,
    /// Redirect rule sources.
    pub redirects: Redirects,
}

impl SiteConfig {
    /// Parses a YAML document. Relative paths are kept as written.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(source).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Reads a YAML file. Relative paths inside it are resolved against the
    /// file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&source)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        debug!(path = %path.display(), "loaded site configuration");
        Ok(config)
    }

    fn resolve_paths(&mut self, dir: &Path) {
        self.backend.resolve_paths(dir);
        self.redirects.resolve_paths(dir);
    }

    /// Builds the configured store.
    pub fn build_backend(&self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        self.backend.clone().into_backend()
    }

    /// Loads the redirect rules.
    pub fn build_redirects(&self) -> RedirectDispatcher {
        self.redirects.clone().into_dispatcher()
    }

    /// Builds the store and a fetcher calling `upstream` through it.
    pub fn build_fetcher<U: Upstream>(&self, upstream: U) -> Result<SiteFetcher<U>, ConfigError> {
        let fetcher = Fetcher::new(self.build_backend()?, upstream, self.fetch.clone())?
            .namespace(self.namespace.clone().into());
        Ok(fetcher)
    }
}

impl FromStr for SiteConfig {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::from_yaml_str(source)
    }
}
