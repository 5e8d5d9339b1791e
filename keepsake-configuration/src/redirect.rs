use std::path::{Path, PathBuf};

use keepsake_redirect::{RedirectDispatcher, RedirectRuleSet};
use serde::{Deserialize, Serialize};

/// Where redirect rules come from.
///
/// Both files are optional. A file that is missing or fails to load yields no
/// rules of its kind; the failure is logged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Redirects {
    /// Rules answered with `301 Moved Permanently`. Checked first.
    pub permanent: Option<PathBuf>,
    /// Rules answered with `302 Found` and `Cache-Control: no-store`.
    pub temporary: Option<PathBuf>,
    /// Redirect `/path/` to `/path` when no rule matches.
    pub strip_trailing_slash: bool,
}

impl Redirects {
    pub(crate) fn resolve_paths(&mut self, dir: &Path) {
        for path in [&mut self.permanent, &mut self.temporary].into_iter().flatten() {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }

    /// Loads the rule files into a dispatcher.
    pub fn into_dispatcher(self) -> RedirectDispatcher {
        let load = |path: Option<PathBuf>| {
            path.map(RedirectRuleSet::load_or_empty).unwrap_or_default()
        };
        RedirectDispatcher::new(load(self.permanent), load(self.temporary))
            .strip_trailing_slash(self.strip_trailing_slash)
    }
}
