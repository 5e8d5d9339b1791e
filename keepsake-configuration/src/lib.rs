#![doc = include_str!("../README.md")]

/// Store selection.
pub mod backend;
pub mod error;
/// Redirect rule sources.
pub mod redirect;
mod site;

pub use backend::Backend;
pub use error::ConfigError;
pub use redirect::Redirects;
pub use site::{Namespace, SiteConfig, SiteFetcher};
