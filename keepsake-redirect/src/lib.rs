#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod dispatcher;
mod error;
mod rule;
mod rule_set;
mod template;

pub use dispatcher::{Redirect, RedirectDispatcher, RedirectKind};
pub use error::RedirectError;
pub use rule::RedirectRule;
pub use rule_set::RedirectRuleSet;
pub use template::Template;
