#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod upstream;

pub use upstream::ReqwestUpstream;

/// Re-export of the reqwest client type for convenience.
pub use reqwest::Client;
