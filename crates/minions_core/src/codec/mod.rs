//! Text codecs for persisted records.

pub mod yaml;

pub use yaml::{parse_yaml, to_yaml, YamlError};
