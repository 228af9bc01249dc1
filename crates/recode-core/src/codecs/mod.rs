//! Built-in format codecs
//!
//! - JSON via serde_json
//! - YAML via serde_yaml (keys normalized to strings)
//! - TOML via toml
//! - HCL via hcl-rs (blocks carried as side metadata)
//! - null, a decoder that ignores its input

mod hcl;
mod json;
mod null;
mod toml;
mod yaml;

pub use self::hcl::{HclBlock, HclCodec};
pub use self::json::JsonCodec;
pub use self::null::NullCodec;
pub use self::toml::TomlCodec;
pub use self::yaml::{normalize_yaml, YamlCodec};
