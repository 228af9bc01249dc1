//! recode template
//!
//! The `tpl` encoder renders a value through a template file. Templates see
//! the value as `input` and can call back into the registry:
//!
//! - **decode_&lt;name&gt;** / **encode_&lt;name&gt;**: any registered codec
//! - **import**: local files or remote objects, with import options
//! - **include**: another template, relative to the current one
//! - **metadata**: side metadata produced by the decoder
//!
//! # Example
//!
//! ```rust,ignore
//! use recode_core::Registry;
//! use recode_template::TemplateCodec;
//!
//! let mut registry = Registry::with_builtin_codecs()?;
//! registry.register(TemplateCodec::new())?;
//! let registry = registry.initialize()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod codec;
pub mod error;
pub mod renderer;

pub use codec::TemplateCodec;
pub use error::TemplateError;
pub use renderer::{Renderer, MAX_INCLUDE_DEPTH};
