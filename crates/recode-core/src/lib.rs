//! recode core
//!
//! Name-dispatched conversion of structured data between formats.
//!
//! # Core Operations
//!
//! - **Decode**: bytes → [`Value`] (+ optional side metadata) with a named decoder
//! - **Filter**: value → value through a chain of named filters
//! - **Encode**: [`Value`] (+ side metadata) → bytes with a named encoder
//!
//! # Architecture
//!
//! ```text
//! input → Registry::decoder(name) → Decoded{value, metadata}
//!       → Registry::filter(name)* → value
//!       → Registry::encoder(name) → output
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use recode_core::{RecodeConfig, Recoder, Registry};
//!
//! let registry = Registry::with_builtin_codecs()?.initialize()?;
//! let recoder = Recoder::new(registry);
//! let config = RecodeConfig::new("yaml", "json").with_encoder_args(["pretty"]);
//! recoder.run(&config, &mut std::io::stdin(), &mut std::io::stdout())?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod codec;
pub mod codecs;
pub mod error;
pub mod filter;
pub mod recoder;
pub mod registry;

pub use codec::{expect_no_args, Codec, Decode, Decoded, Encode};
pub use error::{
    display_chain, find_argument_error, ArgumentError, BoxError, CodecError, Direction, FilterError,
    RecodeError, RegistryError, Stage,
};
pub use filter::{Filter, FilterStep};
pub use recoder::{RecodeConfig, Recoder};
pub use registry::Registry;
pub use serde_json::{Map, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for implementing codecs and filters
    pub use crate::codec::{expect_no_args, Codec, Decode, Decoded, Encode};
    pub use crate::error::{ArgumentError, CodecError, FilterError};
    pub use crate::filter::Filter;
    pub use crate::registry::Registry;
    pub use serde_json::Value;
}
