//! recode command line
//!
//! ```text
//! recode -i yaml -o json -O pretty < in.yaml
//! recode -i json -f varfiles -o tpl -O report.tpl --input vars.json
//! recode --list
//! ```
//!
//! # Exit status
//!
//! - `0`: success
//! - `1`: the run failed; the cause chain is printed to stderr
//! - `2`: bad arguments, including codec or filter arguments; usage is printed

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod app;
pub mod cli;
pub mod logging;
pub mod settings;

pub use cli::{command, Action, Invocation};
pub use settings::{S3Settings, Settings, SettingsError};
