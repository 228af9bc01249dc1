//! recode import
//!
//! Resolves references to local files or remote objects into decoded values.
//!
//! # Options
//!
//! - **raw**: return content as text, no decoding
//! - **nofail**: capture per-item errors inside envelopes
//! - **pattern**: expand a glob, return a list
//! - **metadata**: return envelopes even on success
//!
//! # Architecture
//!
//! ```text
//! reference → Reference::parse ─┬─ local ──▶ fs::read / glob ───────────────┐
//!                               └─ remote ─▶ ObjectStore::get_object        ├─▶ decode by extension ─▶ Envelope / Value
//!                                            ConcurrentFetcher (pattern) ───┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use recode_import::{ImportOptions, Importer};
//!
//! let importer = Importer::new(registry).with_base_dir("config");
//! let all = importer.import("*.yaml", ImportOptions::parse(["pattern,nofail"])?)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod importer;
pub mod options;
pub mod pattern;
pub mod pool;
pub mod reference;
pub mod remote;
pub mod varfiles;

pub use envelope::{Envelope, Imported, RemoteLocation};
pub use error::{FetchError, ImportError, RemoteError};
pub use fetcher::{ConcurrentFetcher, FetcherConfig};
pub use importer::{decode_by_extension, Importer};
pub use options::ImportOptions;
pub use pattern::KeyPattern;
pub use pool::{PoolError, WorkerPool};
pub use reference::{Reference, RemoteRef};
pub use remote::{GetObject, ListObjects, ListPage, ObjectStore, ObjectSummary, Remotes};
pub use varfiles::VarFilesFilter;

#[cfg(feature = "s3")]
pub use remote::S3Store;

pub use tokio_util::sync::CancellationToken;
