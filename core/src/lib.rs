//! Imports vehicle models from the RSI catalog into a host scene.
//!
//! An import runs as one chain per catalog item:
//! the [`manifest`] is resolved, every geometry ref is [`fetch`]ed and [`assemble`]d concurrently,
//! the merged mesh has its [`uv`]s remapped and is optionally [`partition`]ed,
//! and the finished bundle is handed to the host's [`scene`] context for insertion.
//! Any failure aborts the whole import before anything reaches the scene.
//!
//! Library Notes:
//! - [ureq](https://crates.io/crates/ureq) for blocking HTTP, run on tokio's blocking pool
//! - geometry containers are decoded out of process, see [`decoder::ProcessDecoder`]
//! - [profiling](https://crates.io/crates/profiling) scopes on the cpu-heavy mesh passes

pub mod assemble;
pub mod catalog;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod format;
pub mod http;
pub mod import;
pub mod manifest;
pub mod mesh;
pub mod partition;
pub mod scene;
pub mod settings;
pub mod utility;
pub mod uv;

pub use error::{ErrorKind, ImportError};
pub use import::{CancelToken, ImportOptions, Importer};
pub use settings::Settings;
