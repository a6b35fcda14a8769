//! # sip - directory archiver with per-file Huffman compression
//!
//! Packs files and directory trees into a single `.sipped` container and
//! restores them. Every file gets its own canonical Huffman code; files the
//! code cannot describe are stored literally.
//!
//! ## Layers
//!
//! - **Codec**: frequency counting, code construction, bit packing, decoding
//! - **Container**: the on-disk entry layout and a sequential reader
//! - **Domain**: validated entry paths and their errors
//! - **Application**: create, extract and list use cases
//! - **Infrastructure**: directory traversal and atomic file publication
//!
//! ## Example Usage
//!
//! ```no_run
//! use sip::use_cases::{CorruptPolicy, CreateArchiveUseCase, ExtractArchiveUseCase};
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let create = CreateArchiveUseCase::new(4, true);
//! create
//!     .execute(&[PathBuf::from("docs")], Path::new("docs.sipped"))
//!     .await?;
//!
//! let extract = ExtractArchiveUseCase::new(CorruptPolicy::Abort);
//! extract.execute(Path::new("docs.sipped"), Path::new("restored")).await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod codec;
pub mod config;
pub mod container;
pub mod domain;
pub mod infrastructure;

pub use application::{dto, errors as archive_errors, use_cases};
pub use config::{Config, LogFormat};
pub use domain::errors as domain_errors;
pub use domain::value_objects;
