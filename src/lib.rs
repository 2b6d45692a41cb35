//! # plateloop
//!
//! Repeat a sliced 3MF print job N times, unattended.
//!
//! A `.gcode.3mf` export is a ZIP archive carrying one G-code file per
//! plate plus an MD5 sidecar the printer verifies before it starts. This
//! crate rewrites the plate's G-code so the print body runs several times
//! in a row, and packs it back into the original archive without touching
//! any other entry:
//!
//! - vendor purge, prime and wipe sequences are removed from the repeated
//!   body
//! - each repetition is followed by a cooling step and a generated detach
//!   sequence that flexes the plate and sweeps the part off
//! - the new G-code keeps the original line endings, compression method,
//!   CRC-32 and MD5 consistency
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plateloop::gcode::{DetachConfig, LoopPlan};
//! use plateloop::pipeline::{build_looped_archive, output_file_name};
//!
//! fn main() -> plateloop::Result<()> {
//!     let original = std::fs::read("benchy.gcode.3mf")?;
//!     let plan = LoopPlan::new(5).detach(DetachConfig::default().slow_sweeps(2, 3000.0));
//!
//!     let result = build_looped_archive(&original, &plan)?;
//!     println!("{}", result.trace);
//!     std::fs::write(output_file_name("benchy.gcode.3mf", 5), &result.archive)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! | Module | Role |
//! |--------|------|
//! | [`read`] | Central-directory listing, payload access, CRC-checked extraction |
//! | [`write`] | Stored/deflated entry encoding and archive assembly |
//! | [`edit`] | Replacing one plate's G-code and checksum in place |
//! | [`gcode`] | Block splitting, purge removal, detach generation, loop assembly |
//! | [`pipeline`] | The end-to-end build |
//!
//! The archive layers and the text layers are independent: [`gcode`] works
//! on `&str` alone, [`edit`] on bytes alone.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Purge heuristics never
//! fail; a pattern that is absent simply removes nothing.
//!
//! ```rust
//! use plateloop::{Error, pipeline::build_looped_archive, gcode::LoopPlan};
//!
//! let err = build_looped_archive(b"not an archive", &LoopPlan::new(2)).unwrap_err();
//! assert!(matches!(err, Error::NotAnArchive(_)));
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: every
//! purge removal and merge decision at `debug`, degraded paths at `warn`.
//! Install any logger to see them.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | The `plateloop` command-line tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod checksum;
pub mod codec;
pub mod edit;
pub mod error;
pub mod format;
pub mod gcode;
pub mod pipeline;
pub mod read;
pub mod text;
pub mod write;

pub use error::{Error, Result};

// Re-export reading API at crate root for convenience
pub use read::{Archive, ArchiveEntry, list_entries};

// Re-export writing API at crate root for convenience
pub use write::{ArchiveWriter, EntryInput, WriteResult, write_archive};

// Re-export edit API
pub use edit::{InstructionMerger, MergeReport, merge_instruction};

// Re-export the end-to-end build
pub use gcode::{DetachConfig, LoopPlan, PurgeConfig};
pub use pipeline::{LoopedText, MergeResult, build_looped_archive, build_looped_text};

pub use codec::CompressionMethod;
pub use text::LineEnding;
