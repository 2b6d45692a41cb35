//! Archive editing: swapping a plate's instruction file.
//!
//! Printer firmware checks both the ZIP headers and the `.md5` sidecar of
//! the plate G-code, so replacing that file means:
//! - matching the original file's line endings before hashing
//! - recomputing CRC-32 and MD5 over the normalized bytes
//! - re-compressing if the original entry was deflated
//! - copying every other entry through byte-for-byte
//!
//! # Example
//!
//! ```rust
//! use plateloop::edit::{InstructionMerger, instruction_path};
//! use plateloop::read::Archive;
//! use plateloop::write::{EntryInput, write_archive};
//!
//! let original = write_archive(&[
//!     EntryInput::stored("3D/3dmodel.model", b"<model/>".to_vec()),
//!     EntryInput::stored(&instruction_path(1), b"G28\r\n".to_vec()),
//! ]);
//!
//! let report = InstructionMerger::new(&original).plate(1).apply(b"G28\nM400\n")?;
//! assert_eq!(report.entries_kept, 1);
//! assert_eq!(report.entries_added, 1); // the .md5 sidecar
//!
//! let archive = Archive::parse(&report.bytes)?;
//! let plate = archive.find("metadata/plate_1.gcode").unwrap();
//! assert_eq!(archive.extract(plate)?, b"G28\r\nM400\r\n");
//! # Ok::<(), plateloop::Error>(())
//! ```

mod merge;
pub mod paths;

pub use merge::{InstructionMerger, MergeAction, MergeReport, merge_instruction};
pub use paths::{checksum_path, instruction_path};
