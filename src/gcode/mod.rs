//! Instruction-text processing: block splitting, purge removal, detach
//! generation and loop assembly.
//!
//! The functions here work on `&str` and never touch the archive. A typical
//! flow mirrors [`crate::pipeline::build_looped_text`]:
//!
//! ```rust
//! use plateloop::gcode::{LoopPlan, assemble, split_blocks, strip_body};
//!
//! let text = "; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n\
//!             ; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\n\
//!             ; FLUSH_START\nG1 E5\n; FLUSH_END\nG1 X10 Y10 E1\n";
//! let plan = LoopPlan::new(2);
//!
//! let doc = split_blocks(text)?;
//! let body = doc.body_lines();
//! let stripped = strip_body(&body, &plan.purge);
//! let looped = assemble(&doc, &stripped.lines, &plan);
//!
//! assert_eq!(looped.matches("G1 X10 Y10 E1").count(), 2);
//! assert!(!looped.contains("FLUSH_START"));
//! # Ok::<(), plateloop::Error>(())
//! ```

mod assemble;
mod blocks;
mod detach;
mod inspect;
pub mod markers;
mod purge;

pub use assemble::{LoopPlan, adjust_bed_hold, assemble, cooling_lines};
pub use blocks::{
    InstructionDocument, PrintRegion, SYNTHESIZED_TAIL, split_blocks, split_print_region,
};
pub use detach::{
    CoolingMode, DetachConfig, LIFT_FEED, MACHINE_X_MAX, MACHINE_Z_MAX, MIN_FEED, SAFE_LIFT_MM,
    SEQUENCE_END, SEQUENCE_START, SWEEP_X_FLOOR, SWEEP_Y_FRONT, SWEEP_Z_FEED, TRAVEL_FEED,
    build_detach_sequence, format_number, sweep_columns,
};
pub use inspect::{DetectedDefaults, detect_defaults};
pub use purge::{
    LinePurgeThresholds, PurgeConfig, PurgeStage, PurgeTrace, Removal, StrippedLines,
    StrippedText, strip_body, strip_nozzle_load_line, strip_top_of_file,
};
