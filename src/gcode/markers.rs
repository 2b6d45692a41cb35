//! Comment markers and line patterns recognized in sliced G-code.
//!
//! Every marker is a line-initial comment (one or more `;`, optional
//! whitespace) matched case-insensitively. Patterns are compiled once.

use std::sync::LazyLock;

use regex::Regex;

pub(crate) fn pattern(re: &str) -> Regex {
    // Only called with literal patterns.
    Regex::new(re).unwrap_or_else(|err| panic!("invalid built-in pattern {re:?}: {err}"))
}

/// The four block markers, in the order they must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMarker {
    /// `; HEADER_BLOCK_START`
    HeaderStart,
    /// `; HEADER_BLOCK_END`
    HeaderEnd,
    /// `; CONFIG_BLOCK_START`
    ConfigStart,
    /// `; CONFIG_BLOCK_END`
    ConfigEnd,
}

impl BlockMarker {
    /// All markers in required order.
    pub const ORDER: [BlockMarker; 4] = [
        BlockMarker::HeaderStart,
        BlockMarker::HeaderEnd,
        BlockMarker::ConfigStart,
        BlockMarker::ConfigEnd,
    ];

    /// Returns the marker keyword.
    pub fn name(self) -> &'static str {
        match self {
            BlockMarker::HeaderStart => "HEADER_BLOCK_START",
            BlockMarker::HeaderEnd => "HEADER_BLOCK_END",
            BlockMarker::ConfigStart => "CONFIG_BLOCK_START",
            BlockMarker::ConfigEnd => "CONFIG_BLOCK_END",
        }
    }

    /// Returns `true` if the trimmed `line` is this marker.
    pub fn matches(self, line: &str) -> bool {
        let re: &Regex = match self {
            BlockMarker::HeaderStart => &*HEADER_START,
            BlockMarker::HeaderEnd => &*HEADER_END,
            BlockMarker::ConfigStart => &*CONFIG_START,
            BlockMarker::ConfigEnd => &*CONFIG_END,
        };
        re.is_match(line.trim())
    }
}

impl std::fmt::Display for BlockMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

static HEADER_START: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^;+\s*HEADER_BLOCK_START\b"));
static HEADER_END: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^;+\s*HEADER_BLOCK_END\b"));
static CONFIG_START: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^;+\s*CONFIG_BLOCK_START\b"));
static CONFIG_END: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^;+\s*CONFIG_BLOCK_END\b"));

// Producer artifact left after the config block, e.g. `;END gcode (added by tool)`.
static END_NOTE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^;+\s*END gcode\s*\(.*\)\s*$"));

static START_PRINT_LINE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^;+\s*START\s+gcode\b"));
pub(crate) static START_PRINT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i);+\s*START\s+gcode"));
pub(crate) static END_PRINT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i);+\s*END\s+gcode"));

static LAYER_START: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r"(?i)^;\s*LAYER:\d+",
        r"|^;\s*type:\s*(skirt|brim|wall|perimeter|infill)",
        r"|^;\s*(layer|skirt|brim|wall|perimeter|infill)\b",
    ))
});

static FLUSH_START: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^;\s*FLUSH_START\b"));
static FLUSH_END: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^;\s*FLUSH_END\b"));

static WIPE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)shake to put down garbage|wipe and shake|move Y to aside, prevent collision")
});
// M204 sets acceleration; M621/M629 drive the tool changer.
static WIPE_STOP_COMMAND: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^M20[49]\b|^M62[19]\b"));
static WIPE_STOP_SECTION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^;\s*(HEADER_BLOCK|CONFIG_BLOCK|END gcode)"));
static MACHINE_COMMAND: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[GM]\d+"));
static WIPE_TOLERATED: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^G[01]\b|^M10[67]\b"));

static EXTRUDE_MOVE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^G1\b"));
static TRAVEL_MOVE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^G0\b"));
static PLAIN_COMMENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^;\s"));
static Y_WORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bY(-?\d+(?:\.\d+)?)"));
static E_WORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bE(-?\d+(?:\.\d+)?)"));

static TOP_PURGE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)^;+\s*(flush|flush_start|prime|purge|wipe|thumbnail|thumbnails?)\b")
});

static EXECUTABLE_BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*;\s*EXECUTABLE_BLOCK_START\b"));
static NOZZLE_LOAD_LINE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*;[=\-\s]*nozzle\s+load\s+line\b"));
static NOZZLE_LOAD_END: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)^\s*;\s*filament\s+start\s+gcode\b|^\s*;\s*VT0\b|^\s*;\s*CHANGE_LAYER\b")
});

// Bed heat-and-continue / heat-and-wait with an `S` target.
pub(crate) static BED_TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(M1(?:40|90)\s+S)\d+"));

/// Returns `true` for the non-standard `; END gcode (...)` trailer comment.
pub fn is_end_note(line: &str) -> bool {
    END_NOTE.is_match(line.trim())
}

/// Returns `true` for a `; START gcode` line.
pub fn is_start_print(line: &str) -> bool {
    START_PRINT_LINE.is_match(line.trim())
}

/// Returns `true` for a header-start or config-start marker line.
pub fn is_block_opening(line: &str) -> bool {
    BlockMarker::HeaderStart.matches(line) || BlockMarker::ConfigStart.matches(line)
}

/// Returns `true` for a layer or print-region marker (`; LAYER:3`, `;TYPE: wall`, ...).
pub fn is_layer_start(line: &str) -> bool {
    LAYER_START.is_match(line)
}

/// Returns `true` for `; FLUSH_START`.
pub fn is_flush_start(line: &str) -> bool {
    FLUSH_START.is_match(line)
}

/// Returns `true` for `; FLUSH_END`.
pub fn is_flush_end(line: &str) -> bool {
    FLUSH_END.is_match(line)
}

/// Returns `true` if the line carries one of the vendor wipe/shake comments.
pub fn is_wipe_hint(line: &str) -> bool {
    WIPE_HINT.is_match(line)
}

/// Returns `true` if a wipe/shake span must end before `line`.
pub(crate) fn ends_wipe_span(line: &str) -> bool {
    if is_layer_start(line) || WIPE_STOP_COMMAND.is_match(line) || WIPE_STOP_SECTION.is_match(line)
    {
        return true;
    }
    MACHINE_COMMAND.is_match(line) && !WIPE_TOLERATED.is_match(line)
}

/// Returns `true` for a `G1` move.
pub(crate) fn is_extrude_move(line: &str) -> bool {
    EXTRUDE_MOVE.is_match(line)
}

/// Returns `true` for a `G0` move.
pub(crate) fn is_travel_move(line: &str) -> bool {
    TRAVEL_MOVE.is_match(line)
}

/// Returns `true` for a `; comment` line.
pub(crate) fn is_plain_comment(line: &str) -> bool {
    PLAIN_COMMENT.is_match(line)
}

fn word_value(re: &Regex, line: &str) -> Option<f64> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Returns the `Y` word of a move, if any.
pub(crate) fn y_value(line: &str) -> Option<f64> {
    word_value(&Y_WORD, line)
}

/// Returns the `E` word of a move, if any.
pub(crate) fn e_value(line: &str) -> Option<f64> {
    word_value(&E_WORD, line)
}

/// Returns `true` for a purge/prime/wipe/thumbnail comment.
pub fn is_top_purge_comment(line: &str) -> bool {
    TOP_PURGE_COMMENT.is_match(line.trim())
}

/// Returns `true` for `; EXECUTABLE_BLOCK_START`.
pub fn is_executable_block_start(line: &str) -> bool {
    EXECUTABLE_BLOCK_START.is_match(line)
}

/// Returns `true` for a `;===== nozzle load line =====` marker.
pub fn is_nozzle_load_line(line: &str) -> bool {
    NOZZLE_LOAD_LINE.is_match(line)
}

/// Returns `true` for a line that ends a nozzle-load block.
pub fn ends_nozzle_load_line(line: &str) -> bool {
    NOZZLE_LOAD_END.is_match(line)
}
