//! Removal of vendor purge, prime and wipe sequences.
//!
//! Removal runs as an ordered list of named stages. Each stage inspects an
//! immutable line slice and reports the index ranges it wants removed; the
//! ranges are then dropped to produce a new line sequence. Stages never
//! fail: a stage whose trigger is absent removes nothing.
//!
//! | Stage | Scope | Trigger |
//! |-------|-------|---------|
//! | [`FlushBlocks`](PurgeStage::FlushBlocks) | body | `; FLUSH_START` ... `; FLUSH_END` |
//! | [`WipeShake`](PurgeStage::WipeShake) | body | vendor wipe/shake comments |
//! | [`LinePurge`](PurgeStage::LinePurge) | body | narrow, mostly extruding run before the first layer |
//! | [`TopOfFile`](PurgeStage::TopOfFile) | whole text | purge comments before `; START gcode` |
//! | [`NozzleLoadLine`](PurgeStage::NozzleLoadLine) | whole text | `; nozzle load line` block |
//!
//! Every removal is recorded in a [`PurgeTrace`].

use std::fmt;
use std::ops::Range;

use super::markers;
use crate::text::{self, LineEnding};

/// A named purge-removal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeStage {
    /// Explicit `FLUSH_START`/`FLUSH_END` blocks near the top of the body.
    FlushBlocks,
    /// The wipe/shake span around a vendor hint comment.
    WipeShake,
    /// Heuristic purge line before the first layer.
    LinePurge,
    /// Blank and purge comment lines before the start-of-print marker.
    TopOfFile,
    /// The `nozzle load line` block after the executable block start.
    NozzleLoadLine,
}

impl PurgeStage {
    /// All stages, in priority order.
    pub const ALL: [PurgeStage; 5] = [
        PurgeStage::FlushBlocks,
        PurgeStage::WipeShake,
        PurgeStage::LinePurge,
        PurgeStage::TopOfFile,
        PurgeStage::NozzleLoadLine,
    ];

    /// Stages applied to the loop body, in priority order.
    pub const BODY: [PurgeStage; 3] = [
        PurgeStage::FlushBlocks,
        PurgeStage::WipeShake,
        PurgeStage::LinePurge,
    ];

    /// Returns the trace tag of this stage.
    pub fn tag(self) -> &'static str {
        match self {
            PurgeStage::FlushBlocks => "FLUSH block removed",
            PurgeStage::WipeShake => "wipe/shake block removed",
            PurgeStage::LinePurge => "heuristic line purge removed",
            PurgeStage::TopOfFile => "top-of-file purge removed",
            PurgeStage::NozzleLoadLine => "nozzle load line removed",
        }
    }

    /// Returns a short identifier.
    pub fn name(self) -> &'static str {
        match self {
            PurgeStage::FlushBlocks => "flush",
            PurgeStage::WipeShake => "wipe",
            PurgeStage::LinePurge => "line-purge",
            PurgeStage::TopOfFile => "top-of-file",
            PurgeStage::NozzleLoadLine => "nozzle-load",
        }
    }
}

impl fmt::Display for PurgeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thresholds of the line-purge heuristic.
///
/// A run qualifies once it has at least `min_moves` moves, more than
/// `min_extrude_ratio` of them extruding, and a Y excursion below
/// `max_band`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePurgeThresholds {
    /// Minimum number of `G0`/`G1` moves.
    pub min_moves: usize,
    /// Minimum share of moves that advance the extruder.
    pub min_extrude_ratio: f64,
    /// Maximum Y excursion from the first Y seen.
    pub max_band: f64,
    /// Lines scanned when no layer marker exists.
    pub scan_cap: usize,
    /// Minimum E increase counted as extrusion.
    pub extrude_epsilon: f64,
}

impl Default for LinePurgeThresholds {
    fn default() -> Self {
        Self {
            min_moves: 25,
            min_extrude_ratio: 0.6,
            max_band: 8.0,
            scan_cap: 800,
            extrude_epsilon: 0.0001,
        }
    }
}

/// Configuration of the purge stripper.
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeConfig {
    stages: Vec<PurgeStage>,
    /// Lines from the top of the body searched for flush blocks and hints.
    pub scan_window: usize,
    /// Lines removed before a wipe hint.
    pub wipe_look_behind: usize,
    /// Maximum distance past a wipe hint.
    pub wipe_cap: usize,
    /// Lines searched for a nozzle-load terminator, and removed without one.
    pub nozzle_load_cap: usize,
    /// Line-purge heuristic thresholds.
    pub line_purge: LinePurgeThresholds,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            stages: PurgeStage::ALL.to_vec(),
            scan_window: 2000,
            wipe_look_behind: 25,
            wipe_cap: 80,
            nozzle_load_cap: 200,
            line_purge: LinePurgeThresholds::default(),
        }
    }
}

impl PurgeConfig {
    /// Creates a configuration with every stage disabled.
    pub fn none() -> Self {
        Self {
            stages: Vec::new(),
            ..Self::default()
        }
    }

    /// Returns `true` if `stage` is enabled.
    pub fn is_enabled(&self, stage: PurgeStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Returns the enabled stages in priority order.
    pub fn stages(&self) -> impl Iterator<Item = PurgeStage> + '_ {
        PurgeStage::ALL
            .into_iter()
            .filter(move |stage| self.is_enabled(*stage))
    }

    /// Enables or disables a stage.
    pub fn with_stage(mut self, stage: PurgeStage, enabled: bool) -> Self {
        self.stages.retain(|s| *s != stage);
        if enabled {
            self.stages.push(stage);
        }
        self
    }

    /// Sets the scan window.
    pub fn scan_window(mut self, lines: usize) -> Self {
        self.scan_window = lines;
        self
    }

    /// Sets the line-purge thresholds.
    pub fn line_purge(mut self, thresholds: LinePurgeThresholds) -> Self {
        self.line_purge = thresholds;
        self
    }

    /// Sets the nozzle-load cap.
    pub fn nozzle_load_cap(mut self, lines: usize) -> Self {
        self.nozzle_load_cap = lines;
        self
    }
}

/// One recorded removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// Stage that removed the lines.
    pub stage: PurgeStage,
    /// Removed line indices, relative to the stage's input.
    pub lines: Range<usize>,
    /// Extra detail for the trace line.
    pub detail: Option<String>,
}

impl Removal {
    /// Number of removed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage.tag())?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        write!(
            f,
            " [{}..{}] ({} lines)",
            self.lines.start,
            self.lines.end.saturating_sub(1),
            self.len()
        )
    }
}

/// Human-readable record of everything the stripper removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurgeTrace {
    removals: Vec<Removal>,
}

impl PurgeTrace {
    /// Creates an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded removals.
    pub fn removals(&self) -> &[Removal] {
        &self.removals
    }

    /// Returns `true` if nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    /// Total number of removed lines.
    pub fn total_lines(&self) -> usize {
        self.removals.iter().map(Removal::len).sum()
    }

    /// Returns `true` if `stage` removed anything.
    pub fn removed_by(&self, stage: PurgeStage) -> bool {
        self.removals.iter().any(|r| r.stage == stage)
    }

    /// Appends the removals of another trace.
    pub fn extend(&mut self, other: PurgeTrace) {
        self.removals.extend(other.removals);
    }

    fn push(&mut self, removal: Removal) {
        log::debug!("{removal}");
        self.removals.push(removal);
    }

    /// Multi-line summary, or `No purge block detected.` if empty.
    pub fn summary(&self) -> String {
        if self.removals.is_empty() {
            return "No purge block detected.".to_string();
        }
        let entries: Vec<String> = self.removals.iter().map(ToString::to_string).collect();
        format!("Purge cleanup:\n; {}", entries.join("\n; "))
    }
}

impl fmt::Display for PurgeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Lines left after stripping, plus the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedLines<'a> {
    /// Remaining lines.
    pub lines: Vec<&'a str>,
    /// What was removed.
    pub trace: PurgeTrace,
}

/// Text left after stripping, plus the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedText {
    /// Remaining text, with the input's line ending.
    pub text: String,
    /// What was removed.
    pub trace: PurgeTrace,
}

/// Drops `ranges` (sorted, disjoint) from `lines`.
fn remove_ranges<'a>(lines: &[&'a str], ranges: &[Range<usize>]) -> Vec<&'a str> {
    let mut out = Vec::with_capacity(lines.len());
    let mut cursor = 0;
    for range in ranges {
        out.extend_from_slice(&lines[cursor..range.start]);
        cursor = range.end;
    }
    out.extend_from_slice(&lines[cursor..]);
    out
}

/// Rejoins `lines` with the line ending of `original`, keeping its final
/// terminator (or lack of one).
fn rejoin(original: &str, lines: &[&str]) -> String {
    let eol = LineEnding::detect(original);
    let mut out = eol.join(lines);
    if !original.ends_with('\n') && !out.is_empty() {
        out.truncate(out.len() - eol.as_str().len());
    }
    out
}

/// Finds every flush block within the scan window.
///
/// The window is measured in the output numbering, so each removed block
/// lets the scan reach further into the input.
fn find_flush_blocks(lines: &[&str], config: &PurgeConfig) -> Vec<Range<usize>> {
    let limit = lines.len().min(config.scan_window);
    let mut ranges = Vec::new();
    let mut removed = 0;
    let mut i = 0;

    while i < lines.len() && i - removed < limit {
        if !markers::is_flush_start(lines[i]) {
            i += 1;
            continue;
        }
        match lines[i + 1..].iter().position(|l| markers::is_flush_end(l)) {
            Some(rel) => {
                let end = i + 1 + rel + 1;
                ranges.push(i..end);
                removed += end - i;
                i = end;
            }
            None => {
                log::warn!("FLUSH_START at line {i} has no FLUSH_END; leaving it in place");
                break;
            }
        }
    }
    ranges
}

/// Finds the wipe/shake span around the first hint comment.
fn find_wipe_span(lines: &[&str], config: &PurgeConfig) -> Option<Range<usize>> {
    let limit = lines.len().min(config.scan_window);
    let hint = lines[..limit].iter().position(|l| markers::is_wipe_hint(l))?;

    let start = hint.saturating_sub(config.wipe_look_behind);
    let cap = lines.len().min(hint + config.wipe_cap);
    let mut end = hint + 1;
    while end < cap && !markers::ends_wipe_span(lines[end]) {
        end += 1;
    }
    (end > start).then_some(start..end)
}

/// Result of the line-purge scan.
struct LinePurge {
    end: usize,
    band: f64,
}

/// Finds a narrow, mostly extruding run of moves before the first layer.
fn find_line_purge(lines: &[&str], config: &PurgeConfig) -> Option<LinePurge> {
    let t = &config.line_purge;
    let window = lines.len().min(config.scan_window);
    let first_layer = lines[..window]
        .iter()
        .position(|l| markers::is_layer_start(l))
        .unwrap_or_else(|| lines.len().min(t.scan_cap));

    let mut y0: Option<f64> = None;
    let mut band = 0.0_f64;
    let mut e_prev = 0.0_f64;
    let mut extruding = 0usize;
    let mut moves = 0usize;
    let mut qualified_end = 0usize;

    let mut track_y = |line: &str, band: &mut f64| {
        if let Some(y) = markers::y_value(line) {
            let origin = *y0.get_or_insert(y);
            *band = band.max((y - origin).abs());
        }
    };

    for (i, line) in lines[..first_layer].iter().enumerate() {
        if markers::is_extrude_move(line) {
            moves += 1;
            track_y(line, &mut band);
            if let Some(e) = markers::e_value(line) {
                if e > e_prev + t.extrude_epsilon {
                    extruding += 1;
                }
                e_prev = e;
            }
            let ratio = extruding as f64 / moves as f64;
            if moves >= t.min_moves && ratio > t.min_extrude_ratio && band < t.max_band {
                qualified_end = i + 1;
            }
        } else if markers::is_travel_move(line) {
            moves += 1;
            track_y(line, &mut band);
        } else if markers::is_plain_comment(line) {
            continue;
        } else if qualified_end > 0 {
            break;
        }
    }

    (qualified_end > 0).then_some(LinePurge {
        end: qualified_end,
        band,
    })
}

/// Applies the body stages (flush, wipe/shake, line purge) in order.
///
/// The line-purge fallback only runs when neither earlier stage removed
/// anything.
///
/// # Example
///
/// ```rust
/// use plateloop::gcode::{PurgeConfig, strip_body};
///
/// let body = ["; FLUSH_START", "G1 X1", "; FLUSH_END", "G1 X2"];
/// let stripped = strip_body(&body, &PurgeConfig::default());
/// assert_eq!(stripped.lines, ["G1 X2"]);
/// assert_eq!(stripped.trace.total_lines(), 3);
/// ```
pub fn strip_body<'a>(lines: &[&'a str], config: &PurgeConfig) -> StrippedLines<'a> {
    let mut current: Vec<&'a str> = lines.to_vec();
    let mut trace = PurgeTrace::new();

    for stage in PurgeStage::BODY {
        if !config.is_enabled(stage) {
            continue;
        }
        let found: Vec<Removal> = match stage {
            PurgeStage::FlushBlocks => find_flush_blocks(&current, config)
                .into_iter()
                .map(|lines| Removal {
                    stage,
                    lines,
                    detail: None,
                })
                .collect(),
            PurgeStage::WipeShake => find_wipe_span(&current, config)
                .map(|lines| Removal {
                    stage,
                    lines,
                    detail: None,
                })
                .into_iter()
                .collect(),
            PurgeStage::LinePurge if trace.is_empty() => find_line_purge(&current, config)
                .map(|purge| Removal {
                    stage,
                    lines: 0..purge.end,
                    detail: Some(format!("Yband≈{:.2}", purge.band)),
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };
        if found.is_empty() {
            continue;
        }

        let ranges: Vec<Range<usize>> = found.iter().map(|r| r.lines.clone()).collect();
        current = remove_ranges(&current, &ranges);
        for removal in found {
            trace.push(removal);
        }
    }

    StrippedLines {
        lines: current,
        trace,
    }
}

/// Removes blank lines and purge comments before the start-of-print marker.
///
/// Removal stops for good at `; START gcode` or at a header/config opening
/// marker; those lines are always kept.
pub fn strip_top_of_file(text: &str, config: &PurgeConfig) -> StrippedText {
    if !config.is_enabled(PurgeStage::TopOfFile) {
        return StrippedText {
            text: text.to_string(),
            trace: PurgeTrace::new(),
        };
    }

    let all = text::lines(text);
    let region_end = all
        .iter()
        .position(|l| markers::is_block_opening(l) || markers::is_start_print(l))
        .unwrap_or(all.len());

    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (i, line) in all[..region_end].iter().enumerate() {
        if !(line.trim().is_empty() || markers::is_top_purge_comment(line)) {
            continue;
        }
        match ranges.last_mut() {
            Some(last) if last.end == i => last.end = i + 1,
            _ => ranges.push(i..i + 1),
        }
    }

    let mut trace = PurgeTrace::new();
    if ranges.is_empty() {
        return StrippedText {
            text: text.to_string(),
            trace,
        };
    }
    let kept = remove_ranges(&all, &ranges);
    for lines in ranges {
        trace.push(Removal {
            stage: PurgeStage::TopOfFile,
            lines,
            detail: None,
        });
    }
    StrippedText {
        text: rejoin(text, &kept),
        trace,
    }
}

/// Removes the `nozzle load line` block.
///
/// The search starts at `; EXECUTABLE_BLOCK_START` when present. The block
/// ends before the first `; filament start gcode`, `;VT0` or
/// `; CHANGE_LAYER` line; without one, at most `nozzle_load_cap` lines
/// are removed.
pub fn strip_nozzle_load_line(text: &str, config: &PurgeConfig) -> StrippedText {
    let unchanged = || StrippedText {
        text: text.to_string(),
        trace: PurgeTrace::new(),
    };
    if !config.is_enabled(PurgeStage::NozzleLoadLine) {
        return unchanged();
    }

    let all = text::lines(text);
    let search_from = all
        .iter()
        .position(|l| markers::is_executable_block_start(l))
        .unwrap_or(0);
    let Some(start) = all[search_from..]
        .iter()
        .position(|l| markers::is_nozzle_load_line(l))
        .map(|rel| search_from + rel)
    else {
        return unchanged();
    };

    let window_end = all.len().min(start.saturating_add(config.nozzle_load_cap));
    let end = match all[(start + 1).min(window_end)..window_end]
        .iter()
        .position(|l| markers::ends_nozzle_load_line(l))
    {
        Some(rel) => start + 1 + rel,
        None => {
            log::warn!(
                "nozzle load line at {start} has no terminator within {} lines; removing {} lines",
                config.nozzle_load_cap,
                window_end - start
            );
            window_end
        }
    };

    if end <= start {
        return unchanged();
    }
    let mut trace = PurgeTrace::new();
    let kept = remove_ranges(&all, std::slice::from_ref(&(start..end)));
    trace.push(Removal {
        stage: PurgeStage::NozzleLoadLine,
        lines: start..end,
        detail: None,
    });
    StrippedText {
        text: rejoin(text, &kept),
        trace,
    }
}
