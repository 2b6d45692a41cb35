//! Assembly of the looped instruction file.

use std::borrow::Cow;

use super::blocks::InstructionDocument;
use super::detach::{CoolingMode, DetachConfig, build_detach_sequence};
use super::markers;
use super::purge::PurgeConfig;

/// Everything needed to turn one print into a looped print.
///
/// # Example
///
/// ```rust
/// use plateloop::gcode::{DetachConfig, LoopPlan};
///
/// let plan = LoopPlan::new(3)
///     .plate(2)
///     .bed_hold(60.0)
///     .detach(DetachConfig::default().home_between(true));
/// assert_eq!(plan.loop_count(), 3);
/// assert_eq!(plan.plate_index(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoopPlan {
    /// Number of repetitions; values below 1 are treated as 1.
    pub loops: u32,
    /// 1-based plate whose instruction file is looped.
    pub plate_index: u32,
    /// Bed temperature forced onto every `M140`/`M190 S` command.
    pub bed_hold_c: Option<f64>,
    /// Detach sequence and cooling emitted after each repetition.
    pub detach: DetachConfig,
    /// Purge stages applied before looping.
    pub purge: PurgeConfig,
}

impl Default for LoopPlan {
    fn default() -> Self {
        Self {
            loops: 1,
            plate_index: 1,
            bed_hold_c: None,
            detach: DetachConfig::default(),
            purge: PurgeConfig::default(),
        }
    }
}

impl LoopPlan {
    /// Creates a plan for `loops` repetitions of plate 1.
    pub fn new(loops: u32) -> Self {
        Self {
            loops,
            ..Self::default()
        }
    }

    /// Sets the number of repetitions.
    pub fn loops(mut self, loops: u32) -> Self {
        self.loops = loops;
        self
    }

    /// Selects the plate.
    pub fn plate(mut self, plate_index: u32) -> Self {
        self.plate_index = plate_index;
        self
    }

    /// Forces the bed temperature.
    pub fn bed_hold(mut self, celsius: f64) -> Self {
        self.bed_hold_c = Some(celsius);
        self
    }

    /// Sets the detach configuration.
    pub fn detach(mut self, detach: DetachConfig) -> Self {
        self.detach = detach;
        self
    }

    /// Sets the purge configuration.
    pub fn purge(mut self, purge: PurgeConfig) -> Self {
        self.purge = purge;
        self
    }

    /// Number of repetitions, at least 1.
    pub fn loop_count(&self) -> u32 {
        self.loops.max(1)
    }

    /// Plate index, at least 1.
    pub fn plate_index(&self) -> u32 {
        self.plate_index.max(1)
    }
}

/// Lines of the cooling step.
///
/// Temperatures and durations are floored and clamped at zero. A zero
/// dwell produces no lines.
pub fn cooling_lines(mode: &CoolingMode) -> Vec<String> {
    let whole = |value: f64| value.floor().max(0.0) as u64;
    match *mode {
        CoolingMode::WaitForBed { max_temp_c } => {
            let t = whole(max_temp_c);
            vec![
                format!("; --- cooling: wait until bed <= {t}C ---"),
                format!("M190 R{t}"),
                "; --- end cooling ---".to_string(),
            ]
        }
        CoolingMode::Dwell { seconds } => match whole(seconds) {
            0 => Vec::new(),
            s => vec![
                format!("; --- cooling: dwell {s}s ---"),
                format!("G4 S{s}"),
                "; --- end cooling ---".to_string(),
            ],
        },
    }
}

/// Rewrites every `M140 S<n>` / `M190 S<n>` to the hold temperature.
///
/// Returns the input unchanged when `hold_c` is absent or not positive.
///
/// ```rust
/// use plateloop::gcode::adjust_bed_hold;
///
/// let text = "M140 S55\nM190 S55\nM104 S220\n";
/// assert_eq!(adjust_bed_hold(text, Some(64.6)), "M140 S65\nM190 S65\nM104 S220\n");
/// assert_eq!(adjust_bed_hold(text, None), text);
/// ```
pub fn adjust_bed_hold(text: &str, hold_c: Option<f64>) -> Cow<'_, str> {
    match hold_c {
        Some(hold) if hold > 0.0 => {
            let target = (hold + 0.5).floor() as i64;
            markers::BED_TEMPERATURE.replace_all(text, format!("${{1}}{target}"))
        }
        _ => Cow::Borrowed(text),
    }
}

/// Builds the looped instruction text.
///
/// The document prefix (preamble, header and config) is emitted once.
/// Each repetition then emits a `; ===== LOOP i / N =====` banner, the
/// purge-stripped `body`, the cooling step, the detach sequence and,
/// when configured, `G28 X Y`. The detach sequence follows every
/// repetition, including the last. New lines use the document's line
/// ending and every line is terminated.
pub fn assemble(document: &InstructionDocument<'_>, body: &[&str], plan: &LoopPlan) -> String {
    let eol = document.line_ending();
    let loops = plan.loop_count();
    let cooling = cooling_lines(&plan.detach.cooling);
    let detach = build_detach_sequence(&plan.detach);

    let prefix = document.prefix();
    let per_loop = body.len() + cooling.len() + detach.len() + 3;
    let mut lines: Vec<Cow<'_, str>> = Vec::with_capacity(per_loop * loops as usize);

    for i in 1..=loops {
        lines.push(Cow::Owned(format!("; ===== LOOP {i} / {loops} =====")));
        lines.extend(body.iter().map(|line| Cow::Borrowed(*line)));
        lines.extend(cooling.iter().map(|line| Cow::Borrowed(line.as_str())));
        lines.extend(detach.iter().map(|line| Cow::Borrowed(line.as_str())));
        if plan.detach.home_between {
            lines.push(Cow::Borrowed("; --- home XY ---"));
            lines.push(Cow::Borrowed("G28 X Y"));
        }
    }

    log::debug!(
        "assembled {} loops of {} body lines ({} detach lines each)",
        loops,
        body.len(),
        detach.len()
    );

    let mut out = String::with_capacity(prefix.len() + lines.len() * 16);
    out.push_str(prefix);
    if !prefix.is_empty() && !prefix.ends_with('\n') {
        out.push_str(eol.as_str());
    }
    out.push_str(&eol.join(&lines));
    out
}
