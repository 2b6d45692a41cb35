//! Generation of the part-detach motion sequence.
//!
//! Between repetitions the printer flexes the build plate by bouncing the
//! bed between two Z heights, then sweeps the nozzle across the plate in
//! Y strokes to push the finished part off. The sequence is a pure function
//! of [`DetachConfig`]; out-of-range values are clamped, never rejected.
//!
//! Layout of the generated block:
//!
//! ```text
//! ; === DETACH_SEQUENCE_START ===
//! G91 / G0 Z5 F6000 / G90          safety lift (optional)
//! ; --- bend plate ...              2 x cycles Z moves
//! G1 Z<sweep> F10000                sweep height
//! ; --- sweeps ---                  fan, centering stroke, raster passes
//! M106 S0 / lift                    fan off, safety lift
//! ; === DETACH_SEQUENCE_END ===
//! ```

/// Highest Z the machine can reach, in millimetres.
pub const MACHINE_Z_MAX: f64 = 235.0;
/// Highest X the toolhead can reach, in millimetres.
pub const MACHINE_X_MAX: f64 = 256.0;
/// Lowest X column swept.
pub const SWEEP_X_FLOOR: f64 = 30.0;
/// Lowest feed rate emitted, in mm/min.
pub const MIN_FEED: f64 = 100.0;
/// Feed rate of travel moves between sweep columns.
pub const TRAVEL_FEED: u32 = 12000;
/// Feed rate of the safety lift.
pub const LIFT_FEED: u32 = 6000;
/// Feed rate of the move to sweep height.
pub const SWEEP_Z_FEED: u32 = 10000;
/// Y coordinate of the front edge of every stroke.
pub const SWEEP_Y_FRONT: f64 = 0.0;
/// Height of the relative safety lift, in millimetres.
pub const SAFE_LIFT_MM: f64 = 5.0;

const MIN_Y_EXTENT: f64 = 10.0;

/// First line of every generated detach block.
pub const SEQUENCE_START: &str = "; === DETACH_SEQUENCE_START ===";
/// Last line of every generated detach block.
pub const SEQUENCE_END: &str = "; === DETACH_SEQUENCE_END ===";

/// How the printer waits for the part to cool before detaching it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoolingMode {
    /// Block until the bed has cooled to `max_temp_c` (`M190 R<t>`).
    WaitForBed {
        /// Target bed temperature in degrees Celsius.
        max_temp_c: f64,
    },
    /// Dwell for a fixed time (`G4 S<s>`). Zero emits nothing.
    Dwell {
        /// Dwell duration in seconds.
        seconds: f64,
    },
}

impl Default for CoolingMode {
    fn default() -> Self {
        CoolingMode::WaitForBed { max_temp_c: 30.0 }
    }
}

/// Parameters of the detach sequence.
///
/// Defaults match a 256 mm class bed with a 235 mm Z travel.
///
/// # Example
///
/// ```rust
/// use plateloop::gcode::{CoolingMode, DetachConfig, build_detach_sequence};
///
/// let config = DetachConfig::default()
///     .fan_on(false)
///     .slow_sweeps(2, 3000.0)
///     .cooling(CoolingMode::Dwell { seconds: 600.0 });
/// let lines = build_detach_sequence(&config);
/// assert_eq!(lines.first().map(String::as_str), Some("; === DETACH_SEQUENCE_START ==="));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DetachConfig {
    /// Signed adjustment added to the sweep height.
    pub z_offset_mm: f64,
    /// Run the part-cooling fan while sweeping.
    pub fan_on: bool,
    /// Home X and Y after each detach sequence.
    pub home_between: bool,
    /// Lift Z before and after the sequence.
    pub safe_lift: bool,
    /// Cooling step emitted before the sequence.
    pub cooling: CoolingMode,
    /// Number of slow raster passes.
    pub sweeps_slow: u32,
    /// Number of fast raster passes.
    pub sweeps_fast: u32,
    /// Stroke feed of slow passes and of the centering stroke.
    pub sweep_feed_slow: f64,
    /// Stroke feed of fast passes.
    pub sweep_feed_fast: f64,
    /// Distance between sweep columns.
    pub sweep_step_x: f64,
    /// Y coordinate of the back edge of every stroke.
    pub sweep_y_max: f64,
    /// First sweep column.
    pub sweep_x_min: f64,
    /// Last sweep column.
    pub sweep_x_max: f64,
    /// Base Z height while sweeping.
    pub sweep_z: f64,
    /// Upper Z of the bending phase.
    pub bend_top_z: f64,
    /// Lower Z of the bending phase.
    pub bend_bottom_z: f64,
    /// Number of bottom/top bend cycles.
    pub bend_cycles: u32,
    /// Feed rate of bend moves.
    pub bend_feed: f64,
}

impl Default for DetachConfig {
    fn default() -> Self {
        Self {
            z_offset_mm: 0.0,
            fan_on: true,
            home_between: false,
            safe_lift: true,
            cooling: CoolingMode::default(),
            sweeps_slow: 0,
            sweeps_fast: 0,
            sweep_feed_slow: 3000.0,
            sweep_feed_fast: 12000.0,
            sweep_step_x: 30.0,
            sweep_y_max: 250.0,
            sweep_x_min: 0.0,
            sweep_x_max: 220.0,
            sweep_z: 2.0,
            bend_top_z: 235.0,
            bend_bottom_z: 200.0,
            bend_cycles: 6,
            bend_feed: 12000.0,
        }
    }
}

impl DetachConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep height adjustment.
    pub fn z_offset(mut self, mm: f64) -> Self {
        self.z_offset_mm = mm;
        self
    }

    /// Enables or disables the fan during sweeps.
    pub fn fan_on(mut self, on: bool) -> Self {
        self.fan_on = on;
        self
    }

    /// Enables or disables homing X/Y after each detach.
    pub fn home_between(mut self, home: bool) -> Self {
        self.home_between = home;
        self
    }

    /// Enables or disables the safety lift.
    pub fn safe_lift(mut self, lift: bool) -> Self {
        self.safe_lift = lift;
        self
    }

    /// Sets the cooling step.
    pub fn cooling(mut self, cooling: CoolingMode) -> Self {
        self.cooling = cooling;
        self
    }

    /// Sets the number and feed of slow passes.
    pub fn slow_sweeps(mut self, passes: u32, feed: f64) -> Self {
        self.sweeps_slow = passes;
        self.sweep_feed_slow = feed;
        self
    }

    /// Sets the number and feed of fast passes.
    pub fn fast_sweeps(mut self, passes: u32, feed: f64) -> Self {
        self.sweeps_fast = passes;
        self.sweep_feed_fast = feed;
        self
    }

    /// Sets the X range and column step.
    pub fn sweep_x(mut self, min: f64, max: f64, step: f64) -> Self {
        self.sweep_x_min = min;
        self.sweep_x_max = max;
        self.sweep_step_x = step;
        self
    }

    /// Sets the back edge of the strokes.
    pub fn sweep_y_max(mut self, y: f64) -> Self {
        self.sweep_y_max = y;
        self
    }

    /// Sets the base sweep height.
    pub fn sweep_z(mut self, z: f64) -> Self {
        self.sweep_z = z;
        self
    }

    /// Sets the bending phase.
    pub fn bend(mut self, bottom_z: f64, top_z: f64, cycles: u32, feed: f64) -> Self {
        self.bend_bottom_z = bottom_z;
        self.bend_top_z = top_z;
        self.bend_cycles = cycles;
        self.bend_feed = feed;
        self
    }

    /// Sweep height after applying the offset and machine limits.
    pub fn effective_sweep_z(&self) -> f64 {
        clamp_z(self.sweep_z + self.z_offset_mm)
    }
}

/// Rounds to three decimals, halves upward.
fn round3(value: f64) -> f64 {
    (value * 1000.0 + 0.5).floor() / 1000.0
}

fn clamp_z(z: f64) -> f64 {
    if z.is_nan() {
        return 0.0;
    }
    z.clamp(0.0, MACHINE_Z_MAX)
}

fn feed(value: f64) -> u64 {
    value.floor().max(MIN_FEED) as u64
}

/// Formats a coordinate with at most three decimals and no trailing zeros.
///
/// Non-finite values and negative zero print as `0`.
///
/// ```rust
/// use plateloop::gcode::format_number;
///
/// assert_eq!(format_number(2.0), "2");
/// assert_eq!(format_number(12.3456), "12.346");
/// assert_eq!(format_number(f64::NAN), "0");
/// ```
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = round3(value);
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let text = format!("{rounded:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Builds the X columns visited by one raster pass.
///
/// Columns start at the lower bound and advance by `step` (floored, at
/// least 1). The upper bound is always the last column, even when the step
/// does not land on it. Both bounds are clamped to `0..=`[`MACHINE_X_MAX`].
///
/// ```rust
/// use plateloop::gcode::sweep_columns;
///
/// assert_eq!(sweep_columns(0.0, 100.0, 30.0), [0.0, 30.0, 60.0, 90.0, 100.0]);
/// ```
pub fn sweep_columns(x_min: f64, x_max: f64, step: f64) -> Vec<f64> {
    let (lo, hi) = (x_min.min(x_max), x_min.max(x_max));
    if !(lo.is_finite() && hi.is_finite()) {
        return Vec::new();
    }
    let (lo, hi) = (clamp_x(lo), clamp_x(hi));
    let step = step.floor().max(1.0);

    let mut columns = Vec::new();
    let mut x = lo;
    while x <= hi - 0.001 {
        columns.push(round3(x.min(hi)));
        let next = x + step;
        if next <= x {
            break;
        }
        x = next;
    }
    if columns.last().is_none_or(|last| *last < hi - 0.001) {
        columns.push(round3(hi));
    }
    columns
}

fn clamp_x(x: f64) -> f64 {
    x.clamp(0.0, MACHINE_X_MAX)
}

fn push_lift(lines: &mut Vec<String>) {
    lines.extend([
        "G91".to_string(),
        format!("G0 Z{} F{LIFT_FEED}", format_number(SAFE_LIFT_MM)),
        "G90".to_string(),
    ]);
}

fn push_pass(lines: &mut Vec<String>, columns: &[f64], y_max: &str, stroke_feed: u64) {
    let front = format_number(SWEEP_Y_FRONT);
    for x in columns {
        lines.push(format!("G1 X{} Y{y_max} F{TRAVEL_FEED}", format_number(*x)));
        lines.push(format!("G1 Y{front} F{stroke_feed}"));
        lines.push(format!("G1 Y{y_max} F{stroke_feed}"));
    }
}

/// Generates the detach sequence for `config`.
///
/// The bending phase contains exactly `2 * bend_cycles` Z moves. Feed rates
/// are floored at [`MIN_FEED`], Z heights are clamped to
/// `0..=`[`MACHINE_Z_MAX`], X columns stay within
/// [`SWEEP_X_FLOOR`]`..=`[`MACHINE_X_MAX`].
pub fn build_detach_sequence(config: &DetachConfig) -> Vec<String> {
    let x_min = clamp_x(SWEEP_X_FLOOR.max(config.sweep_x_min.min(config.sweep_x_max)));
    let x_max = clamp_x(SWEEP_X_FLOOR.max(config.sweep_x_min.max(config.sweep_x_max)));
    let y_max = format_number((SWEEP_Y_FRONT + MIN_Y_EXTENT).max(config.sweep_y_max));
    let front = format_number(SWEEP_Y_FRONT);
    let columns = sweep_columns(x_min, x_max, config.sweep_step_x);

    let bottom = format_number(clamp_z(config.bend_bottom_z));
    let top = format_number(clamp_z(config.bend_top_z));
    let bend_feed = feed(config.bend_feed);
    let slow_feed = feed(config.sweep_feed_slow);

    let mut lines = vec![SEQUENCE_START.to_string()];
    if config.safe_lift {
        push_lift(&mut lines);
    }

    lines.push(format!(
        "; --- bend plate {}x between Z{bottom} and Z{top} ---",
        config.bend_cycles
    ));
    lines.push("G90".to_string());
    for _ in 0..config.bend_cycles {
        lines.push(format!("G1 Z{bottom} F{bend_feed}"));
        lines.push(format!("G1 Z{top} F{bend_feed}"));
    }

    let eff = config.effective_sweep_z();
    lines.push(format!(
        "; sweepZ={} zOffsetMm={} effSweepZ={}",
        format_number(config.sweep_z),
        format_number(config.z_offset_mm),
        format_number(eff)
    ));
    lines.push("M400".to_string());
    lines.push("G90".to_string());
    lines.push(format!("G1 Z{} F{SWEEP_Z_FEED}", format_number(eff)));

    lines.push("; --- sweeps ---".to_string());
    lines.push(if config.fan_on { "M106 S255" } else { "M106 S0" }.to_string());

    let mid = format_number((x_min + x_max) / 2.0);
    lines.push(format!("G1 X{mid} Y{y_max} F{TRAVEL_FEED}"));
    lines.push(format!("G1 Y{front} F{slow_feed}"));
    lines.push(format!("G1 Y{y_max} F{slow_feed}"));

    let passes = [
        ("slow", config.sweeps_slow, config.sweep_feed_slow),
        ("fast", config.sweeps_fast, config.sweep_feed_fast),
    ];
    for (label, count, pass_feed) in passes {
        if count == 0 {
            continue;
        }
        lines.push(format!(
            "; {label} sweeps x{count} @ F{}",
            format_number(pass_feed)
        ));
        for _ in 0..count {
            push_pass(&mut lines, &columns, &y_max, feed(pass_feed));
        }
    }

    if config.fan_on {
        lines.push("M106 S0".to_string());
    }
    if config.safe_lift {
        push_lift(&mut lines);
    }
    lines.push(SEQUENCE_END.to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(lines: &[String], needle: &str) -> usize {
        lines.iter().filter(|l| l.as_str() == needle).count()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1234), "0.123");
        assert_eq!(format_number(0.0005), "0.001");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(-1.25), "-1.25");
        assert_eq!(format_number(1234.5678), "1234.568");
        assert_eq!(format_number(f64::NAN), "0");
        assert_eq!(format_number(f64::INFINITY), "0");
    }

    #[test]
    fn test_sweep_columns() {
        assert_eq!(sweep_columns(0.0, 100.0, 30.0), [0.0, 30.0, 60.0, 90.0, 100.0]);
        assert_eq!(sweep_columns(0.0, 90.0, 30.0), [0.0, 30.0, 60.0, 90.0]);
        assert_eq!(sweep_columns(100.0, 0.0, 30.0), [0.0, 30.0, 60.0, 90.0, 100.0]);
        assert_eq!(sweep_columns(0.0, 2.0, 0.4), [0.0, 1.0, 2.0]);
        assert_eq!(sweep_columns(50.0, 50.0, 30.0), [50.0]);
        assert!(sweep_columns(0.0, f64::INFINITY, 30.0).is_empty());
    }

    #[test]
    fn test_sweep_columns_bounded_by_machine_x() {
        let columns = sweep_columns(0.0, 1e9, 30.0);
        assert_eq!(columns.len(), 10);
        assert_eq!(columns.last(), Some(&MACHINE_X_MAX));

        let fine = sweep_columns(0.0, 1e300, 1e-300);
        assert_eq!(fine.len(), 257);
        assert_eq!(sweep_columns(-50.0, -10.0, 30.0), [0.0]);

        let config = DetachConfig::default()
            .sweep_x(0.0, 1e12, 30.0)
            .slow_sweeps(1, 3000.0);
        let lines = build_detach_sequence(&config);
        assert!(lines.len() < 100);
        assert!(lines.iter().any(|l| l.starts_with("G1 X256 ")));
        assert!(lines.iter().any(|l| l.starts_with("G1 X143 ")));
    }

    #[test]
    fn test_default_sequence() {
        let lines = build_detach_sequence(&DetachConfig::default());
        assert_eq!(lines.first().unwrap(), SEQUENCE_START);
        assert_eq!(lines.last().unwrap(), SEQUENCE_END);
        assert_eq!(&lines[1..4], ["G91", "G0 Z5 F6000", "G90"]);
        assert_eq!(lines[4], "; --- bend plate 6x between Z200 and Z235 ---");
        assert_eq!(count(&lines, "G1 Z200 F12000"), 6);
        assert_eq!(count(&lines, "G1 Z235 F12000"), 6);
        assert!(lines.contains(&"; sweepZ=2 zOffsetMm=0 effSweepZ=2".to_string()));
        assert!(lines.contains(&"G1 Z2 F10000".to_string()));
        assert_eq!(count(&lines, "M106 S255"), 1);
        assert_eq!(count(&lines, "M106 S0"), 1);
        assert!(lines.contains(&"G1 X125 Y250 F12000".to_string()));
        assert!(lines.contains(&"G1 Y0 F3000".to_string()));
        assert_eq!(count(&lines, "G91"), 2);
    }

    #[test]
    fn test_bend_phase_has_two_moves_per_cycle() {
        for cycles in [0, 1, 4] {
            let config = DetachConfig::default().bend(190.0, 230.0, cycles, 8000.0);
            let lines = build_detach_sequence(&config);
            let bends = lines.iter().filter(|l| l.starts_with("G1 Z") && l.ends_with("F8000"));
            assert_eq!(bends.count(), 2 * cycles as usize);
        }
    }

    #[test]
    fn test_raster_passes() {
        let config = DetachConfig::default()
            .slow_sweeps(2, 2500.0)
            .fast_sweeps(1, 9000.0);
        let lines = build_detach_sequence(&config);

        // 30, 60, ..., 210 and the forced 220.
        let columns = 8;
        let travels = lines
            .iter()
            .filter(|l| l.starts_with("G1 X") && l.ends_with("F12000"))
            .count();
        assert_eq!(travels, 1 + 3 * columns);
        assert!(lines.contains(&"; slow sweeps x2 @ F2500".to_string()));
        assert!(lines.contains(&"; fast sweeps x1 @ F9000".to_string()));
        assert_eq!(count(&lines, "G1 Y0 F2500"), 1 + 2 * columns);
        assert_eq!(count(&lines, "G1 Y0 F9000"), columns);
        assert!(lines.contains(&"G1 X220 Y250 F12000".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("G1 X0 ")));
    }

    #[test]
    fn test_clamping() {
        let config = DetachConfig::default()
            .z_offset(500.0)
            .bend(-5.0, 400.0, 1, 10.0)
            .sweep_y_max(3.0)
            .safe_lift(false)
            .fan_on(false);
        let lines = build_detach_sequence(&config);
        assert!(lines.contains(&"G1 Z235 F10000".to_string()));
        assert!(lines.contains(&"G1 Z0 F100".to_string()));
        assert!(lines.contains(&"G1 Z235 F100".to_string()));
        assert!(lines.contains(&"G1 X125 Y10 F12000".to_string()));
        assert!(!lines.contains(&"G91".to_string()));
        assert_eq!(count(&lines, "M106 S0"), 1);
        assert_eq!(count(&lines, "M106 S255"), 0);
    }

    #[test]
    fn test_negative_offset_lowers_sweep_height() {
        let config = DetachConfig::default().sweep_z(3.0).z_offset(-1.5);
        assert_eq!(config.effective_sweep_z(), 1.5);
        let config = DetachConfig::default().z_offset(-10.0);
        assert_eq!(config.effective_sweep_z(), 0.0);
    }
}
