//! Recovering loop settings from previously generated output.

use std::sync::LazyLock;

use regex::Regex;

use super::detach::{CoolingMode, DetachConfig};
use super::markers::pattern;

static LOOP_BANNER: LazyLock<Regex> = LazyLock::new(|| pattern(r"; ===== LOOP 1 / (\d+)"));
static FAN_FULL: LazyLock<Regex> = LazyLock::new(|| pattern(r"M106\s+S255"));
static HOME_XY: LazyLock<Regex> = LazyLock::new(|| pattern(r"G28\s+X\s*Y"));
static SAFE_LIFT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"G91\s*[\r\n]+G0\s+Z5\s+F6000[\r\n]+G90"));
static WAIT_FOR_BED: LazyLock<Regex> = LazyLock::new(|| pattern(r"M190\s+R(\d+)"));
static DWELL: LazyLock<Regex> = LazyLock::new(|| pattern(r"G4\s+S(\d+)"));

const DEFAULT_COOL_TEMP_C: u32 = 30;
const DEFAULT_COOL_SECONDS: u32 = 3600;

/// Settings detected in an instruction file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedDefaults {
    /// Loop count from the first loop banner, or 1.
    pub loops: u32,
    /// A full-speed fan command is present.
    pub fan_on: bool,
    /// An X/Y homing command is present.
    pub home_between: bool,
    /// The generated safety lift is present.
    pub safe_lift: bool,
    /// Wait-for-bed temperature, or 30.
    pub cool_temp_c: u32,
    /// Dwell duration, or 3600.
    pub cool_seconds: u32,
    /// A dwell was found and no wait-for-bed command.
    pub dwell_cooling: bool,
}

impl DetectedDefaults {
    /// Applies the detected settings on top of `base`.
    pub fn apply_to(&self, base: DetachConfig) -> DetachConfig {
        let cooling = if self.dwell_cooling {
            CoolingMode::Dwell {
                seconds: f64::from(self.cool_seconds),
            }
        } else {
            CoolingMode::WaitForBed {
                max_temp_c: f64::from(self.cool_temp_c),
            }
        };
        base.fan_on(self.fan_on)
            .home_between(self.home_between)
            .safe_lift(self.safe_lift)
            .cooling(cooling)
    }
}

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Detects loop settings in `text`.
///
/// Works on any instruction text; on files this crate did not generate
/// most fields fall back to their defaults.
///
/// ```rust
/// use plateloop::gcode::detect_defaults;
///
/// let found = detect_defaults("; ===== LOOP 1 / 4 =====\nM106 S255\nM190 R28\n");
/// assert_eq!(found.loops, 4);
/// assert!(found.fan_on);
/// assert_eq!(found.cool_temp_c, 28);
/// assert_eq!(found.cool_seconds, 3600);
/// ```
pub fn detect_defaults(text: &str) -> DetectedDefaults {
    let wait_temp = first_number(&WAIT_FOR_BED, text);
    let dwell = first_number(&DWELL, text);
    DetectedDefaults {
        loops: first_number(&LOOP_BANNER, text).unwrap_or(1),
        fan_on: FAN_FULL.is_match(text),
        home_between: HOME_XY.is_match(text),
        safe_lift: SAFE_LIFT.is_match(text),
        cool_temp_c: wait_temp.unwrap_or(DEFAULT_COOL_TEMP_C),
        cool_seconds: dwell.unwrap_or(DEFAULT_COOL_SECONDS),
        dwell_cooling: wait_temp.is_none() && dwell.is_some(),
    }
}
