//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;

use plateloop::gcode::{DetectedDefaults, PurgeTrace};
use plateloop::{ArchiveEntry, LineEnding, MergeResult};

/// Outcome of the build command
pub struct BuildSummary<'a> {
    pub output: &'a Path,
    pub loops: u32,
    pub plate: u32,
    pub result: &'a MergeResult,
}

/// Line counts of the instruction blocks
pub struct RegionSizes {
    pub preamble: usize,
    pub header: usize,
    pub config: usize,
    pub body: usize,
}

/// Outcome of the inspect command
pub struct InspectSummary<'a> {
    pub source: &'a str,
    pub lines: usize,
    pub line_ending: LineEnding,
    /// `None` when the block markers are missing
    pub regions: Option<RegionSizes>,
    pub defaults: DetectedDefaults,
    pub trace: &'a PurgeTrace,
}

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[ArchiveEntry]) -> String;

    /// Formats the result of a looped build
    fn format_build(&self, summary: &BuildSummary<'_>) -> String;

    /// Formats instruction text analysis
    fn format_inspect(&self, summary: &InspectSummary<'_>) -> String;

    /// Formats a written file
    fn format_written(&self, path: &Path, bytes: usize) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[ArchiveEntry]) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{:>12} {:>12} {:>8} {:>10} {}\n",
            "Size", "Packed", "Method", "CRC", "Name"
        ));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut total_packed: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            if entry.is_directory() {
                dir_count += 1;
            } else {
                file_count += 1;
                total_size += u64::from(entry.uncompressed_size);
                total_packed += u64::from(entry.compressed_size);
            }

            let type_indicator = if entry.is_directory() { "D" } else { "" };
            output.push_str(&format!(
                "{:>12} {:>12} {:>8} {:>10} {}{}\n",
                humanize_bytes(u64::from(entry.uncompressed_size)),
                humanize_bytes(u64::from(entry.compressed_size)),
                entry.method.name(),
                format!("{:08X}", entry.crc32),
                entry.name,
                type_indicator
            ));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{:>12} {:>12} {} files, {} directories\n",
            humanize_bytes(total_size),
            humanize_bytes(total_packed),
            file_count,
            dir_count
        ));

        output
    }

    fn format_build(&self, summary: &BuildSummary<'_>) -> String {
        let result = summary.result;
        let mut output = String::new();

        output.push_str(&format!("Output:      {}\n", summary.output.display()));
        output.push_str(&format!("Source:      {}\n", result.source_entry));
        output.push_str(&format!("Plate:       {}\n", summary.plate));
        output.push_str(&format!("Loops:       {}\n", summary.loops));
        output.push_str(&format!(
            "Size:        {}\n",
            humanize_bytes(result.archive.len() as u64)
        ));
        output.push_str(&format!(
            "Entries:     {} kept, {} updated, {} added\n",
            result.report.entries_kept, result.report.entries_updated, result.report.entries_added
        ));
        if let Some(method) = result.report.instruction_method {
            output.push_str(&format!("Method:      {}\n", method));
        }
        output.push_str(&format!("MD5:         {}\n", result.report.checksum));
        output.push('\n');
        output.push_str(&result.trace.summary());
        output.push('\n');

        output
    }

    fn format_inspect(&self, summary: &InspectSummary<'_>) -> String {
        let mut output = String::new();

        output.push_str(&format!("Source:        {}\n", summary.source));
        output.push_str(&format!(
            "Lines:         {} ({})\n",
            summary.lines,
            line_ending_name(summary.line_ending)
        ));

        match &summary.regions {
            Some(regions) => {
                output.push_str(&format!("Preamble:      {} lines\n", regions.preamble));
                output.push_str(&format!("Header block:  {} lines\n", regions.header));
                output.push_str(&format!("Config block:  {} lines\n", regions.config));
                output.push_str(&format!("Body:          {} lines\n", regions.body));
            }
            None => output.push_str("Blocks:        markers missing, cannot loop\n"),
        }

        let defaults = &summary.defaults;
        output.push('\n');
        output.push_str(&format!("Loops:         {}\n", defaults.loops));
        output.push_str(&format!("Fan:           {}\n", on_off(defaults.fan_on)));
        output.push_str(&format!("Home between:  {}\n", on_off(defaults.home_between)));
        output.push_str(&format!("Safe lift:     {}\n", on_off(defaults.safe_lift)));
        if defaults.dwell_cooling {
            output.push_str(&format!("Cooling:       dwell {} s\n", defaults.cool_seconds));
        } else {
            output.push_str(&format!(
                "Cooling:       wait for bed <= {} C\n",
                defaults.cool_temp_c
            ));
        }

        output.push('\n');
        output.push_str(&summary.trace.summary());
        output.push('\n');

        output
    }

    fn format_written(&self, path: &Path, bytes: usize) -> String {
        format!("Wrote {} ({})\n", path.display(), humanize_bytes(bytes as u64))
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[ArchiveEntry]) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "size": e.uncompressed_size,
                    "packed_size": e.compressed_size,
                    "method": e.method.name(),
                    "crc32": format!("{:08X}", e.crc32),
                    "is_directory": e.is_directory(),
                })
            })
            .collect();
        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_build(&self, summary: &BuildSummary<'_>) -> String {
        let result = summary.result;
        let obj = json!({
            "output": summary.output.display().to_string(),
            "source_entry": result.source_entry,
            "plate": summary.plate,
            "loops": summary.loops,
            "archive_size": result.archive.len(),
            "entries_kept": result.report.entries_kept,
            "entries_updated": result.report.entries_updated,
            "entries_added": result.report.entries_added,
            "instruction_method": result.report.instruction_method.map(|m| m.name()),
            "md5": result.report.checksum,
            "purge": trace_json(&result.trace),
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_inspect(&self, summary: &InspectSummary<'_>) -> String {
        let regions = summary.regions.as_ref().map(|r| {
            json!({
                "preamble": r.preamble,
                "header": r.header,
                "config": r.config,
                "body": r.body,
            })
        });
        let defaults = &summary.defaults;
        let obj = json!({
            "source": summary.source,
            "lines": summary.lines,
            "line_ending": line_ending_name(summary.line_ending),
            "regions": regions,
            "defaults": {
                "loops": defaults.loops,
                "fan_on": defaults.fan_on,
                "home_between": defaults.home_between,
                "safe_lift": defaults.safe_lift,
                "cool_temp_c": defaults.cool_temp_c,
                "cool_seconds": defaults.cool_seconds,
                "dwell_cooling": defaults.dwell_cooling,
            },
            "purge": trace_json(summary.trace),
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_written(&self, path: &Path, bytes: usize) -> String {
        let obj = json!({
            "output": path.display().to_string(),
            "bytes": bytes,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

fn trace_json(trace: &PurgeTrace) -> serde_json::Value {
    let removals: Vec<_> = trace
        .removals()
        .iter()
        .map(|r| {
            json!({
                "stage": r.stage.name(),
                "first_line": r.lines.start,
                "line_count": r.len(),
                "detail": r.detail,
            })
        })
        .collect();
    json!({
        "total_lines": trace.total_lines(),
        "removals": removals,
    })
}

fn line_ending_name(eol: LineEnding) -> &'static str {
    match eol {
        LineEnding::Lf => "LF",
        LineEnding::CrLf => "CRLF",
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Creates a formatter based on the output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to human-readable format
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(1023), "1023 B");
        assert_eq!(humanize_bytes(1536), "1.5 KiB");
        assert_eq!(humanize_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_json_written() {
        let out = JsonFormatter.format_written(Path::new("a.gcode.3mf"), 42);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["bytes"], 42);
    }
}
