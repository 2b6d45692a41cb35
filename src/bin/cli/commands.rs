//! Command implementations for the CLI tool.

use std::io::Write;
use std::path::{Path, PathBuf};

use plateloop::edit::instruction_path;
use plateloop::format::detect::is_archive;
use plateloop::gcode::{
    DetachConfig, LoopPlan, PurgeConfig, PurgeTrace, detect_defaults, split_blocks,
};
use plateloop::pipeline::{build_looped_archive, build_looped_text, output_file_name};
use plateloop::write::minimal_archive;
use plateloop::{Archive, Error, LineEnding, list_entries, text};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{BuildSummary, InspectSummary, RegionSizes, create_formatter};

/// Configuration for the build command.
pub struct BuildConfig<'a> {
    pub archive_path: &'a Path,
    pub output_path: Option<&'a Path>,
    pub gcode_out: Option<&'a Path>,
    pub loops: u32,
    pub plate: u32,
    pub bed_hold: Option<f64>,
    pub purge: PurgeConfig,
    pub detach: DetachConfig,
    pub format: OutputFormat,
}

/// Build command implementation
pub fn build(config: &BuildConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let original = match read_file(config.archive_path) {
        Ok(data) => data,
        Err(code) => return code,
    };

    let mut plan = LoopPlan::new(config.loops)
        .plate(config.plate)
        .detach(config.detach.clone())
        .purge(config.purge.clone());
    if let Some(celsius) = config.bed_hold {
        plan = plan.bed_hold(celsius);
    }

    let result = match build_looped_archive(&original, &plan) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    let output_path = config
        .output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(config.archive_path, plan.loop_count()));

    if let Err(code) = write_file(&output_path, &result.archive) {
        return code;
    }
    if let Some(gcode_path) = config.gcode_out {
        if let Err(code) = write_file(gcode_path, result.instruction_text.as_bytes()) {
            return code;
        }
    }

    let summary = BuildSummary {
        output: &output_path,
        loops: plan.loop_count(),
        plate: plan.plate_index(),
        result: &result,
    };
    print!("{}", formatter.format_build(&summary));
    ExitCode::Success
}

/// List command implementation
pub fn list(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let data = match read_file(archive_path) {
        Ok(data) => data,
        Err(code) => return code,
    };

    match list_entries(&data) {
        Ok(entries) => {
            print!("{}", formatter.format_list(&entries));
            ExitCode::Success
        }
        Err(e) => report_error(&e),
    }
}

/// Extract command implementation
pub fn extract(
    archive_path: &Path,
    plate: Option<u32>,
    output_path: Option<&Path>,
    format: OutputFormat,
) -> ExitCode {
    let formatter = create_formatter(format);

    let data = match read_file(archive_path) {
        Ok(data) => data,
        Err(code) => return code,
    };

    let bytes = match extract_instruction(&data, plate) {
        Ok(b) => b,
        Err(e) => return report_error(&e),
    };

    match output_path {
        Some(path) => {
            if let Err(code) = write_file(path, &bytes) {
                return code;
            }
            print!("{}", formatter.format_written(path, bytes.len()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&bytes).and_then(|()| stdout.flush()) {
                eprintln!("Error: {}", e);
                return ExitCode::IoError;
            }
        }
    }
    ExitCode::Success
}

/// Inspect command implementation
pub fn inspect(input: &Path, plate: u32, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let data = match read_file(input) {
        Ok(data) => data,
        Err(code) => return code,
    };

    let (source, gcode) = if is_archive(&data) {
        let archive = match Archive::parse(&data) {
            Ok(a) => a,
            Err(e) => return report_error(&e),
        };
        let entry = archive
            .find(&instruction_path(plate))
            .or_else(|| archive.entries().iter().find(|e| e.is_instruction_file()));
        let Some(entry) = entry else {
            return report_error(&Error::EntryNotFound {
                path: instruction_path(plate),
            });
        };
        match archive.extract(entry) {
            Ok(bytes) => (entry.name.clone(), bytes),
            Err(e) => return report_error(&e),
        }
    } else {
        (input.display().to_string(), data)
    };

    let gcode = String::from_utf8_lossy(&gcode);
    let regions = split_blocks(&gcode).ok().map(|doc| RegionSizes {
        preamble: text::lines(doc.preamble()).len(),
        header: text::lines(doc.header()).len(),
        config: text::lines(doc.config()).len(),
        body: doc.body_lines().len(),
    });
    let trace = build_looped_text(&gcode, &LoopPlan::new(1))
        .map(|looped| looped.trace)
        .unwrap_or_else(|_| PurgeTrace::new());

    let summary = InspectSummary {
        source: &source,
        lines: text::lines(&gcode).len(),
        line_ending: LineEnding::detect(&gcode),
        regions,
        defaults: detect_defaults(&gcode),
        trace: &trace,
    };
    print!("{}", formatter.format_inspect(&summary));
    ExitCode::Success
}

/// Wrap command implementation
pub fn wrap(
    gcode_path: &Path,
    output_path: Option<&Path>,
    plate: u32,
    format: OutputFormat,
) -> ExitCode {
    let formatter = create_formatter(format);

    let gcode = match read_file(gcode_path) {
        Ok(data) => data,
        Err(code) => return code,
    };
    if is_archive(&gcode) {
        eprintln!("Error: {} is already an archive", gcode_path.display());
        return ExitCode::BadArgs;
    }

    let archive = minimal_archive(plate, &gcode);
    let output_path = output_path.map(Path::to_path_buf).unwrap_or_else(|| {
        let mut name = gcode_path.as_os_str().to_owned();
        name.push(".3mf");
        PathBuf::from(name)
    });

    if let Err(code) = write_file(&output_path, &archive) {
        return code;
    }
    print!("{}", formatter.format_written(&output_path, archive.len()));
    ExitCode::Success
}

fn extract_instruction(data: &[u8], plate: Option<u32>) -> plateloop::Result<Vec<u8>> {
    let archive = Archive::parse(data)?;
    match plate {
        Some(index) => {
            let path = instruction_path(index);
            let entry = archive
                .find(&path)
                .ok_or_else(|| Error::EntryNotFound { path: path.clone() })?;
            archive.extract(entry)
        }
        None => Ok(archive.extract_first_instruction()?.text.into_bytes()),
    }
}

fn default_output_path(input: &Path, loops: u32) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(output_file_name(&name, loops))
}

fn read_file(path: &Path) -> Result<Vec<u8>, ExitCode> {
    std::fs::read(path).map_err(|e| {
        eprintln!("Error: cannot read {}: {}", path.display(), e);
        ExitCode::IoError
    })
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), ExitCode> {
    std::fs::write(path, data).map_err(|e| {
        eprintln!("Error: cannot write {}: {}", path.display(), e);
        ExitCode::IoError
    })
}

fn report_error(error: &Error) -> ExitCode {
    eprintln!("Error: {}", error);
    error_to_exit_code(error)
}
