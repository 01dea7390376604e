//! imgstack: stack images into one composite, or crop them around
//! detected objects, then save the result or a zip of results.
//!
//! # Usage
//!
//! ```text
//! imgstack stack a.png b.png --mode grid --border 4 -o out.png
//! imgstack stack *.jpg --resize 640x480 --group 2 -o pairs.zip
//! imgstack crop shots/*.jpg --detections boxes.json --spacing 8 -o crops.zip
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::HashMap;
use std::error::Error;
use std::ffi::OsStr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use imgstack_export::{
    ArchiveEntry, DEFAULT_ARCHIVE_NAME, DEFAULT_IMAGE_NAME, OutputFormat, encode, output_name,
};
use imgstack_pipeline::annotate::DEFAULT_ANNOTATION_COLOR;
use imgstack_pipeline::{
    BatchOptions, Color, CropOptions, Detection, Dimensions, ItemFailure, LayoutSpec,
    PipelineError, PrecomputedDetector, RasterImage, ResizeFilter, SourceImage, StackMode,
    StackOutcome, annotate_detections, compose_groups, decode, decode_batch, detect_and_stack,
    run_batch, stack,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Stack images side by side, on top of each other, or in a grid.
#[derive(Parser)]
#[command(name = "imgstack", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Combine all inputs into one composite.
    Stack(StackArgs),
    /// Crop each input around its detections and place the two crops side by side.
    Crop(CropArgs),
}

#[derive(Args)]
struct StackArgs {
    /// Input images (PNG, JPEG, BMP, WebP).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Compose every N consecutive inputs into a separate output.
    #[arg(long, value_name = "N")]
    group: Option<NonZeroUsize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct CropArgs {
    /// Input images (PNG, JPEG, BMP, WebP).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON file mapping each input to its detections.
    ///
    /// Keys are input paths exactly as given on the command line. A bare
    /// file name also matches, as long as no other input shares it.
    ///
    /// Example: `{"shots/cat.jpg": [{"bbox": {"x_min": 4, "y_min": 8, "x_max": 60,
    /// "y_max": 90}, "label": "cat", "confidence": 0.91}]}`
    #[arg(long, value_name = "JSON")]
    detections: PathBuf,

    /// Ignore detections below this confidence (0 to 1).
    #[arg(
        long,
        default_value_t = CropOptions::DEFAULT_MIN_CONFIDENCE,
        value_parser = parse_confidence
    )]
    min_confidence: f32,

    /// Margin kept around the detections on the outer side of each crop.
    #[arg(long, default_value_t = 0)]
    border: u32,

    /// Margin kept around the detections on the inner side of each crop.
    #[arg(long, default_value_t = 0)]
    spacing: u32,

    /// Also write each source image with its detections outlined.
    #[arg(long)]
    annotate: bool,

    /// Full layout config for the crop composite as a JSON string.
    ///
    /// The mode is always horizontal.
    #[arg(long)]
    config_json: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct LayoutArgs {
    /// Arrangement of the images.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_MODE)]
    mode: Mode,

    /// Resize every input to exactly `WIDTHxHEIGHT` before stacking.
    #[arg(long, value_name = "WxH", value_parser = parse_dimensions)]
    resize: Option<Dimensions>,

    /// Resampling filter used with --resize.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    filter: Filter,

    /// Border around every input, in pixels.
    #[arg(long, default_value_t = LayoutSpec::DEFAULT_BORDER_SIZE)]
    border: u32,

    /// Border color: a name (black, white), #rrggbb, or r,g,b.
    #[arg(long, default_value_t = Color::BLACK)]
    border_fill: Color,

    /// Gap between adjacent images, in pixels.
    #[arg(long, default_value_t = LayoutSpec::DEFAULT_SPACING)]
    spacing: u32,

    /// Fill for gaps and uncovered canvas.
    #[arg(long, default_value_t = Color::BLACK)]
    background: Color,

    /// Images per row in grid mode.
    #[arg(
        long,
        default_value_t = LayoutSpec::DEFAULT_GRID_COLUMNS,
        value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..)
    )]
    columns: u32,

    /// Require the image count to fill every grid row.
    #[arg(long)]
    strict_grid: bool,

    /// Full layout config as a JSON string.
    ///
    /// When provided, all other layout flags are ignored.
    /// The JSON must be a valid `LayoutSpec` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output path. A `.zip` path stores every result in one archive.
    ///
    /// An existing directory receives a single result under its own name,
    /// or several results as `processed_images.zip`.
    #[arg(short, long)]
    output: PathBuf,

    /// Encoding of the output images. Defaults to the output extension,
    /// or PNG inside archives.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// JPEG quality (1-100).
    #[arg(
        long,
        default_value_t = OutputFormat::DEFAULT_JPEG_QUALITY,
        value_parser = clap::builder::RangedU64ValueParser::<u8>::new().range(1..=100)
    )]
    quality: u8,

    /// Number of worker threads. Defaults to one per core.
    #[arg(long)]
    workers: Option<NonZeroUsize>,
}

/// Stacking mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Rows of --columns images.
    Grid,
}

/// Resize filter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation.
    Triangle,
    /// Bicubic Catmull-Rom.
    CatmullRom,
    /// Gaussian (smooth).
    Gaussian,
    /// Lanczos with 3 lobes (sharpest).
    Lanczos3,
}

/// Output encoding selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Lossless PNG.
    Png,
    /// JPEG at --quality.
    Jpeg,
}

const fn mode_from_pipeline(mode: StackMode) -> Mode {
    match mode {
        StackMode::Horizontal => Mode::Horizontal,
        StackMode::Vertical => Mode::Vertical,
        StackMode::Grid => Mode::Grid,
    }
}

const fn filter_from_pipeline(filter: ResizeFilter) -> Filter {
    match filter {
        ResizeFilter::Nearest => Filter::Nearest,
        ResizeFilter::Triangle => Filter::Triangle,
        ResizeFilter::CatmullRom => Filter::CatmullRom,
        ResizeFilter::Gaussian => Filter::Gaussian,
        ResizeFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// The CLI default mode, derived from [`LayoutSpec::DEFAULT_MODE`].
const CLI_DEFAULT_MODE: Mode = mode_from_pipeline(LayoutSpec::DEFAULT_MODE);

/// The CLI default filter, derived from [`LayoutSpec::DEFAULT_RESIZE_FILTER`].
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(LayoutSpec::DEFAULT_RESIZE_FILTER);

/// Parse `WIDTHxHEIGHT`, e.g. `640x480`.
fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must be 'WIDTHxHEIGHT', got: '{s}'"))?;
    let parse = |part: &str| -> Result<u32, String> {
        let value: u32 = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid size '{part}': {e}"))?;
        if value == 0 {
            return Err(format!("size must be positive, got: '{s}'"));
        }
        Ok(value)
    };
    Ok(Dimensions::new(parse(w)?, parse(h)?))
}

/// Parse a confidence threshold in `0.0..=1.0`.
fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid confidence '{s}': {e}"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("confidence must be between 0 and 1, got: '{s}'"));
    }
    Ok(value)
}

/// Build a [`LayoutSpec`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual layout flags are ignored.
fn layout_from_cli(args: &LayoutArgs) -> Result<LayoutSpec, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(LayoutSpec {
        mode: match args.mode {
            Mode::Horizontal => StackMode::Horizontal,
            Mode::Vertical => StackMode::Vertical,
            Mode::Grid => StackMode::Grid,
        },
        resize: args.resize,
        resize_filter: match args.filter {
            Filter::Nearest => ResizeFilter::Nearest,
            Filter::Triangle => ResizeFilter::Triangle,
            Filter::CatmullRom => ResizeFilter::CatmullRom,
            Filter::Gaussian => ResizeFilter::Gaussian,
            Filter::Lanczos3 => ResizeFilter::Lanczos3,
        },
        border_size: args.border,
        border_fill: args.border_fill,
        spacing: args.spacing,
        background: args.background,
        grid_columns: args.columns,
        strict_grid: args.strict_grid,
    })
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

/// Resolve the output encoding: explicit flag, then output extension,
/// then PNG.
fn output_format(args: &OutputArgs) -> OutputFormat {
    match args.format {
        Some(Format::Png) => OutputFormat::Png,
        Some(Format::Jpeg) => OutputFormat::Jpeg {
            quality: args.quality,
        },
        None => match args
            .output
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
        {
            Some(OutputFormat::Jpeg { .. }) => OutputFormat::Jpeg {
                quality: args.quality,
            },
            _ => OutputFormat::Png,
        },
    }
}

/// Read every input file into a source named after its path as given.
/// Unreadable files abort.
fn read_sources(paths: &[PathBuf]) -> CliResult<Vec<SourceImage>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
            Ok(SourceImage::new(path.display().to_string(), bytes))
        })
        .collect()
}

/// Match the detections table to the inputs.
///
/// An input takes the entry keyed by its exact path. Failing that, it
/// takes the entry keyed by its file name, unless another input has the
/// same file name. Inputs with no entry get no detections.
fn detections_for_inputs(
    inputs: &[PathBuf],
    table: &HashMap<String, Vec<Detection>>,
) -> HashMap<String, Vec<Detection>> {
    let mut name_counts: HashMap<&OsStr, usize> = HashMap::new();
    for path in inputs {
        if let Some(file_name) = path.file_name() {
            *name_counts.entry(file_name).or_default() += 1;
        }
    }

    let mut resolved = HashMap::with_capacity(inputs.len());
    for path in inputs {
        let key = path.display().to_string();
        let by_path = table.get(&key);
        let by_file_name = || {
            let file_name = path.file_name()?;
            let entry = table.get(file_name.to_str()?)?;
            if name_counts.get(file_name).copied().unwrap_or(0) > 1 {
                tracing::warn!(
                    input = %key,
                    "detections keyed by a shared file name are ignored; key by path instead",
                );
                return None;
            }
            Some(entry)
        };
        let detections = by_path.or_else(by_file_name).cloned().unwrap_or_default();
        resolved.insert(key, detections);
    }
    resolved
}

fn report_failures(failures: &[ItemFailure]) {
    for failure in failures {
        eprintln!("Skipping {}: {}", failure.name, failure.error);
    }
}

/// Pick the file to write: `output` itself, or a default name inside it
/// when it is an existing directory.
fn output_path(output: &Path, entries: &[ArchiveEntry]) -> PathBuf {
    if !output.is_dir() {
        return output.to_path_buf();
    }
    match entries {
        [only] => output.join(&only.name),
        _ => output.join(DEFAULT_ARCHIVE_NAME),
    }
}

/// Write the results to `output`: an archive for `.zip` paths,
/// otherwise exactly one image file.
fn write_outputs(entries: Vec<ArchiveEntry>, output: &Path) -> CliResult<()> {
    let output = output_path(output, &entries);
    let bytes = if is_zip(&output) {
        let names = imgstack_export::unique_names(entries.iter().map(|e| e.name.as_str()));
        let entries: Vec<ArchiveEntry> = entries
            .into_iter()
            .zip(names)
            .map(|(entry, name)| ArchiveEntry::new(name, entry.bytes))
            .collect();
        imgstack_export::to_zip(&entries)?
    } else {
        let count = entries.len();
        let mut entries = entries.into_iter();
        match (entries.next(), entries.next()) {
            (Some(only), None) => only.bytes,
            _ => {
                return Err(format!(
                    "{count} images produced; use a .zip output path to save them all"
                )
                .into());
            }
        }
    };

    std::fs::write(&output, &bytes)
        .map_err(|e| format!("Error writing {}: {e}", output.display()))?;
    eprintln!("Wrote {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn encode_entry(
    name: String,
    image: &RasterImage,
    format: OutputFormat,
) -> CliResult<ArchiveEntry> {
    let bytes = encode(image, format).map_err(|e| format!("Error encoding {name}: {e}"))?;
    Ok(ArchiveEntry::new(name, bytes))
}

/// Compose every `group_size` consecutive sources into their own output.
fn stack_groups(
    sources: &[SourceImage],
    group_size: NonZeroUsize,
    spec: &LayoutSpec,
    options: BatchOptions,
    format: OutputFormat,
) -> CliResult<Vec<ArchiveEntry>> {
    let outcome = decode_batch(sources, options)?;
    report_failures(&outcome.failures);
    // Skipped inputs would shift every later pairing.
    if !outcome.is_complete() {
        return Err("--group requires every input to decode".into());
    }

    let first_names: Vec<&str> = sources
        .iter()
        .step_by(group_size.get())
        .map(|s| s.name.as_str())
        .collect();
    let composites = compose_groups(&outcome.into_values(), group_size.get(), spec)?;
    composites
        .iter()
        .zip(first_names)
        .map(|(image, name)| {
            let name = output_name(name, "_stacked", format);
            encode_entry(name, image, format)
        })
        .collect()
}

fn run_stack(args: &StackArgs) -> CliResult<ExitCode> {
    let spec = layout_from_cli(&args.layout)?;
    spec.validate()?;
    let format = output_format(&args.output);
    let options = BatchOptions {
        workers: args.output.workers,
    };

    let sources = read_sources(&args.inputs)?;
    let entries = if let Some(group_size) = args.group {
        stack_groups(&sources, group_size, &spec, options, format)?
    } else {
        match stack(&sources, &spec, options) {
            Ok(StackOutcome {
                composite,
                failures,
            }) => {
                report_failures(&failures);
                eprintln!("Composite: {}", composite.dimensions());
                let name = output_name(DEFAULT_IMAGE_NAME, "", format);
                vec![encode_entry(name, &composite, format)?]
            }
            Err(PipelineError::NoDecodableInput { failures }) => {
                report_failures(&failures);
                eprintln!("No input could be decoded");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        }
    };

    write_outputs(entries, &args.output.output)?;
    Ok(ExitCode::SUCCESS)
}

fn run_crop(args: &CropArgs) -> CliResult<ExitCode> {
    let spec = match args.config_json {
        Some(ref json) => serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?,
        None => LayoutSpec::default(),
    };
    spec.validate()?;
    let format = output_format(&args.output);
    let crop = CropOptions {
        border: args.border,
        spacing: args.spacing,
        min_confidence: args.min_confidence,
    };

    let json = std::fs::read_to_string(&args.detections)
        .map_err(|e| format!("Error reading {}: {e}", args.detections.display()))?;
    let table: HashMap<String, Vec<Detection>> = serde_json::from_str(&json)
        .map_err(|e| format!("Error parsing {}: {e}", args.detections.display()))?;
    let detections = detections_for_inputs(&args.inputs, &table);

    let sources = read_sources(&args.inputs)?;
    let options = BatchOptions {
        workers: args.output.workers,
    };
    let outcome = run_batch(&sources, options, |source| {
        let image = decode(&source.bytes)?;
        let found = detections.get(&source.name).cloned().unwrap_or_default();
        let stacked = detect_and_stack(&image, &PrecomputedDetector(found), &crop, &spec)?;
        tracing::info!(
            name = %source.name,
            detections = stacked.detections.len(),
            enclosing = %stacked.geometry.enclosing,
            "cropped",
        );
        let preview = args.annotate.then(|| {
            annotate_detections(&image, &stacked.detections, DEFAULT_ANNOTATION_COLOR, 2)
        });
        Ok((stacked.composite, preview))
    })?;
    report_failures(&outcome.failures);
    if outcome.succeeded.is_empty() {
        eprintln!("No input could be cropped");
        return Ok(ExitCode::FAILURE);
    }

    let mut entries = Vec::new();
    for item in &outcome.succeeded {
        let (composite, preview) = &item.value;
        let name = output_name(&item.name, "_crop", format);
        entries.push(encode_entry(name, composite, format)?);
        if let Some(preview) = preview {
            let name = output_name(&item.name, "_annotated", format);
            entries.push(encode_entry(name, preview, format)?);
        }
    }

    write_outputs(entries, &args.output.output)?;
    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Stack(ref args) => run_stack(args),
        Command::Crop(ref args) => run_crop(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use imgstack_export::read_zip;

    use super::*;

    fn try_parse<'a>(args: impl IntoIterator<Item = &'a str>) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("imgstack").chain(args))
    }

    fn stack_args<'a>(args: impl IntoIterator<Item = &'a str>) -> StackArgs {
        match try_parse(args).unwrap().command {
            Command::Stack(stack) => stack,
            Command::Crop(_) => unreachable!("expected the stack subcommand"),
        }
    }

    fn detection(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Detection {
        Detection {
            bbox: imgstack_pipeline::BoundingBox::new(x_min, y_min, x_max, y_max).unwrap(),
            label: String::new(),
            confidence: 1.0,
        }
    }

    #[test]
    fn cli_defaults_match_layout_defaults() {
        let args = stack_args("stack a.png -o out.png".split_whitespace());
        assert_eq!(layout_from_cli(&args.layout).unwrap(), LayoutSpec::default());
    }

    #[test]
    fn layout_flags_are_applied() {
        let args = stack_args(
            "stack a.png b.png --mode grid --columns 3 --resize 64x32 --border 4 \
             --border-fill white --spacing 2 --background #102030 -o out.png"
                .split_whitespace(),
        );
        let spec = layout_from_cli(&args.layout).unwrap();
        assert_eq!(spec.mode, StackMode::Grid);
        assert_eq!(spec.grid_columns, 3);
        assert_eq!(spec.resize, Some(Dimensions::new(64, 32)));
        assert_eq!(spec.border_size, 4);
        assert_eq!(spec.border_fill, Color::WHITE);
        assert_eq!(spec.spacing, 2);
        assert_eq!(spec.background, Color([0x10, 0x20, 0x30]));
    }

    #[test]
    fn config_json_overrides_flags() {
        let args = stack_args([
            "stack",
            "a.png",
            "--border",
            "9",
            "--config-json",
            r#"{"mode": "Vertical", "spacing": 5}"#,
            "-o",
            "out.png",
        ]);
        let spec = layout_from_cli(&args.layout).unwrap();
        assert_eq!(spec.mode, StackMode::Vertical);
        assert_eq!(spec.spacing, 5);
        assert_eq!(spec.border_size, 0);
    }

    #[test]
    fn zero_columns_rejected_by_parser() {
        let result = try_parse("stack a.png --columns 0 -o o.png".split_whitespace());
        assert!(result.is_err());
    }

    #[test]
    fn min_confidence_must_be_a_probability() {
        for bad in ["NaN", "-0.1", "1.5", "high"] {
            let line = format!("crop a.png -o o.png --detections d --min-confidence {bad}");
            assert!(try_parse(line.split_whitespace()).is_err(), "{bad} was accepted");
        }
        let line = "crop a.png -o o.png --detections d --min-confidence 1";
        assert!(try_parse(line.split_whitespace()).is_ok());
    }

    #[test]
    fn parse_confidence_accepts_bounds() {
        assert!(parse_confidence("0").unwrap().abs() < f32::EPSILON);
        assert!((parse_confidence("1.0").unwrap() - 1.0).abs() < f32::EPSILON);
        assert!(parse_confidence("nan").is_err());
    }

    #[test]
    fn parse_dimensions_accepts_both_separators() {
        assert_eq!(parse_dimensions("640x480").unwrap(), Dimensions::new(640, 480));
        assert_eq!(parse_dimensions("8X2").unwrap(), Dimensions::new(8, 2));
    }

    #[test]
    fn parse_dimensions_rejects_bad_input() {
        assert!(parse_dimensions("640").is_err());
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("axb").is_err());
    }

    #[test]
    fn format_follows_flag_then_extension() {
        let args = stack_args("stack a.png -o out.JPG --quality 70".split_whitespace());
        assert_eq!(output_format(&args.output), OutputFormat::Jpeg { quality: 70 });

        let args = stack_args("stack a.png -o out.zip".split_whitespace());
        assert_eq!(output_format(&args.output), OutputFormat::Png);

        let args = stack_args("stack a.png -o out.png --format jpeg".split_whitespace());
        assert_eq!(output_format(&args.output), OutputFormat::JPEG);
    }

    #[test]
    fn detections_match_exact_paths_first() {
        let inputs = [PathBuf::from("a/x.png"), PathBuf::from("b/x.png")];
        let table = HashMap::from([
            ("a/x.png".to_string(), vec![detection(0, 0, 5, 5)]),
            ("b/x.png".to_string(), vec![detection(1, 1, 2, 2)]),
        ]);
        let resolved = detections_for_inputs(&inputs, &table);
        assert_eq!(resolved["a/x.png"], vec![detection(0, 0, 5, 5)]);
        assert_eq!(resolved["b/x.png"], vec![detection(1, 1, 2, 2)]);
    }

    #[test]
    fn shared_file_name_key_matches_no_input() {
        let inputs = [PathBuf::from("a/x.png"), PathBuf::from("b/x.png")];
        let table = HashMap::from([("x.png".to_string(), vec![detection(0, 0, 5, 5)])]);
        let resolved = detections_for_inputs(&inputs, &table);
        assert!(resolved["a/x.png"].is_empty());
        assert!(resolved["b/x.png"].is_empty());
    }

    #[test]
    fn unique_file_name_key_still_matches() {
        let inputs = [PathBuf::from("shots/cat.jpg"), PathBuf::from("dog.jpg")];
        let table = HashMap::from([("cat.jpg".to_string(), vec![detection(0, 0, 5, 5)])]);
        let resolved = detections_for_inputs(&inputs, &table);
        assert_eq!(resolved["shots/cat.jpg"], vec![detection(0, 0, 5, 5)]);
        assert!(resolved["dog.jpg"].is_empty());
    }

    #[test]
    fn single_output_written_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_outputs(vec![ArchiveEntry::new("x.png", vec![1, 2, 3])], &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn several_outputs_need_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            ArchiveEntry::new("x.png", vec![1]),
            ArchiveEntry::new("x.png", vec![2]),
        ];

        let result = write_outputs(entries.clone(), &dir.path().join("out.png"));
        assert!(result.is_err());

        let zip_path = dir.path().join("out.zip");
        write_outputs(entries, &zip_path).unwrap();
        let extracted = read_zip(&std::fs::read(&zip_path).unwrap()).unwrap();
        let names: Vec<&str> = extracted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["x.png", "x-1.png"]);
    }

    #[test]
    fn directory_output_uses_default_names() {
        let dir = tempfile::tempdir().unwrap();

        write_outputs(vec![ArchiveEntry::new("one.png", vec![7])], dir.path()).unwrap();
        assert_eq!(std::fs::read(dir.path().join("one.png")).unwrap(), vec![7]);

        let entries = vec![
            ArchiveEntry::new("a.png", vec![1]),
            ArchiveEntry::new("b.png", vec![2]),
        ];
        write_outputs(entries, dir.path()).unwrap();
        let archive = std::fs::read(dir.path().join(DEFAULT_ARCHIVE_NAME)).unwrap();
        assert_eq!(read_zip(&archive).unwrap().len(), 2);
    }
}
