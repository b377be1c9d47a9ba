//! Purpose: `dynjson` CLI entry point: infer native value types for JSON documents.
//! Role: Parses args, reads each input, runs the inference engine, emits results or errors.
//! Invariants: Successful output goes to stdout; diagnostics go to stderr.
//! Invariants: Process exit code is derived from `to_exit_code` for the first failure.
//! Invariants: Errors are JSON on non-TTY stderr, human text on a TTY.
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::error::ErrorKind as ClapErrorKind;
use clap::{Parser, ValueEnum, ValueHint};
use serde_json::{Map, Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

use dynjson::api::{
    DEFAULT_MAX_DEPTH, DynamicValue, Error, ErrorKind, InferOptions, Presence, describe,
    from_reader, to_exit_code,
};
use render::render_pretty;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(RunOutcome::ok());
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `dynjson --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let options = cli.infer_options();
    let presence = if cli.optional {
        Presence::Optional
    } else {
        Presence::Required
    };
    let inputs = if cli.inputs.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        cli.inputs.clone()
    };

    let mut first_failure: Option<i32> = None;
    for input in &inputs {
        match infer_input(input, &options, presence) {
            Ok(value) => {
                emit_value(&value, cli.format, color_mode).map_err(|err| (err, color_mode))?;
            }
            Err(err) => {
                if inputs.len() == 1 {
                    return Err((err, color_mode));
                }
                emit_error(&err, color_mode);
                first_failure.get_or_insert(to_exit_code(err.kind()));
            }
        }
    }

    Ok(first_failure.map_or_else(RunOutcome::ok, RunOutcome::with_code))
}

#[derive(Parser)]
#[command(
    name = "dynjson",
    version,
    about = "Infer the most specific native type of every value in a JSON document",
    long_about = None,
    after_help = r#"EXAMPLES
  $ echo '[1, null, 3]' | dynjson
  $ dynjson --format json payload.json
  $ dynjson --optional --no-null-properties a.json b.json

Numbers resolve to int32 > int64 > uint64 > decimal > float64 > text.
Strings resolve to datetime > uuid > uri > text.
Set RUST_LOG=debug for inference tracing on stderr."#
)]
struct Cli {
    #[arg(
        value_name = "FILE",
        help = "JSON documents to read (`-` or none for stdin)",
        value_hint = ValueHint::FilePath
    )]
    inputs: Vec<PathBuf>,
    #[arg(long, help = "Accept a top-level null document instead of failing")]
    optional: bool,
    #[arg(long, help = "Reject null array elements")]
    no_null_in_arrays: bool,
    #[arg(long, help = "Reject null property values")]
    no_null_properties: bool,
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_DEPTH,
        help = "Maximum array/object nesting (0 = unlimited)"
    )]
    max_depth: usize,
    #[arg(
        long,
        default_value = "pretty",
        value_enum,
        help = "Output format: pretty (annotated tree) or json (tagged document per line)"
    )]
    format: OutputFormat,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty output: auto|always|never"
    )]
    color: ColorMode,
}

impl Cli {
    fn infer_options(&self) -> InferOptions {
        let max_depth = if self.max_depth == 0 {
            None
        } else {
            Some(self.max_depth)
        };
        InferOptions::new()
            .with_null_in_arrays(!self.no_null_in_arrays)
            .with_null_as_property_value(!self.no_null_properties)
            .with_max_depth(max_depth)
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn infer_input(path: &Path, options: &InferOptions, presence: Presence) -> Result<DynamicValue, Error> {
    debug!(input = %path.display(), "reading input");
    if path == Path::new("-") {
        return from_reader(io::stdin().lock(), options, presence);
    }
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to open input")
            .with_path(path)
            .with_source(err)
    })?;
    from_reader(file, options, presence).map_err(|err| err.with_path(path))
}

fn emit_value(value: &DynamicValue, format: OutputFormat, color_mode: ColorMode) -> Result<(), Error> {
    let text = match format {
        OutputFormat::Pretty => {
            render_pretty(value, color_mode.use_color(io::stdout().is_terminal()))
        }
        OutputFormat::Json => serde_json::to_string(&describe(value)).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("json encode failed")
                .with_source(err)
        })?,
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_source(err)
    })
}

enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let line = diagnostic(err, color_mode, io::stderr().is_terminal());
    let _ = writeln!(io::stderr().lock(), "{line}");
}

/// One stderr diagnostic: annotated text for terminals, a single JSON line otherwise.
fn diagnostic(err: &Error, color_mode: ColorMode, is_tty: bool) -> String {
    if is_tty {
        return error_text(err, color_mode.use_color(is_tty));
    }
    serde_json::to_string(&error_json(err))
        .unwrap_or_else(|_| format!("{{\"error\":{{\"kind\":\"{:?}\"}}}}", err.kind()))
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::MalformedInput => "malformed input".to_string(),
        ErrorKind::DuplicateKey => "duplicate property name".to_string(),
        ErrorKind::UnexpectedNull => "unexpected null".to_string(),
        ErrorKind::UnparseableScalar => "unparseable scalar".to_string(),
        ErrorKind::DepthLimit => "nesting too deep".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = std::error::Error::source(err);
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(token) = err.token() {
        inner.insert("token".to_string(), json!(token.label()));
    }
    if let Some(text) = err.text() {
        inner.insert("text".to_string(), json!(text));
    }
    if let Some(key) = err.key() {
        inner.insert("key".to_string(), json!(key));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(token) = err.token() {
        let text = err.text().unwrap_or("");
        lines.push(format!(
            "{} {} `{text}`",
            colorize_label("token:", use_color, AnsiColor::Yellow),
            token.label()
        ));
    }
    if let Some(key) = err.key() {
        lines.push(format!(
            "{} {key}",
            colorize_label("key:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!(
            "{} {offset}",
            colorize_label("offset:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| format!("invalid arguments ({:?})", err.kind()))
}
