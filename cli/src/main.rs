use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use llm_normalize_core::{
    contracts, normalize_text, scan_partial_field, FieldKind, SchemaSpec, StreamSession, Warning,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "llm-normalize")]
#[command(about = "Turn raw LLM output into records that always satisfy a contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the live value of one field from a possibly incomplete buffer
    Scan {
        /// Input text file, or `-` for stdin
        input: PathBuf,

        /// Field whose string value to recover
        #[arg(short, long)]
        field: String,
    },

    /// Extract and normalize a completed response
    Normalize {
        /// Input text file, or `-` for stdin
        input: PathBuf,

        #[command(flatten)]
        spec: SpecArgs,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Count a list's objects by one of their enum fields, e.g. `findings.severity`
        #[arg(long, value_name = "LIST.FIELD")]
        count_by: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Replay the input as a stream of fixed-size chunks
    Replay {
        /// Input text file, or `-` for stdin
        input: PathBuf,

        #[command(flatten)]
        spec: SpecArgs,

        /// Characters per chunk
        #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
        chunk_size: u32,

        /// Field to display while streaming (defaults to the spec's primary field)
        #[arg(short, long)]
        field: Option<String>,
    },

    /// List the built-in contracts, or print one as JSON
    Contracts {
        /// Contract to print
        name: Option<String>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SpecArgs {
    /// Built-in contract name (see `contracts`)
    #[arg(short, long)]
    contract: Option<String>,

    /// Schema spec JSON file
    #[arg(long)]
    spec: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

#[derive(Serialize)]
struct Report<'a> {
    record: &'a llm_normalize_core::Record,
    warnings: &'a [Warning],
    used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    counts: Option<BTreeMap<String, usize>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan { input, field } => {
            let buffer = read_input(&input)?;
            println!("{}", scan_partial_field(&buffer, &field));
        }
        Commands::Normalize {
            input,
            spec,
            output,
            count_by,
            format,
        } => {
            let spec = load_spec(&spec)?;
            let text = read_input(&input)?;
            let outcome = normalize_text(&text, &spec);

            if outcome.used_fallback {
                eprintln!("Warning: no structured object found; using the raw text");
            }
            report_warnings(&outcome.warnings);

            let counts = count_by
                .map(|target| count_categories(&spec, &outcome.record, &target))
                .transpose()?;

            let report = Report {
                record: &outcome.record,
                warnings: &outcome.warnings,
                used_fallback: outcome.used_fallback,
                counts,
            };
            write_json(&report, output.as_ref(), format)?;
        }
        Commands::Replay {
            input,
            spec,
            chunk_size,
            field,
        } => {
            let spec = load_spec(&spec)?;
            let text = read_input(&input)?;

            let mut session = match &field {
                Some(field) => StreamSession::with_live_field(&spec, field),
                None => StreamSession::new(&spec),
            };

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let mut shown = String::new();
            for chunk in chunks(&text, chunk_size as usize) {
                let live = session.push(chunk);
                if live != shown {
                    writeln!(out, "{}", serde_json::to_string(&live)?)
                        .context("Failed to write live text")?;
                    shown = live;
                }
            }

            let outcome = session.finish();
            report_warnings(&outcome.warnings);
            let report = Report {
                record: &outcome.record,
                warnings: &outcome.warnings,
                used_fallback: outcome.used_fallback,
                counts: None,
            };
            writeln!(out, "{}", serde_json::to_string(&report)?)
                .context("Failed to write record")?;
            out.flush().context("Failed to flush stdout")?;
        }
        Commands::Contracts { name } => match name {
            Some(name) => {
                let spec = builtin(&name)?;
                write_json(spec, None, OutputFormat::Pretty)?;
            }
            None => {
                for name in contracts::NAMES {
                    println!("{}", name);
                }
            }
        },
    }

    Ok(())
}

fn builtin(name: &str) -> Result<&'static SchemaSpec> {
    contracts::by_name(name).with_context(|| {
        format!(
            "Unknown contract '{}' (expected one of: {})",
            name,
            contracts::NAMES.join(", ")
        )
    })
}

fn load_spec(args: &SpecArgs) -> Result<SchemaSpec> {
    match (&args.contract, &args.spec) {
        (Some(name), _) => builtin(name).cloned(),
        (None, Some(path)) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read spec file: {}", path.display()))?;
            SchemaSpec::from_json(&json)
                .with_context(|| format!("Invalid spec in: {}", path.display()))
        }
        (None, None) => bail!("Either --contract or --spec is required"),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    Ok(text)
}

/// Resolve `list.field` against the spec and count the record's elements.
fn count_categories(
    spec: &SchemaSpec,
    record: &llm_normalize_core::Record,
    target: &str,
) -> Result<BTreeMap<String, usize>> {
    let Some((list, field)) = target.split_once('.') else {
        bail!("--count-by expects LIST.FIELD, got '{}'", target);
    };
    let Some(FieldKind::List { item, .. }) = spec.field(list).map(|f| &f.kind) else {
        bail!("'{}' is not a list field of '{}'", list, spec.name());
    };
    let FieldKind::Object { fields } = item.as_ref() else {
        bail!("'{}' is not a list of objects", list);
    };
    let Some(FieldKind::Enum { table }) = fields.iter().find(|f| f.name == field).map(|f| &f.kind)
    else {
        bail!("'{}.{}' is not an enum field", list, field);
    };
    Ok(record.count_by(list, field, table))
}

/// Split `text` into pieces of `size` characters.
fn chunks(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(index, _)| index);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        let path = if warning.path.is_empty() { "<root>" } else { &warning.path };
        eprintln!("Warning: {}: {}", path, warning.message);
    }
}

fn write_json<T: Serialize + ?Sized>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let pieces: Vec<&str> = chunks("héllo wörld", 4).collect();
        assert_eq!(pieces, vec!["héll", "o wö", "rld"]);
        assert_eq!(chunks("", 4).count(), 0);
    }

    #[test]
    fn test_count_categories_resolves_enum_table() {
        let spec = contracts::quality_review();
        let outcome = normalize_text(
            r#"{"findings": [{"severity": "blocker"}, {"severity": "nit"}]}"#,
            spec,
        );
        let counts = count_categories(spec, &outcome.record, "findings.severity").unwrap();
        assert_eq!(counts["critical"], 1);
        assert_eq!(counts["info"], 1);
        assert_eq!(counts["major"], 0);

        assert!(count_categories(spec, &outcome.record, "findings").is_err());
        assert!(count_categories(spec, &outcome.record, "summary.x").is_err());
        assert!(count_categories(spec, &outcome.record, "findings.message").is_err());
    }
}
