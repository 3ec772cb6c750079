//! feature-table CLI - inspect and convert feature-annotated datasets

use clap::{Parser, Subcommand};
use feature_table::{
    Dataset, DatasetReader, DatasetWriter, Feature, FileFormat, ReadOptions, RowSize,
    encoding_for_label,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read and write feature-annotated delimited datasets.
///
/// Datasets are tab (.txt) or comma (.csv) separated text whose header rows
/// describe each column's name, scale, data type and bounds.
#[derive(Parser, Debug)]
#[command(name = "feature-table")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the features and rows of one or more datasets
    Inspect {
        /// Input dataset file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format: text (default) or json
        #[arg(short = 'f', long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        read: ReadArgs,
    },
    /// Rewrite a dataset, choosing each file's format by its extension
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Replace the output file if it exists
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        read: ReadArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ReadArgs {
    /// Let rows differ in width, padding short rows with empty cells
    #[arg(long)]
    grow: bool,

    /// Treat blank lines as rows
    #[arg(long)]
    strict: bool,

    /// Comment line prefix, or 'none' to disable comments
    #[arg(short = 'c', long, default_value = "#")]
    comment: String,

    /// Keep empty cells as empty strings in string columns
    #[arg(long)]
    preserve_empty: bool,

    /// Encoding of lines that are not UTF-8 (e.g. windows-1252)
    #[arg(short = 'e', long)]
    encoding: Option<String>,

    /// Dataset identifier to use instead of the one in the file
    #[arg(long)]
    id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Summary<'a> {
    file: String,
    id: &'a str,
    name: &'a str,
    rows: usize,
    columns: usize,
    row_names: bool,
    features: &'a [Feature],
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    let mut exit_code = ExitCode::SUCCESS;

    match &args.command {
        Command::Inspect {
            files,
            format,
            read,
        } => {
            for file in files {
                if let Err(e) = inspect_file(file, *format, read) {
                    eprintln!("Error processing {}: {}", file.display(), e);
                    exit_code = ExitCode::FAILURE;
                }
            }
        }
        Command::Convert {
            input,
            output,
            force,
            read,
        } => {
            if let Err(e) = convert_file(input, output, *force, read) {
                eprintln!("Error converting {}: {}", input.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_dataset(path: &Path, args: &ReadArgs) -> Result<Dataset, Box<dyn std::error::Error>> {
    let mut reader = DatasetReader::new(FileFormat::from_path(path)?);

    if args.grow {
        reader.row_size(RowSize::Max);
    }
    if args.comment.eq_ignore_ascii_case("none") {
        reader.comment_prefix(None);
    } else {
        reader.comment_prefix(Some(args.comment.as_str()));
    }
    reader
        .strict(args.strict)
        .preserve_empty_strings(args.preserve_empty);
    if let Some(ref label) = args.encoding {
        reader.encoding(encoding_for_label(label)?);
    }
    if let Some(ref id) = args.id {
        reader.options(ReadOptions::new().id(id));
    }

    Ok(reader.read_path(path)?)
}

fn inspect_file(
    path: &Path,
    format: OutputFormat,
    args: &ReadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = read_dataset(path, args)?;

    match format {
        OutputFormat::Text => print_text_output(path, &dataset),
        OutputFormat::Json => print_json_output(path, &dataset)?,
    }

    Ok(())
}

fn convert_file(
    input: &Path,
    output: &Path,
    force: bool,
    args: &ReadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = read_dataset(input, args)?;

    let mut writer = DatasetWriter::new(FileFormat::from_path(output)?);
    writer.overwrite(force);
    if args.comment.eq_ignore_ascii_case("none") {
        writer.comment_prefix(None);
    } else {
        writer.comment_prefix(Some(args.comment.as_str()));
    }
    writer.write_path(&dataset, output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows = dataset.num_rows(),
        "converted dataset"
    );
    Ok(())
}

fn print_text_output(path: &Path, dataset: &Dataset) {
    println!("File: {}", path.display());
    println!("  Dataset: {}", dataset.id());
    if dataset.name() != dataset.id() {
        println!("  Name: {}", dataset.name());
    }
    println!("  Rows: {}", dataset.num_rows());
    println!("  Columns: {}", dataset.num_columns());
    println!("  Row names: {}", dataset.has_row_names());
    println!("  Features:");

    for (i, feature) in dataset.features().iter().enumerate() {
        let scale = feature.scale();
        print!(
            "    {}: {} ({} {})",
            i + 1,
            feature.id(),
            feature.scale_type(),
            feature.data_type()
        );
        if feature.has_name() {
            print!(" \"{}\"", feature.name());
        }
        if let (Some(min), Some(max)) = (scale.minimum(), scale.maximum()) {
            print!(" [{min} .. {max}]");
        }
        if let Some(values) = scale.values() {
            print!(" {} distinct", values.len());
        }
        println!();
    }

    println!();
}

fn print_json_output(path: &Path, dataset: &Dataset) -> serde_json::Result<()> {
    let summary = Summary {
        file: path.display().to_string(),
        id: dataset.id(),
        name: dataset.name(),
        rows: dataset.num_rows(),
        columns: dataset.num_columns(),
        row_names: dataset.has_row_names(),
        features: dataset.features(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
