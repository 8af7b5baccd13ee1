use anyhow::{bail, Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use dicom_core::Tag;
use dicom_pseudonymizer::config::{load_rules, ConfigBuilder};
use dicom_pseudonymizer::{PseudonymizationError, Pseudonymizer};
use env_logger::Builder;
use log::{warn, Level, LevelFilter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

#[derive(Clone)]
struct TagValueParser;

impl TypedValueParser for TagValueParser {
    type Value = Tag;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let s = value.to_str().ok_or_else(|| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidUtf8,
                "invalid exclude tag(s)",
            )
        })?;

        Tag::from_str(s).map_err(|_e| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                format!("{s} is not a valid tag"),
            )
        })
    }
}

/// De-identify DICOM files, replacing patient IDs and accession numbers by pseudonyms
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file or directory
    #[arg(short, long, value_name = "INPUT_PATH")]
    input: PathBuf,

    /// Output file or directory
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: PathBuf,

    /// CSV file with the correspondence between original identifiers and pseudonyms
    #[arg(short, long, value_name = "CSV_PATH", env = "DCMPSEUDO_LOOKUP_TABLE")]
    lookup_table: Option<PathBuf>,

    /// JSON file with rules overriding the default ones
    #[arg(long, value_name = "JSON_PATH")]
    rules: Option<PathBuf>,

    /// Keep private tags instead of removing them
    #[arg(long)]
    keep_private_tags: bool,

    /// Name output files after the pseudonymized patient ID and accession number
    #[arg(long)]
    rename: bool,

    /// Recursively look for files in input directory
    #[arg(short, long)]
    recursive: bool,

    /// Continue when file found is not DICOM
    #[arg(short, long = "continue")]
    r#continue: bool,

    /// Show more verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Tags to exclude from de-identification, e.g. "00100020,00080050"
    #[arg(long, value_name = "TAGS", value_delimiter = ',', value_parser = TagValueParser)]
    exclude: Vec<Tag>,
}

fn output_path_for(input_root: &Path, input_file: &Path, output_dir: &Path) -> PathBuf {
    match input_file.strip_prefix(input_root) {
        Ok(relative) => output_dir.join(relative),
        Err(_) => output_dir.to_path_buf(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let input_path = args.input;
    let output_path = args.output;
    let recurse = args.recursive;
    let continue_on_read_error = args.r#continue;
    let verbose = args.verbose;

    let log_level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug => "Debug",
                Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .filter(None, log_level);
    builder.init();

    let mut config_builder = ConfigBuilder::default()
        .delete_private_tags(!args.keep_private_tags)
        .rename_output(args.rename);

    if let Some(lookup_table) = args.lookup_table {
        config_builder = config_builder.lookup_table(lookup_table);
    }

    if let Some(rules_path) = args.rules {
        let overrides = load_rules(&rules_path)
            .with_context(|| format!("failed to load rules from {}", rules_path.display()))?;
        config_builder = config_builder.overrides(&overrides);
    }

    // tags to be excluded from de-identification
    config_builder = config_builder.exclude(args.exclude);

    let config = config_builder.build();
    if config.rules().needs_correspondence() && config.lookup_table().is_none() {
        bail!("a lookup table is required, use --lookup-table or DCMPSEUDO_LOOKUP_TABLE");
    }
    let mut pseudonymizer = Pseudonymizer::new(config);

    if input_path.is_file() {
        pseudonymizer
            .anonymize_file(&input_path, &output_path)
            .with_context(|| format!("failed to de-identify {}", input_path.display()))?;
        return Ok(());
    }

    if input_path.is_dir() {
        if !output_path.is_dir() {
            bail!("output path should be an existing directory");
        }

        let mut walk_dir = WalkDir::new(&input_path);
        if !recurse {
            walk_dir = walk_dir.max_depth(1);
        }

        // one file at a time, the UID map and the lookup table are shared
        let files = walk_dir
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file());

        for path_buf in files {
            let target = if args.rename {
                output_path.clone()
            } else {
                output_path_for(&input_path, &path_buf, &output_path)
            };
            match pseudonymizer.anonymize_file(&path_buf, &target) {
                Err(e @ PseudonymizationError::ReadError(_)) if continue_on_read_error => {
                    warn!("{}", e);
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to de-identify {}", path_buf.display()))
                }
                Ok(_) => {}
            }
        }

        return Ok(());
    }

    bail!("Input should either be a file or a directory");
}
