//! protoc-gen-tsdecl - Generate TypeScript declaration files from Protocol Buffers
//!
//! Run without arguments it acts as a protoc plugin: a `CodeGeneratorRequest`
//! is read from stdin and a `CodeGeneratorResponse` written to stdout. Given
//! `--descriptor-set` or `--descriptor-dir` it reads compiled descriptor sets
//! and writes `.d.ts` files to disk.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use tsdecl_core::{plugin, Config, GeneratedFile, Generator};
use walkdir::WalkDir;

/// Descriptor set extensions picked up by `--descriptor-dir`
const DESCRIPTOR_EXTENSIONS: &[&str] = &["pb", "binpb", "desc"];

/// Generate TypeScript declaration files from Protocol Buffer descriptors
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-tsdecl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Proto file names to generate (default: every file in the sets)
    #[arg(long = "file", value_name = "NAME")]
    files: Vec<String>,

    /// Output directory for generated .d.ts files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Generator options, in protoc parameter form (e.g. "naming=verbatim,int_enums")
    #[arg(short, long, default_value = "", env = "TSDECL_PARAMETER")]
    parameter: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry run - don't write files, just show what would be generated
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,

    /// Compare against existing files and fail if any is missing or differs
    #[arg(long, conflicts_with_all = ["dry_run", "force"])]
    check: bool,
}

#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct InputMode {
    /// Path to a serialized FileDescriptorSet (repeatable)
    #[arg(short = 'd', long = "descriptor-set", value_name = "FILE")]
    descriptor_sets: Vec<PathBuf>,

    /// Directory searched recursively for descriptor sets (*.pb, *.binpb, *.desc)
    #[arg(long, value_name = "DIR")]
    descriptor_dir: Option<PathBuf>,
}

impl InputMode {
    fn is_plugin(&self) -> bool {
        self.descriptor_sets.is_empty() && self.descriptor_dir.is_none()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries the plugin response
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.input.is_plugin() {
        run_plugin()
    } else {
        run_files(&cli)
    }
}

/// Speak the protoc plugin protocol over stdin/stdout
fn run_plugin() -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read CodeGeneratorRequest from stdin")?;
    trace!("Read {} bytes of request", input.len());

    let response = plugin::respond(&input);
    if let Some(error) = &response.error {
        warn!("Generation failed: {}", error);
    } else {
        info!("Generated {} file(s)", response.file.len());
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&response.encode_to_vec())
        .context("Failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Generate from descriptor sets on disk
fn run_files(cli: &Cli) -> Result<()> {
    let files = load_descriptors(&cli.input)?;
    if files.is_empty() {
        bail!("No file descriptors found in the given input");
    }

    let to_generate = if cli.files.is_empty() {
        files.iter().map(|f| f.name().to_string()).collect()
    } else {
        cli.files.clone()
    };

    let config = Config::from_parameter(&cli.parameter)
        .with_context(|| format!("Invalid parameter string: {:?}", cli.parameter))?;
    let generated = Generator::new(config)
        .generate(&files, &to_generate)
        .context("Failed to generate declarations")?;

    if cli.check {
        return check_outputs(&cli.output, &generated);
    }

    let mut written = 0;
    for file in &generated {
        let output_path = safe_output_path(&cli.output, &file.name)?;

        if cli.dry_run {
            println!("Would write: {}", output_path.display());
            if cli.verbose > 0 {
                println!("---");
                println!("{}", file.content);
                println!("---");
            }
            continue;
        }

        write_declaration_file(&output_path, &file.content, cli.force)?;
        println!("Wrote {}", output_path.display());
        written += 1;
    }

    info!(
        "Summary: {} generated, {} written",
        generated.len(),
        written
    );
    Ok(())
}

/// Load every file descriptor named by the input mode, first occurrence wins
fn load_descriptors(input: &InputMode) -> Result<Vec<FileDescriptorProto>> {
    let mut paths = input.descriptor_sets.clone();

    if let Some(dir) = &input.descriptor_dir {
        if !dir.is_dir() {
            bail!("Path is not a directory: {}", dir.display());
        }
        info!("Scanning directory: {}", dir.display());

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_descriptor_set(path) {
                paths.push(path.to_path_buf());
            } else {
                trace!("Skipping {}", path.display());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for path in &paths {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read descriptor set: {}", path.display()))?;
        let set = FileDescriptorSet::decode(data.as_slice())
            .with_context(|| format!("Failed to decode descriptor set: {}", path.display()))?;

        debug!("Loaded {} file(s) from {}", set.file.len(), path.display());
        for file in set.file {
            if seen.insert(file.name().to_string()) {
                files.push(file);
            } else {
                debug!("Skipping duplicate descriptor: {}", file.name());
            }
        }
    }

    Ok(files)
}

fn is_descriptor_set(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DESCRIPTOR_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Join a generated file name onto the output directory, refusing any name
/// that would escape it
fn safe_output_path(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        bail!(
            "Path traversal detected: '{}' would escape output directory",
            name
        );
    }
    Ok(output_dir.join(relative))
}

/// Compare generated output with the files on disk
fn check_outputs(output_dir: &Path, generated: &[GeneratedFile]) -> Result<()> {
    let mut stale = Vec::new();
    for file in generated {
        let path = safe_output_path(output_dir, &file.name)?;
        match fs::read_to_string(&path) {
            Ok(existing) if existing == file.content => {
                debug!("Up to date: {}", path.display());
            }
            Ok(_) => stale.push(format!("{} (differs)", path.display())),
            Err(_) => stale.push(format!("{} (missing)", path.display())),
        }
    }

    if !stale.is_empty() {
        bail!("Generated files are out of date:\n  {}", stale.join("\n  "));
    }
    println!("{} file(s) up to date", generated.len());
    Ok(())
}

/// Write a declaration file to disk
fn write_declaration_file(output_path: &Path, content: &str, force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}
