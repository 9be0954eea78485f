use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dirtyweave::{
    AllClasses, AnnotationClassifier, ClassDefinition, ClassProgram, ClassReport,
    DefaultMethodBundle, DirtyTrackingPass, ModelClassifier, PassConfig, WeaveError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dirtyweave")]
#[command(about = "Adds dirty checking to persistence model classes")]
struct Cli {
    /// Enable debug tracing (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform the classes of a class-language (or JSON) file
    Transform {
        input: PathBuf,
        #[command(flatten)]
        selection: Selection,
        #[arg(long, value_enum, default_value_t = Format::Dsl)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the per-class reports without writing anything
    Inspect {
        input: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
    /// Print the default configuration as JSON
    Config {
        /// Print the preset used for Rust sources instead
        #[arg(long)]
        rust: bool,
    },
}

#[derive(clap::Args)]
struct Selection {
    /// JSON configuration file; defaults apply to missing keys
    #[arg(long)]
    config: Option<PathBuf>,
    /// Treat every class as a model class
    #[arg(long)]
    all: bool,
    /// Only process the named class
    #[arg(long)]
    class: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Dsl,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Transform {
            input,
            selection,
            format,
            out,
        } => {
            let (classes, reports) = run_pass(&input, &selection)?;
            let rendered = match format {
                Format::Dsl => ClassProgram { classes }.render(),
                Format::Json => serde_json::to_string_pretty(&classes)?,
            };
            emit(&rendered, out.as_deref())?;
            let instrumented: usize = reports.iter().map(|r| r.instrumented().count()).sum();
            eprintln!(
                "Processed {} classes, {} properties instrumented",
                reports.len(),
                instrumented
            );
            Ok(())
        }
        Command::Inspect { input, selection } => {
            let (_, reports) = run_pass(&input, &selection)?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            Ok(())
        }
        Command::Config { rust } => {
            let config = if rust {
                PassConfig::rust()
            } else {
                PassConfig::default()
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "dirtyweave=debug" } else { "dirtyweave=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_pass(input: &Path, selection: &Selection) -> Result<(Vec<ClassDefinition>, Vec<ClassReport>)> {
    let config = match &selection.config {
        Some(path) => PassConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()))?,
        None => PassConfig::default(),
    };
    let pass = DirtyTrackingPass::new(config)?;

    let mut classes = load_classes(input)?;
    if let Some(name) = &selection.class {
        classes.retain(|class| class.name == *name || class.simple_name() == name.as_str());
        if classes.is_empty() {
            return Err(WeaveError::ClassNotFound(name.clone()).into());
        }
    }
    debug!(count = classes.len(), input = %input.display(), "loaded classes");

    let classifier: Box<dyn ModelClassifier> = if selection.all {
        Box::new(AllClasses)
    } else {
        Box::new(AnnotationClassifier::new())
    };
    let mut bundle = DefaultMethodBundle::new();
    let reports = pass.transform_all(&mut classes, classifier.as_ref(), Some(&mut bundle))?;
    Ok((classes, reports))
}

/// `.json` inputs hold a serialized class list; anything else is class language.
fn load_classes(input: &Path) -> Result<Vec<ClassDefinition>> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid class list in '{}'", input.display()))
    } else {
        let program = ClassProgram::parse(&text)
            .with_context(|| format!("Failed to parse '{}'", input.display()))?;
        Ok(program.classes)
    }
}

fn emit(content: &str, out: Option<&Path>) -> Result<()> {
    let Some(path) = out else {
        print!("{}", content);
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory '{}'", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(())
}
