use clap::Parser;
use colored::Colorize;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

use extractannotations::{
    write_keep_rules, write_typedef_manifest, AnnotationsWriter, ApiDatabase, ApiSurface, Config,
    DeclarationTree, Extractor, Merger, Session, TerminalReport,
};

/// extractannotations - Build external annotation databases for Android (Kotlin/Java)
#[derive(Parser, Debug)]
#[command(name = "extractannotations")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Declaration tree (JSON) produced by the source front end
    #[arg(short, long, value_name = "FILE")]
    declarations: Option<PathBuf>,

    /// API signature listing; items it does not list are dropped
    #[arg(long, value_name = "FILE")]
    api: Option<PathBuf>,

    /// Annotation databases to merge: .xml, .zip, .jar or a directory
    /// Can be specified multiple times; merged in the given order
    #[arg(short, long, value_name = "PATH")]
    merge: Vec<PathBuf>,

    /// Output annotation archive (zip)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output file for ProGuard keep rules
    #[arg(long, value_name = "FILE")]
    keep: Option<PathBuf>,

    /// Output file listing hidden typedef classes
    #[arg(long, value_name = "FILE")]
    typedef_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the `value` attribute first and the rest alphabetically
    #[arg(long)]
    sort_attributes: bool,

    /// Also export class-retained annotations
    #[arg(long)]
    include_class_retention: bool,

    /// Fail on typedef convention violations instead of warning
    #[arg(long)]
    strict_typedefs: bool,

    /// Print per-annotation statistics
    #[arg(long)]
    stats: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("extractannotations v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(Path::new("."))?
    };

    // Override with CLI arguments
    if cli.sort_attributes {
        config.sort_attributes = true;
    }
    if cli.include_class_retention {
        config.include_class_retention = true;
    }
    if cli.strict_typedefs {
        config.strict_typedefs = true;
    }

    Ok(config)
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    if cli.declarations.is_none() && cli.merge.is_empty() {
        return Err(miette!(
            "Nothing to do: pass --declarations and/or --merge"
        ));
    }

    let api = match &cli.api {
        Some(path) => Some(
            ApiSurface::parse(path)
                .into_diagnostic()
                .wrap_err("Failed to load API file")?,
        ),
        None => None,
    };
    let api: Option<&dyn ApiDatabase> = api.as_ref().map(|a| a as &dyn ApiDatabase);

    let mut session = Session::from_config(config);

    // Step 1: Extract from the declaration tree
    if let Some(path) = &cli.declarations {
        let tree = DeclarationTree::load(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load declarations: {}", path.display()))?;
        Extractor::new(&mut session, config, api)
            .extract(&tree)
            .into_diagnostic()?;
    }

    // Step 2: Merge external databases, in order
    {
        let mut merger = Merger::new(&mut session, config, api);
        for path in &cli.merge {
            merger
                .merge_path(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to merge {}", path.display()))?;
        }
    }

    // Step 3: Write outputs
    if let Some(output) = &cli.output {
        let summary = AnnotationsWriter::new(config, api)
            .write(&session.index, output)
            .into_diagnostic()?;
        if !cli.quiet {
            println!(
                "{}",
                format!(
                    "✓ Wrote {} annotations on {} items to {}",
                    summary.annotations,
                    summary.items,
                    output.display()
                )
                .green()
            );
        }
    }

    if let Some(path) = &cli.keep {
        write_keep_rules(&session.tracker, path).into_diagnostic()?;
    }

    if let Some(path) = &cli.typedef_file {
        write_typedef_manifest(&session.tracker, path).into_diagnostic()?;
    }

    if cli.stats {
        TerminalReport::new(&session.stats)
            .with_variants(config.included_variants(), config.variants.clone())
            .print()
            .into_diagnostic()?;
    }

    Ok(())
}
