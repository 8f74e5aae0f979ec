//! revdeps CLI - per-symbol reverse dependency cache

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use revdeps::artifact::{self, SymbolRecord};
use revdeps::config::{
    config_base_dir, default_config_path, ensure_cache_root, ensure_gitignore, load_config,
    resolve_cache_root, write_config, RevdepsConfig,
};
use revdeps::discovery::{ClassDiscovery, DeclarationScanner, Package};
use revdeps::ui::{self, Icons, Spinner};
use revdeps::{DependentsCache, FsStore, SetReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "revdeps")]
#[command(version)]
#[command(about = "Per-symbol reverse dependency cache for class hierarchies")]
#[command(long_about = r#"
revdeps records, for every class, interface and trait, which declarations
depend on it (directly or transitively), one artifact per symbol.

Example usage:
  revdeps init
  revdeps discover ./vendor/acme/mailer ./src
  revdeps get 'Acme\Mailer\Transport'
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to revdeps.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cache root directory (overrides the config file)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and ignore the cache directory in git
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Rebuild the cache from a JSON map of declarations
    Set {
        /// JSON object mapping symbol names to declarations
        symbols: PathBuf,

        /// Keep existing artifacts instead of clearing first
        #[arg(short, long)]
        keep: bool,
    },

    /// Show the symbols that depend on a symbol
    Get {
        /// Fully qualified symbol name
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Remove every cached artifact
    Clear,

    /// Scan packages for declarations and rebuild the cache
    Discover {
        /// Package directories (each holding a composer.json)
        #[arg(required = true)]
        packages: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Config file values with command-line overrides applied
struct Settings {
    cache_root: PathBuf,
    separator: char,
    exclude: Vec<String>,
}

impl Settings {
    fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(default_config_path);
        let config = load_config(Some(config_path.as_path()))
            .context("failed to load config")?
            .unwrap_or_default();

        // Paths in the config file are relative to the file itself
        let cache_root = cli
            .root
            .clone()
            .unwrap_or_else(|| resolve_cache_root(&config, &config_base_dir(&config_path)));

        Ok(Self {
            cache_root,
            separator: config.separator(),
            exclude: config.exclude,
        })
    }

    fn open_cache(&self) -> anyhow::Result<DependentsCache> {
        let store = FsStore::open(&self.cache_root)
            .with_context(|| format!("failed to open cache at {}", self.cache_root.display()))?
            .with_separator(self.separator);
        Ok(DependentsCache::with_store(store))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match &cli.command {
        Commands::Init { force } => run_init(&cli, *force),
        Commands::Set { symbols, keep } => run_set(&cli, symbols, *keep),
        Commands::Get { name, format } => run_get(&cli, name, *format),
        Commands::Clear => run_clear(&cli),
        Commands::Discover { packages } => run_discover(&cli, packages),
    }
}

fn run_init(cli: &Cli, force: bool) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let project_root = config_base_dir(&config_path);

    // Stored relative to the config file, which is how it is read back
    let cache_root = cli
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from(".revdeps").join("cache"));
    let config = RevdepsConfig {
        cache_root: Some(cache_root.display().to_string()),
        separator: None,
        exclude: Vec::new(),
    };
    let resolved = resolve_cache_root(&config, &project_root);

    write_config(&config_path, &config, force)?;
    ensure_cache_root(&resolved)?;
    ensure_gitignore(&project_root)?;

    ui::success(&format!("Wrote {}", config_path.display()));
    ui::status(Icons::FOLDER, "Cache root", &resolved.display().to_string());
    Ok(())
}

fn run_set(cli: &Cli, symbols_path: &Path, keep: bool) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli)?;
    let cache = settings.open_cache()?;
    let started = Instant::now();

    let bytes = std::fs::read(symbols_path)
        .with_context(|| format!("failed to read {}", symbols_path.display()))?;
    let factory = cache.source_factory();
    let declarations = artifact::decode_declarations(&bytes, factory.as_ref())
        .with_context(|| format!("failed to parse {}", symbols_path.display()))?;

    ui::header(&format!("Caching dependents of {} symbols", declarations.len()));
    ui::status(Icons::FOLDER, "Cache root", &settings.cache_root.display().to_string());

    let spinner = Spinner::new("Writing artifacts");
    let report = if keep {
        cache.set(&declarations)
    } else {
        cache.clear().set(&declarations)
    };
    spinner.finish_and_clear();

    print_report(&report, started);
    Ok(())
}

fn run_get(cli: &Cli, name: &str, format: OutputFormat) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli)?;
    let cache = settings.open_cache()?;

    let dependents = cache
        .get(name)
        .with_context(|| format!("failed to read dependents of {}", name))?;

    match format {
        OutputFormat::Json => {
            let records: Vec<SymbolRecord> = dependents.iter().map(SymbolRecord::from).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputFormat::Text => {
            if dependents.is_empty() {
                println!(
                    "{} Nothing depends on {}",
                    Icons::SEARCH,
                    name.style(ui::theme().symbol.clone())
                );
            } else {
                println!(
                    "{} {} dependents of {}",
                    Icons::LINK,
                    dependents.len(),
                    name.style(ui::theme().symbol.clone())
                );
                println!("{}", ui::dependents_table(&dependents));
            }
        }
    }
    Ok(())
}

fn run_clear(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli)?;
    let cache = settings.open_cache()?;
    cache.clear();
    ui::status(Icons::DEL, "Cleared", &settings.cache_root.display().to_string());
    Ok(())
}

fn run_discover(cli: &Cli, packages: &[PathBuf]) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli)?;
    if settings.separator != revdeps::storage::NAMESPACE_SEPARATOR {
        ui::warn("Discovery always uses the default namespace separator");
    }
    let started = Instant::now();

    let scanner = DeclarationScanner::new().with_excludes(settings.exclude.clone());
    let mut discovery = ClassDiscovery::with_scanner(&settings.cache_root, Box::new(scanner));

    ui::header(discovery.name());
    ui::status(Icons::FOLDER, "Cache root", &discovery.cache_root().display().to_string());
    let spinner = Spinner::new("Scanning packages");
    for path in packages {
        let package = Package::from_path(path);
        spinner.set_message(&format!("Scanning {}", package.name));
        let found = discovery.discover(&package);
        if found == 0 {
            ui::info("No new symbols in", &package.name);
        } else {
            tracing::info!("{}: {} symbols", package.name, found);
        }
    }
    spinner.set_message("Writing artifacts");
    let report = discovery.complete().with_context(|| {
        format!("failed to open cache at {}", settings.cache_root.display())
    })?;
    spinner.finish_and_clear();

    ui::status(Icons::PACKAGE, "Packages", &packages.len().to_string());
    ui::status(Icons::FILE, "Symbols", &discovery.symbols().len().to_string());
    print_report(&report, started);
    Ok(())
}

fn print_report(report: &SetReport, started: Instant) {
    if !revdeps::output::is_quiet() {
        println!("{}", ui::report_table(report));
    }
    for skipped in &report.skipped {
        ui::warn(&format!("Skipped {}: {}", skipped.name, skipped.reason));
    }
    if report.is_complete() {
        ui::success("Cache is up to date");
    } else {
        ui::error(&format!("{} symbols could not be cached", report.skipped.len()));
    }
    ui::timing(&format!("{:.2?}", started.elapsed()));
}
