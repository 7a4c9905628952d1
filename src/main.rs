use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sidx::index::{self, Fragment, IndexStats, ScanOptions};
use sidx::lint::{self, sources::SourceTree, CheckContext, CheckOptions};
use sidx::output::{self, LookupHit};
use sidx::utils::{bootstrap, get_config_path, AppConfig, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use termcolor::ColorChoice;
use tracing::{info, warn};

/// Exit status for lint failures
const EXIT_FAILED: u8 = 1;
/// Exit status for unreadable or unparsable input
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "sidx")]
#[command(version, about = "Parse and lint documentation search-index fragments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr (SIDX_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,
}

#[derive(Subcommand)]
enum Commands {
    /// Check fragments for integrity problems
    Check {
        /// Fragment file or directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Root of the documented sources (enables SIDX_MISSING_SOURCE)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Skip checks that read the HTML pages
        #[arg(long)]
        no_pages: bool,

        /// Check that pages exist but not the anchors inside them
        #[arg(long)]
        no_anchors: bool,

        /// Disable a check by code (repeatable)
        #[arg(short, long = "disable", value_name = "CODE")]
        disable: Vec<String>,

        /// Fail on warnings too
        #[arg(long)]
        deny_warnings: bool,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find entries whose key starts with the normalized query
    Lookup {
        /// Symbol name or prefix
        query: String,

        /// Fragment file or directory to search
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Print the contents of one fragment
    Dump {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DumpFormat::Table)]
        format: DumpFormat,
    },
    /// Show index statistics
    Stats {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Print only the config file location
        #[arg(long, conflicts_with = "init")]
        path: bool,

        /// Write a default config to ./.sidx.json
        #[arg(long)]
        init: bool,

        /// With --init, write the global config instead
        #[arg(long, requires = "init")]
        global: bool,
    },
    /// List the available checks
    Checks,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

impl ColorWhen {
    fn choice(self) -> ColorChoice {
        match self {
            ColorWhen::Auto => ColorChoice::Auto,
            ColorWhen::Always => ColorChoice::Always,
            ColorWhen::Never => ColorChoice::Never,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Table,
    Json,
    Js,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    bootstrap::init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = AppConfig::load(&cwd)?;
    let color = cli.color.choice();

    match cli.command {
        Commands::Check {
            path,
            source,
            no_pages,
            no_anchors,
            disable,
            deny_warnings,
            json,
        } => {
            let (fragments, failures) = load(&path, &config, !json)?;

            let source_root = source.or_else(|| config.source_root.clone());
            let sources = source_root
                .map(|root| SourceTree::scan(&root, &config.source_extensions))
                .transpose()?;

            let mut options = CheckOptions {
                check_pages: config.check_pages && !no_pages,
                check_anchors: config.check_anchors && !no_anchors,
                ..CheckOptions::default()
            };
            for code in config.disabled_checks.iter().chain(&disable) {
                if lint::find_check(code).is_none() {
                    warn!(code = %code, "Unknown check code");
                }
                options.disabled.insert(code.clone());
            }

            let ctx = CheckContext::new(&fragments, sources.as_ref(), &options);
            let report = lint::run_checks(&ctx);

            if json {
                output::print_json(&report)?;
            } else {
                output::print_report(&report, color)?;
            }

            if failures > 0 {
                return Ok(ExitCode::from(EXIT_ERROR));
            }
            if report.failed(deny_warnings || config.deny_warnings) {
                return Ok(ExitCode::from(EXIT_FAILED));
            }
        }
        Commands::Lookup { query, path, json } => {
            let (fragments, failures) = load(&path, &config, false)?;

            let hits: Vec<LookupHit<'_>> = fragments
                .iter()
                .flat_map(|fragment| {
                    fragment.index.lookup(&query).into_iter().map(move |entry| LookupHit {
                        file: &fragment.path,
                        entry,
                    })
                })
                .collect();
            info!(query = %query, hits = hits.len(), "Lookup finished");

            if json {
                output::print_json(&hits)?;
            } else if hits.is_empty() {
                eprintln!("No entries match '{}'", query);
            } else {
                output::print_lookup(&hits, color)?;
            }

            if failures > 0 {
                return Ok(ExitCode::from(EXIT_ERROR));
            }
            if hits.is_empty() {
                return Ok(ExitCode::from(EXIT_FAILED));
            }
        }
        Commands::Dump { file, format } => {
            let fragment = index::read_fragment(&file)?;
            match format {
                DumpFormat::Table => output::print_table(&fragment.index)?,
                DumpFormat::Json => output::print_json(&fragment.index)?,
                DumpFormat::Js => print!("{}", index::writer::to_js(&fragment.index)),
            }
        }
        Commands::Stats { path, json } => {
            let (fragments, failures) = load(&path, &config, !json)?;
            let stats = IndexStats::collect(&fragments);

            if json {
                output::print_json(&stats)?;
            } else {
                output::print_stats(&path, &stats, &fragments)?;
            }

            if failures > 0 {
                return Ok(ExitCode::from(EXIT_ERROR));
            }
        }
        Commands::Config { path, init, global } => {
            if init {
                let target = if global {
                    get_config_path()?
                } else {
                    cwd.join(PROJECT_CONFIG_FILE)
                };
                if target.exists() {
                    anyhow::bail!("{} already exists", target.display());
                }
                AppConfig::default().save_to(&target)?;
                println!("Wrote {}", target.display());
            } else if path {
                match AppConfig::locate(&cwd)? {
                    Some(location) => println!("{}", location.display()),
                    None => println!(
                        "{} (not present, using defaults)",
                        get_config_path()?.display()
                    ),
                }
            } else {
                output::print_json(&config)?;
            }
        }
        Commands::Checks => {
            for check in lint::CHECKS {
                println!(
                    "{:24} {:8} {}",
                    check.code,
                    check.severity.to_string(),
                    check.description
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Discover and parse fragments under `path`, reporting parse failures on
/// stderr. Returns the parsed fragments and the number of failures.
fn load(path: &Path, config: &AppConfig, progress: bool) -> Result<(Vec<Fragment>, usize)> {
    let options = ScanOptions {
        include: config.fragment_patterns.clone(),
        exclude: config.exclude_patterns.clone(),
        progress,
        ..ScanOptions::default()
    };

    let mut fragments = Vec::new();
    let mut failures = 0;
    for result in index::scan::scan(path, &options)? {
        match result {
            Ok(fragment) => fragments.push(fragment),
            Err(e) => {
                eprintln!("error: {:#}", e);
                failures += 1;
            }
        }
    }

    if fragments.is_empty() && failures == 0 {
        warn!(path = %path.display(), "No fragments found");
    }
    Ok((fragments, failures))
}
