//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use datacatalog_core::assembler::{self, RebuildStats};
use datacatalog_core::pipeline::{self, ScanReporter};
use datacatalog_shared::{
    AppConfig, RebuildConfig, init_config, init_config_at, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// datacatalog: index a tree of CSV datasets into one catalog document.
#[derive(Parser, Debug)]
#[command(
    name = "datacatalog",
    version,
    about = "Rebuild catalog.json from CSV datasets and their metadata sidecars.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.datacatalog/datacatalog.toml.
    #[arg(long, global = true, env = "DATACATALOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `rebuild` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Rescan the data directory and rewrite the catalog.
    Rebuild(RebuildArgs),

    /// Check an existing catalog file for consistency.
    Validate {
        /// Catalog to check (defaults to the configured output path).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `rebuild`.
#[derive(Args, Debug, Default)]
pub(crate) struct RebuildArgs {
    /// Directory tree to scan.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Catalog file to write.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the catalog to stdout instead of writing the file.
    #[arg(long)]
    pub stdout: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr; stdout carries only command results.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "datacatalog=info",
        1 => "datacatalog=debug",
        _ => "datacatalog=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        None => cmd_rebuild(config_path, &RebuildArgs::default(), &mut stdout),
        Some(Command::Rebuild(args)) => cmd_rebuild(config_path, &args, &mut stdout),
        Some(Command::Validate { catalog }) => cmd_validate(config_path, catalog.as_deref()),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge config file values with `rebuild` flags (flags win).
fn resolve_rebuild_config(config: &AppConfig, args: &RebuildArgs) -> RebuildConfig {
    let mut resolved = RebuildConfig::from(config);
    if let Some(data_dir) = &args.data_dir {
        resolved.data_dir = data_dir.clone();
    }
    if let Some(output) = &args.output {
        resolved.output_path = output.clone();
    }
    resolved
}

/// Rebuild the catalog and write the command result to `out`.
fn cmd_rebuild(config_path: Option<&Path>, args: &RebuildArgs, out: &mut dyn Write) -> Result<()> {
    let config = resolve_rebuild_config(&load_app_config(config_path)?, args);

    info!(
        data_dir = %config.data_dir.display(),
        output = %config.output_path.display(),
        stdout = args.stdout,
        "rebuilding catalog"
    );

    let reporter = CliProgress::new();

    if args.stdout {
        config.validate()?;
        let outcome = assembler::build_catalog(&config, &reporter)?;
        writeln!(out, "{}", assembler::render_catalog(&outcome.document)?)?;
        return Ok(());
    }

    let result = pipeline::rebuild(&config, &reporter)?;
    info!(
        elapsed_ms = result.elapsed.as_millis() as u64,
        path = %result.output_path.display(),
        "catalog written"
    );
    writeln!(out, "Catalog rebuilt: {} datasets", result.document.total_datasets)?;

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>, catalog: Option<&Path>) -> Result<()> {
    let config = RebuildConfig::from(&load_app_config(config_path)?);
    let path = catalog.unwrap_or(config.output_path.as_path());

    let document = assembler::read_catalog(path)?;
    assembler::validate_catalog(&document, &config.root_dir_name)
        .wrap_err_with(|| format!("{} failed validation", path.display()))?;

    println!("Catalog valid: {} datasets", document.total_datasets);
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ScanReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn entry_built(&self, csv_path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Indexing [{current}/{total}] {csv_path}"));
    }

    fn sidecar_skipped(&self, path: &Path, _reason: &str) {
        self.spinner
            .set_message(format!("Skipped {}", path.display()));
    }

    fn done(&self, _stats: &RebuildStats) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "datacatalog-cli-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// An empty config file, so tests never read the user's real config.
    fn empty_config(dir: &Path) -> PathBuf {
        let path = dir.join("datacatalog.toml");
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_rebuild() {
        let cli = Cli::try_parse_from(["datacatalog"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn rebuild_flags_parse() {
        let cli = Cli::try_parse_from([
            "datacatalog",
            "-vv",
            "rebuild",
            "--data-dir",
            "published",
            "-o",
            "out/catalog.json",
            "--stdout",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Rebuild(args)) => {
                assert_eq!(args.data_dir, Some(PathBuf::from("published")));
                assert_eq!(args.output, Some(PathBuf::from("out/catalog.json")));
                assert!(args.stdout);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["datacatalog", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let config: AppConfig = toml::from_str(
            r#"
[catalog]
data_dir = "published"
output_path = "published/catalog.json"
"#,
        )
        .unwrap();

        let resolved = resolve_rebuild_config(&config, &RebuildArgs::default());
        assert_eq!(resolved.data_dir, PathBuf::from("published"));
        assert_eq!(resolved.output_path, PathBuf::from("published/catalog.json"));

        let args = RebuildArgs {
            output: Some(PathBuf::from("/tmp/catalog.json")),
            ..RebuildArgs::default()
        };
        let resolved = resolve_rebuild_config(&config, &args);
        assert_eq!(resolved.data_dir, PathBuf::from("published"));
        assert_eq!(resolved.output_path, PathBuf::from("/tmp/catalog.json"));
    }

    #[test]
    fn rebuild_reports_dataset_count() {
        let dir = temp_dir();
        let config = empty_config(&dir);
        let data = dir.join("data");
        std::fs::create_dir_all(data.join("economy")).unwrap();
        std::fs::write(data.join("economy/gdp.csv"), "a\n1\n").unwrap();
        std::fs::write(data.join("economy/gdp.meta.json"), r#"{"title": "GDP"}"#).unwrap();
        std::fs::write(data.join("cpi.csv"), "a\n1\n").unwrap();

        let output = dir.join("out/catalog.json");
        let args = RebuildArgs {
            data_dir: Some(data),
            output: Some(output.clone()),
            stdout: false,
        };
        let mut out = Vec::new();
        cmd_rebuild(Some(&config), &args, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Catalog rebuilt: 2 datasets\n");
        assert!(output.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rebuild_failure_is_an_error_and_writes_nothing() {
        let dir = temp_dir();
        let config = empty_config(&dir);
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("a.csv"), "a\n").unwrap();
        // A regular file where the output directory should be.
        std::fs::write(dir.join("blocker"), "").unwrap();

        let args = RebuildArgs {
            data_dir: Some(data),
            output: Some(dir.join("blocker/catalog.json")),
            stdout: false,
        };
        let mut out = Vec::new();
        let err = cmd_rebuild(Some(&config), &args, &mut out).unwrap_err();

        assert!(format!("{err:#}").contains("blocker"), "{err:#}");
        assert!(out.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rebuild_with_unparsable_config_fails() {
        let dir = temp_dir();
        let config = dir.join("datacatalog.toml");
        std::fs::write(&config, "[catalog\n").unwrap();

        let cli = Cli::try_parse_from([
            OsStr::new("datacatalog"),
            OsStr::new("--config"),
            config.as_os_str(),
        ])
        .unwrap();
        assert!(run(cli).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
