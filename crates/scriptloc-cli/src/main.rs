use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use scriptloc_services::UnmappablePolicy;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod ui;

use commands::{OutputCtx, OutputFormat, RunStatus, TranslateMode};

#[derive(Parser)]
#[command(
    name = "scriptloc",
    version,
    about = "Localization toolkit for rAthena NPC scripts"
)]
struct Cli {
    /// Output format for summaries and reports
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only log warnings and errors to the console
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Exit with status 1 when any file failed or any reference has no counterpart
    #[arg(long, global = true)]
    strict: bool,

    /// Also write debug logs to a daily rolling file in this directory
    #[arg(long, global = true, env = "SCRIPTLOC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create missing `<name>.zh-cn.txt` translations of source scripts
    Translate {
        root: PathBuf,
        #[arg(short, long)]
        recursive: bool,
        /// Re-translate even when the localized file exists
        #[arg(long)]
        force: bool,
        /// List what would be translated without calling the service
        #[arg(long)]
        dry_run: bool,
        /// `script` sends only player-visible strings, `whole` sends entire files
        #[arg(long, value_enum)]
        mode: Option<TranslateMode>,
        /// LibreTranslate-compatible URL, or `stub:<kind>` for an offline translator
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Encode localized scripts as GBK
    Convert {
        root: PathBuf,
        #[arg(short, long)]
        recursive: bool,
        /// Regenerate outputs that already exist
        #[arg(long)]
        force: bool,
        /// Overwrite the localized file instead of writing `<stem>_gbk.<ext>`
        #[arg(long)]
        in_place: bool,
        /// `strict` fails the file, `replace` substitutes the placeholder
        #[arg(long)]
        on_unmappable: Option<UnmappablePolicy>,
        #[arg(long)]
        placeholder: Option<char>,
        /// Add a `Translated By` credit to each script header
        #[arg(long)]
        translated_by: Option<String>,
    },

    /// Check manifest `npc:` references for localized counterparts
    Reconcile {
        manifest: PathBuf,
        /// Rewrite references whose localized counterpart exists
        #[arg(long)]
        suffix: bool,
        /// Base directory for references starting with `npc/`
        #[arg(long)]
        project_root: Option<PathBuf>,
        #[arg(long)]
        marker: Option<String>,
    },

    /// Write JSON Schemas of the reports
    Schema {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Translate { .. } => "translate",
            Commands::Convert { .. } => "convert",
            Commands::Reconcile { .. } => "reconcile",
            Commands::Schema { .. } => "schema",
        }
    }
}

trait Runnable {
    fn run(self, ctx: &OutputCtx) -> Result<RunStatus>;
}

impl Runnable for Commands {
    fn run(self, ctx: &OutputCtx) -> Result<RunStatus> {
        let cmd_name = self.name();
        info!("▶ Starting command: {}", cmd_name);

        let result = match self {
            Commands::Translate {
                root,
                recursive,
                force,
                dry_run,
                mode,
                endpoint,
                target,
                timeout_secs,
            } => commands::translate::run_translate(
                root,
                recursive,
                force,
                dry_run,
                mode,
                endpoint,
                target,
                timeout_secs,
                ctx,
            ),
            Commands::Convert {
                root,
                recursive,
                force,
                in_place,
                on_unmappable,
                placeholder,
                translated_by,
            } => commands::convert::run_convert(
                root,
                recursive,
                force,
                in_place,
                on_unmappable,
                placeholder,
                translated_by,
                ctx,
            ),
            Commands::Reconcile {
                manifest,
                suffix,
                project_root,
                marker,
            } => commands::reconcile::run_reconcile(manifest, suffix, project_root, marker, ctx),
            Commands::Schema { out_dir } => {
                commands::schema::run_schema(out_dir).map(|_| RunStatus::Clean)
            }
        };

        match &result {
            Ok(_) => info!("✔ Finished command: {}", cmd_name),
            Err(e) => error!("✖ Command {} failed: {:?}", cmd_name, e),
        }

        result
    }
}

fn init_tracing(log_dir: Option<&Path>, quiet: bool, ansi: bool) -> Option<WorkerGuard> {
    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = rolling::daily(dir, "scriptloc.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let guard = init_tracing(
        cli.log_dir.as_deref(),
        cli.quiet,
        !cli.no_color && !no_color_env && std::io::stderr().is_terminal(),
    );

    let ctx = OutputCtx {
        format: cli.format,
        use_color: !cli.no_color && !no_color_env && std::io::stdout().is_terminal(),
    };

    let status = cli.cmd.run(&ctx)?;
    if cli.strict && status == RunStatus::Issues {
        warn!(event = "strict_exit", "issues found; exiting with status 1");
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}
