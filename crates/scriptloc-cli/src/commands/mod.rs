pub mod convert;
pub mod reconcile;
pub mod schema;
pub mod translate;

use clap::ValueEnum;
use owo_colors::OwoColorize;
use scriptloc_config::ScriptLocConfig;
use scriptloc_core::{LocaleSuffix, DEFAULT_LOCALE, DEFAULT_SOURCE_EXT};
use scriptloc_domain::BatchSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranslateMode {
    /// Translate only player-visible string literals
    Script,
    /// Send each file as a single text
    Whole,
}

#[derive(Debug, Clone, Copy)]
pub struct OutputCtx {
    pub format: OutputFormat,
    pub use_color: bool,
}

/// Whether a command found anything `--strict` should fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Clean,
    Issues,
}

/// Config from `scriptloc.toml`; a broken file is reported and ignored.
pub(crate) fn load_cfg() -> ScriptLocConfig {
    match scriptloc_config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(event = "config_load_failed", error = %e);
            crate::ui_warn!("ignoring configuration: {e}");
            ScriptLocConfig::default()
        }
    }
}

pub(crate) fn locale_of(cfg: &ScriptLocConfig) -> LocaleSuffix {
    LocaleSuffix::new(cfg.locale.as_deref().unwrap_or(DEFAULT_LOCALE))
}

pub(crate) fn source_ext_of(cfg: &ScriptLocConfig) -> String {
    cfg.source_ext
        .clone()
        .unwrap_or_else(|| DEFAULT_SOURCE_EXT.to_string())
}

pub(crate) fn emit_json<T: serde::Serialize>(value: &T) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, value)?;
    std::io::Write::write_all(&mut lock, b"\n")?;
    Ok(())
}

fn paint(n: usize, color: owo_colors::AnsiColors, use_color: bool) -> String {
    if use_color && n > 0 {
        n.color(color).to_string()
    } else {
        n.to_string()
    }
}

pub(crate) fn print_batch_summary(
    ctx: &OutputCtx,
    summary: &BatchSummary,
) -> color_eyre::Result<RunStatus> {
    let status = if summary.failed > 0 {
        RunStatus::Issues
    } else {
        RunStatus::Clean
    };
    if ctx.format == OutputFormat::Json {
        emit_json(summary)?;
        return Ok(status);
    }

    use owo_colors::AnsiColors::{Green, Red, Yellow};
    for f in &summary.failures {
        crate::ui_err!("{}: [{}] {}", f.path, f.kind, f.error);
    }
    for p in &summary.planned_paths {
        crate::ui_out!("PLAN {p}");
    }

    let mut line = format!(
        "{}: processed {}, skipped {}, failed {}",
        summary.operation,
        paint(summary.processed, Green, ctx.use_color),
        paint(summary.skipped, Yellow, ctx.use_color),
        paint(summary.failed, Red, ctx.use_color),
    );
    if summary.planned > 0 {
        line.push_str(&format!(", planned {}", summary.planned));
    }
    if summary.substitutions > 0 {
        line.push_str(&format!(", substitutions {}", summary.substitutions));
    }
    if status == RunStatus::Clean {
        crate::ui_ok!("{line}");
    } else {
        crate::ui_out!("✖ {line}");
    }
    Ok(status)
}
