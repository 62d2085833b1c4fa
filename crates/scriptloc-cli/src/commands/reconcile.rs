use std::path::PathBuf;

use scriptloc_services::{reconcile, ReconcileOptions, DEFAULT_MARKER};

use super::{OutputCtx, OutputFormat, RunStatus};

pub fn run_reconcile(
    manifest: PathBuf,
    suffix: bool,
    project_root: Option<PathBuf>,
    marker: Option<String>,
    ctx: &OutputCtx,
) -> color_eyre::Result<RunStatus> {
    tracing::debug!(
        event = "reconcile_args",
        manifest = ?manifest,
        suffix = suffix,
        project_root = ?project_root,
        marker = ?marker
    );

    let cfg = super::load_cfg();
    let rcfg = cfg.reconcile.clone().unwrap_or_default();
    let opts = ReconcileOptions {
        locale: super::locale_of(&cfg),
        marker: marker
            .or(rcfg.marker)
            .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
        project_root: project_root
            .or_else(|| rcfg.project_root.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(".")),
        root_prefix: rcfg
            .root_prefix
            .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
        suffix,
    };

    let report = reconcile(&manifest, &opts)?;
    let status = if report.gaps.is_empty() {
        RunStatus::Clean
    } else {
        RunStatus::Issues
    };

    if ctx.format == OutputFormat::Json {
        super::emit_json(&report)?;
        return Ok(status);
    }

    for a in &report.anomalies {
        crate::ui_warn!("{}:{}: {} ({})", report.manifest, a.line, a.message, a.text);
    }
    for g in &report.gaps {
        crate::ui_out!("MISSING {}:{}: {}", report.manifest, g.line, g.reference);
    }
    for r in &report.rewrites {
        crate::ui_info!("{}:{}: {} -> {}", report.manifest, r.line, r.from, r.to);
    }
    crate::ui_out!(
        "All {}, with counterpart {}, already localized {}, missing {}, rewritten {}",
        report.total,
        report.with_counterpart,
        report.already_localized,
        report.gaps.len(),
        report.rewrites.len()
    );
    if report.written {
        crate::ui_ok!("Manifest updated: {}", report.manifest);
    }
    Ok(status)
}
