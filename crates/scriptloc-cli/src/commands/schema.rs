use std::fs;
use std::path::PathBuf;

const DEFAULT_OUT_DIR: &str = "./docs/assets/schemas";

pub fn run_schema(out_dir: Option<PathBuf>) -> color_eyre::Result<()> {
    let cfg = super::load_cfg();
    let out_dir = out_dir.unwrap_or_else(|| {
        PathBuf::from(
            cfg.schema
                .and_then(|s| s.out_dir)
                .unwrap_or_else(|| DEFAULT_OUT_DIR.to_string()),
        )
    });
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
            tracing::debug!(event = "schema_written", path = %path.display());
        }};
    }
    dump!(scriptloc_domain::BatchSummary, "batch_summary.schema.json");
    dump!(scriptloc_domain::ReconcileReport, "reconcile_report.schema.json");
    crate::ui_ok!("Schemas written to {}", out_dir.display());
    Ok(())
}
