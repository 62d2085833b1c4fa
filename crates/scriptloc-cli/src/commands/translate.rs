use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use color_eyre::eyre::{bail, eyre};
use scriptloc_config::TranslateCfg;
use scriptloc_parsers_npc::ScriptTranslator;
use scriptloc_services::{sync, SyncOptions, DEFAULT_ENCODED_SUFFIX};
use scriptloc_translate::{
    HttpConfig, HttpTranslator, StubTranslator, TimeoutTranslator, Translate,
};

use super::{OutputCtx, RunStatus, TranslateMode};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SOURCE_LANG: &str = "auto";

fn base_translator(
    endpoint: Option<&str>,
    dry_run: bool,
    cfg: &TranslateCfg,
    target: &str,
    timeout: Duration,
) -> color_eyre::Result<Box<dyn Translate + Send + Sync>> {
    let Some(endpoint) = endpoint else {
        if dry_run {
            return Ok(Box::new(StubTranslator::Echo));
        }
        bail!("no translation endpoint configured; pass --endpoint or set [translate].endpoint in scriptloc.toml");
    };

    if endpoint.starts_with("stub:") {
        let stub = StubTranslator::parse(endpoint)
            .ok_or_else(|| eyre!("unknown stub endpoint '{endpoint}'"))?;
        tracing::info!(event = "translate_stub", kind = ?stub);
        return Ok(Box::new(stub));
    }

    let http = HttpTranslator::new(HttpConfig {
        endpoint: endpoint.to_string(),
        api_key: cfg.api_key.clone(),
        source_lang: cfg
            .source_lang
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string()),
        target_lang: target.to_string(),
        timeout,
    })?;
    Ok(Box::new(TimeoutTranslator::new(http, timeout)))
}

#[allow(clippy::too_many_arguments)]
pub fn run_translate(
    root: PathBuf,
    recursive: bool,
    force: bool,
    dry_run: bool,
    mode: Option<TranslateMode>,
    endpoint: Option<String>,
    target: Option<String>,
    timeout_secs: Option<u64>,
    ctx: &OutputCtx,
) -> color_eyre::Result<RunStatus> {
    tracing::debug!(
        event = "translate_args",
        root = ?root,
        recursive = recursive,
        force = force,
        dry_run = dry_run,
        mode = ?mode,
        endpoint = ?endpoint,
        target = ?target,
        timeout_secs = ?timeout_secs
    );

    let cfg = super::load_cfg();
    let tcfg = cfg.translate.clone().unwrap_or_default();
    let locale = super::locale_of(&cfg);

    let mode = match (mode, tcfg.mode.as_deref()) {
        (Some(m), _) => m,
        (None, Some(s)) => TranslateMode::from_str(s, true)
            .map_err(|e| eyre!("invalid [translate].mode in config: {e}"))?,
        (None, None) => TranslateMode::Script,
    };
    let endpoint = endpoint.or_else(|| tcfg.endpoint.clone());
    let target = target
        .or_else(|| tcfg.target_lang.clone())
        .unwrap_or_else(|| locale.as_str().to_string());
    let timeout = Duration::from_secs(
        timeout_secs
            .or(tcfg.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );

    let base = base_translator(endpoint.as_deref(), dry_run, &tcfg, &target, timeout)?;
    let translator: Box<dyn Translate> = match mode {
        TranslateMode::Script => Box::new(ScriptTranslator::new(base)),
        TranslateMode::Whole => base,
    };

    let opts = SyncOptions {
        locale,
        source_ext: super::source_ext_of(&cfg),
        encoded_suffix: cfg
            .convert
            .as_ref()
            .and_then(|c| c.output_suffix.clone())
            .unwrap_or_else(|| DEFAULT_ENCODED_SUFFIX.to_string()),
        dry_run,
    };
    let summary = sync(&root, recursive, force, translator.as_ref(), &opts)?;
    super::print_batch_summary(ctx, &summary)
}
