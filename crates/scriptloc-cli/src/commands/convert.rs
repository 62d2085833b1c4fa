use std::path::PathBuf;

use color_eyre::eyre::eyre;
use scriptloc_services::{
    convert, ConvertOptions, UnmappablePolicy, DEFAULT_ENCODED_SUFFIX, DEFAULT_PLACEHOLDER,
};

use super::{OutputCtx, RunStatus};

#[allow(clippy::too_many_arguments)]
pub fn run_convert(
    root: PathBuf,
    recursive: bool,
    force: bool,
    in_place: bool,
    on_unmappable: Option<UnmappablePolicy>,
    placeholder: Option<char>,
    translated_by: Option<String>,
    ctx: &OutputCtx,
) -> color_eyre::Result<RunStatus> {
    tracing::debug!(
        event = "convert_args",
        root = ?root,
        recursive = recursive,
        force = force,
        in_place = in_place,
        on_unmappable = ?on_unmappable,
        placeholder = ?placeholder,
        translated_by = ?translated_by
    );

    let cfg = super::load_cfg();
    let ccfg = cfg.convert.clone().unwrap_or_default();

    let policy = match (on_unmappable, ccfg.on_unmappable.as_deref()) {
        (Some(p), _) => p,
        (None, Some(s)) => s
            .parse::<UnmappablePolicy>()
            .map_err(|e| eyre!("invalid [convert].on_unmappable in config: {e}"))?,
        (None, None) => UnmappablePolicy::Strict,
    };

    let opts = ConvertOptions {
        locale: super::locale_of(&cfg),
        source_ext: super::source_ext_of(&cfg),
        in_place: in_place || ccfg.in_place.unwrap_or(false),
        output_suffix: ccfg
            .output_suffix
            .unwrap_or_else(|| DEFAULT_ENCODED_SUFFIX.to_string()),
        policy,
        placeholder: placeholder
            .or(ccfg.placeholder)
            .unwrap_or(DEFAULT_PLACEHOLDER),
        translated_by: translated_by.or(ccfg.translated_by),
    };
    tracing::info!(
        event = "convert_mode",
        in_place = opts.in_place,
        policy = %opts.policy,
        suffix = %opts.output_suffix
    );

    let summary = convert(&root, recursive, force, &opts)?;
    super::print_batch_summary(ctx, &summary)
}
