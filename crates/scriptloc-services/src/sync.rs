use std::path::Path;

use scriptloc_core::{
    read_utf8_text, should_process, write_atomic, FileError, LocaleSuffix, Result,
    DEFAULT_SOURCE_EXT,
};
use scriptloc_domain::BatchSummary;
use scriptloc_translate::Translate;

use crate::convert::DEFAULT_ENCODED_SUFFIX;
use crate::tally::Tally;
use crate::walk::{walk, FileFilter};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub locale: LocaleSuffix,
    pub source_ext: String,
    /// Sibling suffix used by `convert`; those outputs are never treated as sources.
    pub encoded_suffix: String,
    /// List what would be translated without calling the service or writing.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            locale: LocaleSuffix::default(),
            source_ext: DEFAULT_SOURCE_EXT.to_string(),
            encoded_suffix: DEFAULT_ENCODED_SUFFIX.to_string(),
            dry_run: false,
        }
    }
}

/// Create the missing localized sibling of every source script under `root`.
///
/// Existing translations are kept unless `force`. Failures are recorded per file
/// and never stop the batch; only a missing `root` is an error.
pub fn sync<T: Translate + ?Sized>(
    root: &Path,
    recursive: bool,
    force: bool,
    translator: &T,
    opts: &SyncOptions,
) -> Result<BatchSummary> {
    let filter = FileFilter::sources(&opts.locale, &opts.source_ext, &opts.encoded_suffix);
    let mut tally = Tally::new("translate", root);

    for src in walk(root, filter, recursive)? {
        let target = opts.locale.localize(&src);
        if !should_process(&target, force) {
            tracing::debug!(event = "sync_file_skipped", path = %src.display(), target = %target.display());
            tally.skipped(&src);
            continue;
        }
        if opts.dry_run {
            tracing::info!(event = "sync_file_planned", path = %src.display(), target = %target.display());
            tally.planned(&src);
            continue;
        }

        match sync_file(&src, &target, translator) {
            Ok(()) => {
                tracing::info!(event = "sync_file_written", path = %src.display(), target = %target.display());
                tally.processed(Some(&target));
            }
            Err(e) => {
                tracing::warn!(
                    event = "sync_file_failed",
                    path = %src.display(),
                    kind = e.kind(),
                    error = %e
                );
                tally.failed(&src, &e);
            }
        }
    }

    let summary = tally.finish();
    tracing::info!(
        event = "sync_done",
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        planned = summary.planned
    );
    Ok(summary)
}

fn sync_file<T: Translate + ?Sized>(
    src: &Path,
    target: &Path,
    translator: &T,
) -> std::result::Result<(), FileError> {
    let text = read_utf8_text(src)?;
    let translated = translator
        .translate(&text)
        .map_err(|e| FileError::Translation(e.to_string()))?;
    if translated.trim().is_empty() && !text.trim().is_empty() {
        return Err(FileError::Translation("empty response".into()));
    }
    write_atomic(target, translated.as_bytes())?;
    Ok(())
}
