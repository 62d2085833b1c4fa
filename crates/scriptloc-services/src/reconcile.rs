use std::path::{Path, PathBuf};

use regex::bytes::Regex;
use scriptloc_core::{write_atomic, LocaleSuffix, Result, ScriptLocError};
use scriptloc_domain::{
    ManifestAnomaly, ReconcileReport, ReferenceGap, ReferenceRewrite, SCHEMA_VERSION,
};

pub const DEFAULT_MARKER: &str = "npc";

const COMMENT_STARTS: [&str; 3] = ["//", "#", ";"];

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub locale: LocaleSuffix,
    /// Key that introduces a reference, `npc` in `npc: npc/town/shop.txt`.
    pub marker: String,
    /// Base for references that start with `root_prefix`.
    pub project_root: PathBuf,
    pub root_prefix: String,
    /// Rewrite references whose localized counterpart exists.
    pub suffix: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            locale: LocaleSuffix::default(),
            marker: DEFAULT_MARKER.to_string(),
            project_root: PathBuf::from("."),
            root_prefix: DEFAULT_MARKER.to_string(),
            suffix: false,
        }
    }
}

impl ReconcileOptions {
    fn resolve(&self, reference: &str, manifest_dir: &Path) -> PathBuf {
        let normalized = reference.trim_start_matches(['/', '\\']);
        let lower = normalized.to_ascii_lowercase();
        let prefix = self.root_prefix.to_ascii_lowercase();
        let from_root = lower == prefix
            || lower.starts_with(&format!("{prefix}/"))
            || lower.starts_with(&format!("{prefix}\\"));
        if from_root {
            self.project_root.join(normalized.replace('\\', "/"))
        } else {
            manifest_dir.join(reference.replace('\\', "/"))
        }
    }
}

/// Where the reference sits in a line, as byte offsets into the line body.
enum Extracted {
    Reference { start: usize, end: usize },
    Anomaly(&'static str),
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn is_comment(line: &[u8]) -> bool {
    let first = line.iter().position(|b| !b.is_ascii_whitespace());
    let t = first.map_or(&line[..0], |i| &line[i..]);
    COMMENT_STARTS.iter().any(|c| t.starts_with(c.as_bytes()))
}

/// Narrow `start..end` past surrounding whitespace; never crosses over.
fn trim_span(body: &[u8], start: usize, end: usize) -> (usize, usize) {
    let t = &body[start..end];
    let lead = t.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let trail = t[lead..]
        .iter()
        .rev()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    (start + lead, end - trail)
}

fn extract(body: &[u8], group: regex::bytes::Match<'_>) -> Extracted {
    let start = group.start();
    let mut end = group.end();
    let text = &body[start..end];
    if let Some(cut) = COMMENT_STARTS
        .iter()
        .filter_map(|c| find_bytes(text, c.as_bytes()))
        .min()
    {
        end = start + cut;
    }

    let (mut start, mut end) = trim_span(body, start, end);
    let is_quote = |b: &u8| *b == b'"' || *b == b'\'';
    let t = &body[start..end];
    let opening = t.first().filter(|b| is_quote(*b));
    let closing = t.last().filter(|b| is_quote(*b));
    match (opening, closing) {
        (None, None) => {}
        (Some(o), Some(c)) if o == c && t.len() >= 2 => {
            (start, end) = trim_span(body, start + 1, end - 1);
        }
        _ => return Extracted::Anomaly("unbalanced quotes around reference"),
    }

    if start >= end {
        return Extracted::Anomaly("empty reference");
    }
    Extracted::Reference { start, end }
}

fn split_eol(line: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = line.strip_suffix(b"\r\n") {
        (body, &b"\r\n"[..])
    } else if let Some(body) = line.strip_suffix(b"\n") {
        (body, &b"\n"[..])
    } else {
        (line, &[][..])
    }
}

/// Check every script reference in `manifest` for a localized counterpart and,
/// with `opts.suffix`, point the reference at it. Lines are copied byte for byte
/// apart from the rewritten spans, so comments in a legacy encoding survive.
pub fn reconcile(manifest: &Path, opts: &ReconcileOptions) -> Result<ReconcileReport> {
    if !manifest.is_file() {
        return Err(ScriptLocError::missing_file(manifest).into());
    }
    let re = Regex::new(&format!(
        r"(?i)(?-u:\b){}\s*:\s*((?-u:[^\r\n])+)",
        regex::escape(&opts.marker)
    ))?;
    let manifest_dir = manifest.parent().unwrap_or(Path::new("."));
    let bytes = std::fs::read(manifest)?;

    let mut report = ReconcileReport {
        schema_version: SCHEMA_VERSION,
        manifest: manifest.display().to_string(),
        mode: if opts.suffix { "suffix" } else { "report" }.to_string(),
        total: 0,
        with_counterpart: 0,
        already_localized: 0,
        gaps: Vec::new(),
        rewrites: Vec::new(),
        anomalies: Vec::new(),
        written: false,
    };
    let mut out = Vec::with_capacity(bytes.len() + 64);

    for (idx, raw) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
        let line_no = idx + 1;
        let (body, eol) = split_eol(raw);
        if is_comment(body) {
            out.extend_from_slice(raw);
            continue;
        }
        let Some(group) = re.captures(body).and_then(|c| c.get(1)) else {
            out.extend_from_slice(raw);
            continue;
        };

        let extracted = match extract(body, group) {
            Extracted::Reference { start, end } => std::str::from_utf8(&body[start..end])
                .map(|reference| (start, end, reference))
                .map_err(|_| "reference is not valid UTF-8"),
            Extracted::Anomaly(message) => Err(message),
        };
        let (start, end, reference) = match extracted {
            Ok(found) => found,
            Err(message) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                tracing::warn!(event = "reconcile_anomaly", line = line_no, text = %text, reason = message);
                report.anomalies.push(ManifestAnomaly {
                    line: line_no,
                    text,
                    message: message.to_string(),
                });
                out.extend_from_slice(raw);
                continue;
            }
        };
        report.total += 1;

        if opts.locale.is_localized_reference(reference) {
            report.already_localized += 1;
            out.extend_from_slice(raw);
            continue;
        }

        let expected = opts.locale.localize(&opts.resolve(reference, manifest_dir));
        if !expected.is_file() {
            tracing::info!(event = "reconcile_gap", line = line_no, reference, expected = %expected.display());
            report.gaps.push(ReferenceGap {
                line: line_no,
                reference: reference.to_string(),
                expected: expected.display().to_string(),
            });
            out.extend_from_slice(raw);
            continue;
        }

        report.with_counterpart += 1;
        if opts.suffix {
            let localized = opts.locale.localize_reference(reference);
            tracing::debug!(event = "reconcile_rewrite", line = line_no, from = reference, to = %localized);
            out.extend_from_slice(&body[..start]);
            out.extend_from_slice(localized.as_bytes());
            out.extend_from_slice(&body[end..]);
            out.extend_from_slice(eol);
            report.rewrites.push(ReferenceRewrite {
                line: line_no,
                from: reference.to_string(),
                to: localized,
            });
        } else {
            out.extend_from_slice(raw);
        }
    }

    if opts.suffix && !report.rewrites.is_empty() {
        write_atomic(manifest, &out)?;
        report.written = true;
    }
    tracing::info!(
        event = "reconcile_done",
        manifest = %manifest.display(),
        total = report.total,
        with_counterpart = report.with_counterpart,
        gaps = report.gaps.len(),
        rewrites = report.rewrites.len(),
        written = report.written
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const MANIFEST: &str = "// npc: npc/a.txt\r\n\
npc: npc/a.txt\r\n\
npc: npc/b.txt // not yet\r\n\
\tNPC: \"local.txt\"\r\n\
npc: npc/c.zh-cn.txt\r\n\
npc:   \r\n\
npc: \"broken.txt\r\n\
import: conf/other.conf\r\n";

    fn project() -> (TempDir, PathBuf, ReconcileOptions) {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("npc")).unwrap();
        fs::create_dir_all(root.join("conf")).unwrap();
        fs::write(root.join("npc/a.zh-cn.txt"), "x").unwrap();
        fs::write(root.join("conf/local.zh-cn.txt"), "x").unwrap();
        let manifest = root.join("conf/scripts.conf");
        fs::write(&manifest, MANIFEST).unwrap();
        let opts = ReconcileOptions {
            project_root: root.to_path_buf(),
            ..ReconcileOptions::default()
        };
        (dir, manifest, opts)
    }

    #[test]
    fn report_mode_counts_and_leaves_bytes_alone() {
        let (_dir, manifest, opts) = project();
        let report = reconcile(&manifest, &opts).unwrap();

        assert_eq!(report.mode, "report");
        assert_eq!(report.total, 4);
        assert_eq!(report.with_counterpart, 2);
        assert_eq!(report.already_localized, 1);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].line, 3);
        assert_eq!(report.gaps[0].reference, "npc/b.txt");
        assert!(report.gaps[0].expected.ends_with("b.zh-cn.txt"));
        let lines: Vec<_> = report.anomalies.iter().map(|a| a.line).collect();
        assert_eq!(lines, vec![6, 7]);
        assert_eq!(report.anomalies[0].message, "empty reference");
        assert!(!report.written);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), MANIFEST);
    }

    #[test]
    fn suffix_mode_rewrites_only_references_with_counterparts() {
        let (_dir, manifest, opts) = project();
        let opts = ReconcileOptions {
            suffix: true,
            ..opts
        };
        let report = reconcile(&manifest, &opts).unwrap();
        assert!(report.written);
        assert_eq!(report.rewrites.len(), 2);
        assert_eq!(report.gaps.len(), 1);

        let expected = MANIFEST
            .replace("\r\nnpc: npc/a.txt\r\n", "\r\nnpc: npc/a.zh-cn.txt\r\n")
            .replace("\"local.txt\"", "\"local.zh-cn.txt\"");
        // the commented-out line keeps its original reference
        assert!(expected.starts_with("// npc: npc/a.txt\r\n"));
        assert_eq!(fs::read_to_string(&manifest).unwrap(), expected);

        let again = reconcile(&manifest, &opts).unwrap();
        assert!(!again.written);
        assert_eq!(again.already_localized, 3);
    }

    #[test]
    fn custom_marker_and_non_utf8_lines() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.zh-cn.txt"), "x").unwrap();
        let manifest = dir.path().join("m.conf");
        let mut bytes = b"script: x.txt\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe npc: x.txt\n");
        fs::write(&manifest, &bytes).unwrap();

        let opts = ReconcileOptions {
            marker: "script".into(),
            suffix: true,
            ..ReconcileOptions::default()
        };
        let report = reconcile(&manifest, &opts).unwrap();
        assert_eq!(report.total, 1);
        let mut expected = b"script: x.zh-cn.txt\n".to_vec();
        expected.extend_from_slice(b"\xff\xfe npc: x.txt\n");
        assert_eq!(fs::read(&manifest).unwrap(), expected);
    }

    #[test]
    fn gbk_inline_comments_keep_their_bytes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("npc")).unwrap();
        fs::write(root.join("npc/a.zh-cn.txt"), "x").unwrap();
        let manifest = root.join("scripts.conf");
        let mut bytes = b"npc: npc/a.txt // \xc9\xcc\xb5\xea\n".to_vec();
        bytes.extend_from_slice(b"npc: npc/b.txt // \xc9\xcc\n");
        fs::write(&manifest, &bytes).unwrap();

        let opts = ReconcileOptions {
            project_root: root.to_path_buf(),
            suffix: true,
            ..ReconcileOptions::default()
        };
        let report = reconcile(&manifest, &opts).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.rewrites.len(), 1);
        assert_eq!(report.rewrites[0].to, "npc/a.zh-cn.txt");
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].line, 2);
        assert!(report.anomalies.is_empty());

        let mut expected = b"npc: npc/a.zh-cn.txt // \xc9\xcc\xb5\xea\n".to_vec();
        expected.extend_from_slice(b"npc: npc/b.txt // \xc9\xcc\n");
        assert_eq!(fs::read(&manifest).unwrap(), expected);
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let dir = tempdir().unwrap();
        let err = reconcile(&dir.path().join("none.conf"), &ReconcileOptions::default())
            .err()
            .unwrap();
        assert!(err.downcast_ref::<ScriptLocError>().is_some());
    }
}
