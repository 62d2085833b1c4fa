use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use color_eyre::eyre::eyre;
use encoding_rs::{EncoderResult, GBK};
use scriptloc_core::{
    decode_utf8, should_process, write_atomic, FileError, LocaleSuffix, Result, Unmappable,
    DEFAULT_SOURCE_EXT,
};
use scriptloc_domain::BatchSummary;

use crate::header::insert_translated_by_header;
use crate::tally::Tally;
use crate::walk::{walk, FileFilter};

pub const DEFAULT_ENCODED_SUFFIX: &str = "_gbk";
pub const DEFAULT_PLACEHOLDER: char = '?';

/// What to do with characters GBK cannot represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmappablePolicy {
    /// Fail the file and list every offending character.
    #[default]
    Strict,
    /// Substitute the placeholder and count the substitutions.
    Replace,
}

impl FromStr for UnmappablePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            other => Err(format!(
                "unknown unmappable policy '{other}' (expected strict or replace)"
            )),
        }
    }
}

impl fmt::Display for UnmappablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Replace => "replace",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub locale: LocaleSuffix,
    pub source_ext: String,
    /// Overwrite the localized file instead of writing a `<stem>_gbk.<ext>` sibling.
    pub in_place: bool,
    pub output_suffix: String,
    pub policy: UnmappablePolicy,
    pub placeholder: char,
    /// Credit line added to the script header before encoding.
    pub translated_by: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            locale: LocaleSuffix::default(),
            source_ext: DEFAULT_SOURCE_EXT.to_string(),
            in_place: false,
            output_suffix: DEFAULT_ENCODED_SUFFIX.to_string(),
            policy: UnmappablePolicy::Strict,
            placeholder: DEFAULT_PLACEHOLDER,
            translated_by: None,
        }
    }
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<()> {
        if gbk_bytes_of(self.placeholder).is_none() {
            return Err(eyre!(
                "placeholder {:?} is not representable in GBK",
                self.placeholder
            ));
        }
        if !self.in_place && self.output_suffix.is_empty() {
            return Err(eyre!("output suffix must not be empty unless converting in place"));
        }
        Ok(())
    }
}

/// GBK bytes plus the number of placeholder substitutions made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub substitutions: usize,
}

fn gbk_bytes_of(ch: char) -> Option<Vec<u8>> {
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = GBK.encode(ch.encode_utf8(&mut buf));
    (!had_errors).then(|| bytes.into_owned())
}

fn position(text: &str, at: usize, ch: char) -> Unmappable {
    let before = &text[..at];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Unmappable {
        ch,
        line: before.matches('\n').count() + 1,
        column: before[line_start..].chars().count() + 1,
    }
}

/// Encode UTF-8 text as GBK under `policy`.
pub fn encode_gbk(
    text: &str,
    policy: UnmappablePolicy,
    placeholder: char,
) -> std::result::Result<Encoded, FileError> {
    let replacement = match policy {
        UnmappablePolicy::Replace => gbk_bytes_of(placeholder).unwrap_or_else(|| vec![b'?']),
        UnmappablePolicy::Strict => Vec::new(),
    };

    let mut encoder = GBK.new_encoder();
    let mut out = Vec::with_capacity(
        encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len() * 2),
    );
    let mut unmappable = Vec::new();
    let mut substitutions = 0;
    let mut consumed = 0;

    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut out, true);
        consumed += read;
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => out.reserve(text.len() - consumed + 16),
            EncoderResult::Unmappable(ch) => {
                // already consumed by the encoder
                match policy {
                    UnmappablePolicy::Strict => {
                        unmappable.push(position(text, consumed - ch.len_utf8(), ch))
                    }
                    UnmappablePolicy::Replace => {
                        out.extend_from_slice(&replacement);
                        substitutions += 1;
                    }
                }
            }
        }
    }

    if !unmappable.is_empty() {
        return Err(FileError::Encode { unmappable });
    }
    Ok(Encoded {
        bytes: out,
        substitutions,
    })
}

/// Strict GBK decode; `None` when the bytes are not valid GBK.
pub fn decode_gbk(bytes: &[u8]) -> Option<String> {
    GBK.decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.into_owned())
}

/// Heuristic for in-place runs: bytes that are not UTF-8 were most likely encoded
/// already. Pure ASCII is the same in both encodings and reads as UTF-8.
pub fn looks_legacy_encoded(bytes: &[u8]) -> bool {
    decode_utf8(bytes).is_err()
}

/// `a.zh-cn.txt` -> `a.zh-cn_gbk.txt`.
pub fn encoded_path(path: &Path, suffix: &str) -> PathBuf {
    let Some(name) = path.file_name() else {
        let mut whole = path.as_os_str().to_owned();
        whole.push(suffix);
        return PathBuf::from(whole);
    };
    let name_path = Path::new(name);
    let mut new_name: OsString = name_path.file_stem().unwrap_or(name).to_owned();
    new_name.push(suffix);
    if let Some(ext) = name_path.extension() {
        new_name.push(".");
        new_name.push(ext);
    }
    path.with_file_name(new_name)
}

fn encode_file(bytes: &[u8], opts: &ConvertOptions) -> std::result::Result<Encoded, FileError> {
    let text = decode_utf8(bytes)?;
    let text = match &opts.translated_by {
        Some(author) => insert_translated_by_header(text, author),
        None => text.into(),
    };
    encode_gbk(&text, opts.policy, opts.placeholder)
}

enum Outcome {
    Written(Encoded),
    Unchanged,
}

fn convert_file(
    src: &Path,
    dest: &Path,
    opts: &ConvertOptions,
) -> std::result::Result<Outcome, FileError> {
    let bytes = std::fs::read(src)?;
    let encoded = encode_file(&bytes, opts)?;
    let existing = if dest == src {
        Some(bytes)
    } else {
        std::fs::read(dest).ok()
    };
    if existing.as_deref() == Some(encoded.bytes.as_slice()) {
        return Ok(Outcome::Unchanged);
    }
    write_atomic(dest, &encoded.bytes)?;
    Ok(Outcome::Written(encoded))
}

/// Encode every localized script under `root` as GBK.
pub fn convert(
    root: &Path,
    recursive: bool,
    force: bool,
    opts: &ConvertOptions,
) -> Result<BatchSummary> {
    opts.validate()?;
    let filter = FileFilter::translated(&opts.locale, &opts.source_ext);
    let mut tally = Tally::new("convert", root);

    for src in walk(root, filter, recursive)? {
        let dest = if opts.in_place {
            src.clone()
        } else {
            encoded_path(&src, &opts.output_suffix)
        };

        if opts.in_place {
            if !force {
                match std::fs::read(&src) {
                    Ok(bytes) if looks_legacy_encoded(&bytes) => {
                        tracing::debug!(event = "convert_file_skipped", path = %src.display(), reason = "not utf-8");
                        tally.skipped(&src);
                        continue;
                    }
                    _ => {}
                }
            }
        } else if !should_process(&dest, force) {
            tracing::debug!(event = "convert_file_skipped", path = %src.display(), reason = "exists");
            tally.skipped(&src);
            continue;
        }

        match convert_file(&src, &dest, opts) {
            Ok(Outcome::Written(enc)) => {
                if enc.substitutions > 0 {
                    tracing::warn!(
                        event = "convert_substituted",
                        path = %src.display(),
                        count = enc.substitutions,
                        placeholder = %opts.placeholder
                    );
                }
                tracing::info!(event = "convert_file_written", path = %src.display(), dest = %dest.display());
                tally.substitutions(enc.substitutions);
                tally.processed(Some(&dest));
            }
            Ok(Outcome::Unchanged) => {
                tracing::debug!(event = "convert_file_unchanged", path = %src.display());
                tally.processed(None);
            }
            Err(e) => {
                tracing::warn!(
                    event = "convert_file_failed",
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
        event = "convert_done",
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TEXT: &str = "//= 商店\r\nmes \"你好，冒险者！\";\r\n";

    #[test]
    fn gbk_round_trip() {
        let enc = encode_gbk(TEXT, UnmappablePolicy::Strict, '?').unwrap();
        assert_eq!(enc.substitutions, 0);
        assert_ne!(enc.bytes, TEXT.as_bytes());
        assert_eq!(decode_gbk(&enc.bytes).unwrap(), TEXT);
        assert!(looks_legacy_encoded(&enc.bytes));
    }

    #[test]
    fn strict_reports_every_unmappable_position() {
        let err = encode_gbk("ok\nab😀c🎉", UnmappablePolicy::Strict, '?').unwrap_err();
        match err {
            FileError::Encode { unmappable } => {
                let pos: Vec<_> = unmappable.iter().map(|u| (u.ch, u.line, u.column)).collect();
                assert_eq!(pos, vec![('😀', 2, 3), ('🎉', 2, 5)]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn replace_substitutes_placeholder() {
        let enc = encode_gbk("a😀b😀", UnmappablePolicy::Replace, '?').unwrap();
        assert_eq!(enc.bytes, b"a?b?");
        assert_eq!(enc.substitutions, 2);
    }

    #[test]
    fn placeholder_must_be_encodable() {
        let opts = ConvertOptions {
            policy: UnmappablePolicy::Replace,
            placeholder: '😀',
            ..ConvertOptions::default()
        };
        assert!(opts.validate().is_err());
        assert!(ConvertOptions::default().validate().is_ok());
    }

    #[test]
    fn policy_parses() {
        assert_eq!("Replace".parse::<UnmappablePolicy>(), Ok(UnmappablePolicy::Replace));
        assert!("lossy".parse::<UnmappablePolicy>().is_err());
    }

    #[test]
    fn encoded_sibling_name() {
        assert_eq!(
            encoded_path(Path::new("npc/a.zh-cn.txt"), "_gbk"),
            PathBuf::from("npc/a.zh-cn_gbk.txt")
        );
    }

    #[test]
    fn sibling_mode_skips_existing_unless_forced() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.zh-cn.txt");
        fs::write(&src, TEXT).unwrap();
        let opts = ConvertOptions::default();

        let first = convert(dir.path(), false, false, &opts).unwrap();
        assert_eq!(first.processed, 1);
        let out = dir.path().join("a.zh-cn_gbk.txt");
        assert_eq!(decode_gbk(&fs::read(&out).unwrap()).unwrap(), TEXT);
        assert_eq!(fs::read_to_string(&src).unwrap(), TEXT);

        let second = convert(dir.path(), false, false, &opts).unwrap();
        assert_eq!((second.processed, second.skipped), (0, 1));

        fs::write(&out, b"stale").unwrap();
        let forced = convert(dir.path(), false, true, &opts).unwrap();
        assert_eq!(forced.processed, 1);
        assert_eq!(decode_gbk(&fs::read(&out).unwrap()).unwrap(), TEXT);
    }

    #[test]
    fn in_place_is_idempotent_and_never_double_encodes() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.zh-cn.txt");
        fs::write(&src, TEXT).unwrap();
        let opts = ConvertOptions {
            in_place: true,
            ..ConvertOptions::default()
        };

        convert(dir.path(), false, false, &opts).unwrap();
        let once = fs::read(&src).unwrap();

        let again = convert(dir.path(), false, false, &opts).unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(fs::read(&src).unwrap(), once);

        let forced = convert(dir.path(), false, true, &opts).unwrap();
        assert_eq!(forced.failed, 1);
        assert_eq!(forced.failures[0].kind, "decode");
        assert_eq!(fs::read(&src).unwrap(), once);
    }

    #[test]
    fn unmappable_file_fails_without_writing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.zh-cn.txt"), "mes \"hi 😀\";").unwrap();
        fs::write(dir.path().join("b.zh-cn.txt"), "mes \"你好\";").unwrap();

        let summary = convert(dir.path(), false, false, &ConvertOptions::default()).unwrap();
        assert_eq!((summary.processed, summary.failed), (1, 1));
        assert_eq!(summary.failures[0].kind, "encode");
        assert!(summary.failures[0].error.contains("1:9"));
        assert!(!dir.path().join("a.zh-cn_gbk.txt").exists());

        let opts = ConvertOptions {
            policy: UnmappablePolicy::Replace,
            ..ConvertOptions::default()
        };
        let replaced = convert(dir.path(), false, false, &opts).unwrap();
        assert_eq!(replaced.substitutions, 1);
        assert_eq!(
            fs::read(dir.path().join("a.zh-cn_gbk.txt")).unwrap(),
            b"mes \"hi ?\";"
        );
    }

    #[test]
    fn header_is_added_when_requested() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.zh-cn.txt"), "//= 商店\nmes \"好\";\n").unwrap();
        let opts = ConvertOptions {
            translated_by: Some("dsc".into()),
            ..ConvertOptions::default()
        };
        convert(dir.path(), false, false, &opts).unwrap();
        let out = decode_gbk(&fs::read(dir.path().join("a.zh-cn_gbk.txt")).unwrap()).unwrap();
        assert!(out.starts_with("//= 商店\n//===== Translated By: "), "{out}");
        assert!(out.contains("\n//= dsc\nmes"));
    }
}
