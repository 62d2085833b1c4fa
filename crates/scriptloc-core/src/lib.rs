use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod locale;

pub use locale::{split_extension, LocaleSuffix};

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

pub const DEFAULT_LOCALE: &str = "zh-cn";
pub const DEFAULT_SOURCE_EXT: &str = "txt";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => f.write_str("file"),
            PathKind::Directory => f.write_str("directory"),
        }
    }
}

/// Errors that abort a whole invocation.
#[derive(Debug, Error)]
pub enum ScriptLocError {
    #[error("{expected} not found: {}", .path.display())]
    PathNotFound { path: PathBuf, expected: PathKind },
}

impl ScriptLocError {
    pub fn missing_dir(path: &Path) -> Self {
        Self::PathNotFound {
            path: path.to_path_buf(),
            expected: PathKind::Directory,
        }
    }

    pub fn missing_file(path: &Path) -> Self {
        Self::PathNotFound {
            path: path.to_path_buf(),
            expected: PathKind::File,
        }
    }
}

/// A character that has no GBK mapping, with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmappable {
    pub ch: char,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Unmappable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "U+{:04X} {:?} at {}:{}",
            self.ch as u32, self.ch, self.line, self.column
        )
    }
}

fn list_unmappable(items: &[Unmappable]) -> String {
    const SHOWN: usize = 8;
    let mut out = items
        .iter()
        .take(SHOWN)
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > SHOWN {
        out.push_str(&format!(", … (+{} more)", items.len() - SHOWN));
    }
    out
}

/// Errors scoped to a single file. They are recorded and the batch moves on.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("not valid UTF-8 text (invalid byte at offset {offset})")]
    Decode { offset: usize },
    #[error(
        "{} character(s) not representable in GBK: {}",
        .unmappable.len(),
        list_unmappable(.unmappable)
    )]
    Encode { unmappable: Vec<Unmappable> },
    #[error("translation failed: {0}")]
    Translation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FileError {
    /// Machine-readable kind used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FileError::Decode { .. } => "decode",
            FileError::Encode { .. } => "encode",
            FileError::Translation(_) => "translation",
            FileError::Io(_) => "io",
        }
    }
}

/// Skip-unless-forced check shared by every batch operation.
pub fn should_process(target: &Path, force: bool) -> bool {
    force || !target.exists()
}

/// Decode UTF-8 bytes, dropping a leading BOM if present.
pub fn decode_utf8(bytes: &[u8]) -> std::result::Result<&str, FileError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(body).map_err(|e| FileError::Decode {
        offset: e.valid_up_to() + (bytes.len() - body.len()),
    })
}

pub fn read_utf8_text(path: &Path) -> std::result::Result<String, FileError> {
    let bytes = std::fs::read(path)?;
    decode_utf8(&bytes).map(str::to_owned)
}

/// Replace `path` with `bytes` via a temp file in the same directory and a rename,
/// so readers never observe a half-written file. Parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let prefix = temp_prefix(path);
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    match std::fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(_) => set_default_permissions(tmp.as_file())?,
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn temp_prefix(path: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");
    prefix
}

#[cfg(unix)]
fn set_default_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn should_process_respects_force_and_existence() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a.zh-cn.txt");
        assert!(should_process(&p, false));
        fs::write(&p, "x").unwrap();
        assert!(!should_process(&p, false));
        assert!(should_process(&p, true));
    }

    #[test]
    fn decode_utf8_strips_bom_and_reports_offset() {
        assert_eq!(decode_utf8(b"\xEF\xBB\xBFhello").unwrap(), "hello");
        let err = decode_utf8(b"ab\xC4\xE3").unwrap_err();
        match err {
            FileError::Decode { offset } => assert_eq!(offset, 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err_kind(b"\xff"), "decode");
    }

    fn err_kind(bytes: &[u8]) -> &'static str {
        decode_utf8(bytes).unwrap_err().kind()
    }

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("npc").join("town").join("a.zh-cn.txt");
        write_atomic(&target, "第一版".as_bytes()).unwrap();
        write_atomic(&target, "第二版".as_bytes()).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "第二版");

        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn encode_error_lists_positions() {
        let err = FileError::Encode {
            unmappable: vec![Unmappable {
                ch: '😀',
                line: 3,
                column: 7,
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("U+1F600"), "{msg}");
        assert!(msg.contains("3:7"), "{msg}");
        assert_eq!(err.kind(), "encode");
    }
}
