use std::path::{Path, PathBuf};

use scriptloc_core::{LocaleSuffix, Result, ScriptLocError};
use walkdir::WalkDir;

/// Which file names a batch operation picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub suffix: String,
    pub exclude: Vec<String>,
}

fn ends_with_ignore_ascii_case(name: &str, tail: &str) -> bool {
    name.len() >= tail.len()
        && name.is_char_boundary(name.len() - tail.len())
        && name[name.len() - tail.len()..].eq_ignore_ascii_case(tail)
}

impl FileFilter {
    /// Source scripts: `*.txt`, minus localized files and their encoded siblings.
    pub fn sources(locale: &LocaleSuffix, ext: &str, encoded_suffix: &str) -> Self {
        let ext = ext.trim_start_matches('.');
        let mut exclude = vec![locale.file_suffix(ext)];
        if !encoded_suffix.is_empty() {
            exclude.push(format!(".{}{}.{}", locale.as_str(), encoded_suffix, ext));
        }
        Self {
            suffix: format!(".{ext}"),
            exclude,
        }
    }

    /// Localized scripts: `*.zh-cn.txt`.
    pub fn translated(locale: &LocaleSuffix, ext: &str) -> Self {
        Self {
            suffix: locale.file_suffix(ext),
            exclude: Vec::new(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        ends_with_ignore_ascii_case(file_name, &self.suffix)
            && !self
                .exclude
                .iter()
                .any(|ex| ends_with_ignore_ascii_case(file_name, ex))
    }
}

/// Lazy, depth-first iterator over matching files. Entries are sorted by file
/// name within each directory, so the order is stable between runs.
pub struct Walk {
    inner: walkdir::IntoIter,
    filter: FileFilter,
}

impl Iterator for Walk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        event = "walk_entry_skipped",
                        path = ?e.path(),
                        error = %e
                    );
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if self.filter.matches(&entry.file_name().to_string_lossy()) {
                return Some(entry.into_path());
            }
        }
    }
}

pub fn walk(root: &Path, filter: FileFilter, recursive: bool) -> Result<Walk> {
    if !root.is_dir() {
        return Err(ScriptLocError::missing_dir(root).into());
    }
    let mut wd = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !recursive {
        wd = wd.max_depth(1);
    }
    tracing::debug!(event = "walk_start", root = %root.display(), recursive, suffix = %filter.suffix);
    Ok(Walk {
        inner: wd.into_iter(),
        filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn names(root: &Path, it: Walk) -> Vec<String> {
        it.map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("town/inner")).unwrap();
        for f in [
            "b.txt",
            "a.txt",
            "a.zh-cn.txt",
            "a.zh-cn_gbk.txt",
            "notes.md",
            "town/shop.TXT",
            "town/shop.ZH-CN.txt",
            "town/inner/guide.txt",
        ] {
            fs::write(root.join(f), "x").unwrap();
        }
        dir
    }

    #[test]
    fn sources_are_sorted_and_skip_localized() {
        let dir = tree();
        let filter = FileFilter::sources(&LocaleSuffix::default(), "txt", "_gbk");
        let got = names(dir.path(), walk(dir.path(), filter, true).unwrap());
        assert_eq!(
            got,
            vec!["a.txt", "b.txt", "town/inner/guide.txt", "town/shop.TXT"]
        );
    }

    #[test]
    fn non_recursive_stays_at_top_level() {
        let dir = tree();
        let filter = FileFilter::translated(&LocaleSuffix::default(), "txt");
        let got = names(dir.path(), walk(dir.path(), filter.clone(), false).unwrap());
        assert_eq!(got, vec!["a.zh-cn.txt"]);

        let got = names(dir.path(), walk(dir.path(), filter, true).unwrap());
        assert_eq!(got, vec!["a.zh-cn.txt", "town/shop.ZH-CN.txt"]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let filter = FileFilter::translated(&LocaleSuffix::default(), "txt");
        let err = walk(&dir.path().join("nope"), filter, true).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ScriptLocError>(),
            Some(ScriptLocError::PathNotFound { .. })
        ));
    }
}
