use std::path::{Path, PathBuf};

use crate::DEFAULT_LOCALE;

/// Split a file name into stem and extension the same way `Path::extension` does:
/// a leading dot does not start an extension and `..` has none.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    if name == ".." {
        return (name, None);
    }
    match name.rfind('.') {
        None | Some(0) => (name, None),
        Some(i) => (&name[..i], Some(&name[i + 1..])),
    }
}

fn ends_with_ignore_ascii_case(s: &str, tail: &str) -> bool {
    s.len() >= tail.len()
        && s.is_char_boundary(s.len() - tail.len())
        && s[s.len() - tail.len()..].eq_ignore_ascii_case(tail)
}

/// Locale marker inserted before a file's extension: `shop.txt` <-> `shop.zh-cn.txt`.
///
/// `localize` is total and injective; `unlocalize(localize(p)) == p` for every path
/// whose file name is valid UTF-8. Suffix matching ignores ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSuffix {
    locale: String,
}

impl Default for LocaleSuffix {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl LocaleSuffix {
    pub fn new(locale: impl Into<String>) -> Self {
        let locale: String = locale.into();
        Self {
            locale: locale.trim_start_matches('.').to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.locale
    }

    /// Full file-name suffix of a localized file with extension `ext`, e.g. `.zh-cn.txt`.
    pub fn file_suffix(&self, ext: &str) -> String {
        format!(".{}.{}", self.locale, ext.trim_start_matches('.'))
    }

    pub fn localize(&self, path: &Path) -> PathBuf {
        let Some(name) = path.file_name() else {
            let mut whole = path.as_os_str().to_owned();
            whole.push(".");
            whole.push(&self.locale);
            return PathBuf::from(whole);
        };
        let name_path = Path::new(name);
        let mut new_name = name_path.file_stem().unwrap_or(name).to_owned();
        new_name.push(".");
        new_name.push(&self.locale);
        if let Some(ext) = name_path.extension() {
            new_name.push(".");
            new_name.push(ext);
        }
        path.with_file_name(new_name)
    }

    pub fn unlocalize(&self, path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_str()?;
        let original = self.unlocalize_name(name)?;
        Some(path.with_file_name(original))
    }

    pub fn is_localized(&self, path: &Path) -> bool {
        self.unlocalize(path).is_some()
    }

    /// String twin of [`LocaleSuffix::localize`] for references found in manifests.
    /// Separators (`/` or `\`) and everything before the file name are kept verbatim.
    pub fn localize_reference(&self, reference: &str) -> String {
        let (dir, name) = split_reference(reference);
        if name.is_empty() {
            return format!("{reference}.{}", self.locale);
        }
        let (stem, ext) = split_extension(name);
        match ext {
            Some(ext) => format!("{dir}{stem}.{}.{ext}", self.locale),
            None => format!("{dir}{stem}.{}", self.locale),
        }
    }

    pub fn is_localized_reference(&self, reference: &str) -> bool {
        let (_, name) = split_reference(reference);
        self.unlocalize_name(name).is_some()
    }

    fn unlocalize_name(&self, name: &str) -> Option<String> {
        let (stem, ext) = split_extension(name);
        let ext = ext?;
        let marker = format!(".{}", self.locale);
        if stem.len() > marker.len() && ends_with_ignore_ascii_case(stem, &marker) {
            return Some(format!("{}.{ext}", &stem[..stem.len() - marker.len()]));
        }
        if ext.eq_ignore_ascii_case(&self.locale) {
            return Some(stem.to_string());
        }
        None
    }
}

fn split_reference(reference: &str) -> (&str, &str) {
    let cut = reference
        .rfind(['/', '\\'])
        .map(|i| i + 1)
        .unwrap_or(0);
    reference.split_at(cut)
}
