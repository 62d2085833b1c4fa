use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "scriptloc.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptLocConfig {
    /// Locale suffix inserted before the extension, e.g. `zh-cn`.
    pub locale: Option<String>,
    /// Extension of script files, without the dot.
    pub source_ext: Option<String>,
    pub translate: Option<TranslateCfg>,
    pub convert: Option<ConvertCfg>,
    pub reconcile: Option<ReconcileCfg>,
    pub schema: Option<SchemaCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateCfg {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub timeout_secs: Option<u64>,
    /// `script` or `whole`
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertCfg {
    pub in_place: Option<bool>,
    pub output_suffix: Option<String>,
    /// `strict` or `replace`
    pub on_unmappable: Option<String>,
    pub placeholder: Option<char>,
    pub translated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileCfg {
    pub marker: Option<String>,
    pub project_root: Option<String>,
    pub root_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default search order: `./scriptloc.toml`, then `$CONFIG_DIR/scriptloc/scriptloc.toml`.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(CONFIG_FILE_NAME));
    }
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("scriptloc").join(CONFIG_FILE_NAME));
    }
    paths
}

pub fn load_config() -> Result<ScriptLocConfig, ConfigError> {
    load_config_from(&config_search_paths())
}

/// Load and merge configs; earlier paths win field by field. Missing files are skipped.
pub fn load_config_from(paths: &[PathBuf]) -> Result<ScriptLocConfig, ConfigError> {
    let mut merged = ScriptLocConfig::default();
    for path in paths {
        if let Some(cfg) = read_config_file(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_config_file(path: &Path) -> Result<Option<ScriptLocConfig>, ConfigError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str::<ScriptLocConfig>(&s)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn merge(mut a: ScriptLocConfig, b: ScriptLocConfig) -> ScriptLocConfig {
    if a.locale.is_none() {
        a.locale = b.locale;
    }
    if a.source_ext.is_none() {
        a.source_ext = b.source_ext;
    }
    a.translate = merge_opt(a.translate, b.translate, merge_translate);
    a.convert = merge_opt(a.convert, b.convert, merge_convert);
    a.reconcile = merge_opt(a.reconcile, b.reconcile, merge_reconcile);
    a.schema = merge_opt(a.schema, b.schema, merge_schema);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_translate(mut a: TranslateCfg, b: TranslateCfg) -> TranslateCfg {
    if a.endpoint.is_none() {
        a.endpoint = b.endpoint;
    }
    if a.api_key.is_none() {
        a.api_key = b.api_key;
    }
    if a.source_lang.is_none() {
        a.source_lang = b.source_lang;
    }
    if a.target_lang.is_none() {
        a.target_lang = b.target_lang;
    }
    if a.timeout_secs.is_none() {
        a.timeout_secs = b.timeout_secs;
    }
    if a.mode.is_none() {
        a.mode = b.mode;
    }
    a
}
fn merge_convert(mut a: ConvertCfg, b: ConvertCfg) -> ConvertCfg {
    if a.in_place.is_none() {
        a.in_place = b.in_place;
    }
    if a.output_suffix.is_none() {
        a.output_suffix = b.output_suffix;
    }
    if a.on_unmappable.is_none() {
        a.on_unmappable = b.on_unmappable;
    }
    if a.placeholder.is_none() {
        a.placeholder = b.placeholder;
    }
    if a.translated_by.is_none() {
        a.translated_by = b.translated_by;
    }
    a
}
fn merge_reconcile(mut a: ReconcileCfg, b: ReconcileCfg) -> ReconcileCfg {
    if a.marker.is_none() {
        a.marker = b.marker;
    }
    if a.project_root.is_none() {
        a.project_root = b.project_root;
    }
    if a.root_prefix.is_none() {
        a.root_prefix = b.root_prefix;
    }
    a
}
fn merge_schema(mut a: SchemaCfg, b: SchemaCfg) -> SchemaCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn earlier_file_wins_per_field() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("local.toml");
        let global = dir.path().join("global.toml");
        fs::write(
            &local,
            "locale = \"zh-cn\"\n[convert]\nin_place = true\n",
        )
        .unwrap();
        fs::write(
            &global,
            "locale = \"ja\"\nsource_ext = \"txt\"\n[convert]\nin_place = false\nplaceholder = \"?\"\n[translate]\nendpoint = \"http://localhost:5000/translate\"\ntimeout_secs = 10\n",
        )
        .unwrap();

        let cfg = load_config_from(&[local, global]).unwrap();
        assert_eq!(cfg.locale.as_deref(), Some("zh-cn"));
        assert_eq!(cfg.source_ext.as_deref(), Some("txt"));
        let convert = cfg.convert.unwrap();
        assert_eq!(convert.in_place, Some(true));
        assert_eq!(convert.placeholder, Some('?'));
        let translate = cfg.translate.unwrap();
        assert_eq!(translate.timeout_secs, Some(10));
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempdir().unwrap();
        let cfg = load_config_from(&[dir.path().join("nope.toml")]).unwrap();
        assert!(cfg.locale.is_none());
        assert!(cfg.reconcile.is_none());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "locale = [").unwrap();
        let err = load_config_from(&[bad]).unwrap_err();
        assert!(err.to_string().contains("bad.toml"), "{err}");
    }
}
