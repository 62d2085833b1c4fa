use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileFailure {
    pub path: String,
    /// "decode" | "encode" | "translation" | "io"
    pub kind: String,
    pub error: String,
}

/// Outcome of a `translate` or `convert` batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    pub schema_version: u32,
    /// "translate" | "convert"
    pub operation: String,
    pub root: String,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files that would have been processed in a dry run.
    pub planned: usize,
    /// Output files written during this run.
    pub written: Vec<String>,
    pub skipped_paths: Vec<String>,
    pub planned_paths: Vec<String>,
    pub failures: Vec<FileFailure>,
    /// Placeholder substitutions made under the `replace` policy.
    pub substitutions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceGap {
    pub line: usize,
    pub reference: String,
    /// Localized path that was looked for.
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceRewrite {
    pub line: usize,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManifestAnomaly {
    pub line: usize,
    pub text: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReconcileReport {
    pub schema_version: u32,
    pub manifest: String,
    /// "report" | "suffix"
    pub mode: String,
    /// References found on non-comment lines, including already localized ones.
    pub total: usize,
    pub with_counterpart: usize,
    pub already_localized: usize,
    pub gaps: Vec<ReferenceGap>,
    pub rewrites: Vec<ReferenceRewrite>,
    pub anomalies: Vec<ManifestAnomaly>,
    /// True when the manifest was written back.
    pub written: bool,
}
