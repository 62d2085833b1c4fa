#![allow(dead_code)]

use std::path::Path;

/// Substring check that prints the head of the haystack on failure.
pub fn assert_contains_with_context(haystack: &str, needle: &str, context_msg: &str) {
    if haystack.contains(needle) {
        return;
    }
    let head = haystack.lines().take(10).collect::<Vec<_>>().join("\n");
    let mut sample: String = haystack.chars().take(200).collect();
    if haystack.chars().count() > 200 {
        sample.push('…');
    }
    panic!(
        "{}\n--- needle ---\n{}\n--- head(10) ---\n{}\n--- sample(200 chars) ---\n{}",
        context_msg, needle, head, sample
    );
}

/// Fails when `s` contains an ANSI escape (for `--no-color`).
pub fn assert_no_ansi(s: &str, context_msg: &str) {
    if let Some(pos) = s.bytes().position(|b| b == 0x1B) {
        let sample = s.lines().take(8).collect::<Vec<_>>().join("\n");
        panic!(
            "{}\nANSI escape at byte {}\n--- sample (first 8 lines) ---\n{}",
            context_msg, pos, sample
        );
    }
}

/// Run the binary in `cwd` and return (exit code, stdout, stderr).
pub fn run_cli_in(cwd: &Path, args: &[&str]) -> (i32, String, String) {
    let bin = env!("CARGO_BIN_EXE_scriptloc-cli");
    let output = std::process::Command::new(bin)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("SCRIPTLOC_LOG_DIR")
        .args(args)
        .output()
        .expect("failed to spawn scriptloc-cli");
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

pub fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{stdout}"))
}
