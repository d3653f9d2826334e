//! Enforce deterministic temp file cleanup patterns in tests.
//!
//! All temp file creation must use the tempfile crate's RAII types rather
//! than the std temp-dir helper with manual cleanup, so interrupted test
//! runs leave nothing behind.

use std::fs;
use std::path::PathBuf;

/// Files exempt from the tempfile requirement, with justification.
const EXEMPT_FILES: &[&str] = &[];

fn find_workspace_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    loop {
        if dir.join("Cargo.toml").exists() && dir.join("crates").exists() {
            return dir;
        }
        assert!(dir.pop(), "workspace root not found");
    }
}

#[test]
fn test_no_manual_temp_dir_usage() {
    let crates_dir = find_workspace_root().join("crates");
    let mut violations: Vec<String> = Vec::new();
    // Assembled at runtime so this file does not flag itself.
    let needle = ["std::env::", "temp_dir()"].concat();

    for entry in walkdir::WalkDir::new(&crates_dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != "target")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
    {
        let path = entry.path();
        let path_str = path.to_string_lossy();

        if EXEMPT_FILES.iter().any(|exempt| path_str.contains(exempt)) {
            continue;
        }

        let content = fs::read_to_string(path).unwrap_or_default();

        // Only test code creates temp files in this workspace.
        if !content.contains("#[test]") && !content.contains("#[tokio::test]") {
            continue;
        }

        if content.contains(&needle) {
            violations.push(format!(
                "{}: uses {needle} - prefer tempfile::tempdir() for RAII cleanup",
                path.display()
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Found manual temp dir usage (not panic-safe):\n{}",
        violations.join("\n")
    );
}
