//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layering between
//! domain, application, and infrastructure is maintained.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

fn layer_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

/// Report every line under `layer` that mentions one of `forbidden`.
fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for file in collect_rs_files(&layer_dir(layer)) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if let Some(needle) = forbidden.iter().find(|n| line.contains(*n)) {
                found.push(format!("{rel}:{}: `{needle}` in {layer}/: {line}", i + 1));
            }
        }
    }
    found
}

#[test]
fn domain_is_pure() {
    let found = violations(
        "domain",
        &[
            "crate::infra",
            "crate::application",
            "crate::output",
            "tokio::",
            "russh",
            "std::fs",
            "std::net",
        ],
    );
    assert!(
        found.is_empty(),
        "Found I/O or outer-layer imports in domain/:\n{}",
        found.join("\n")
    );
}

#[test]
fn application_depends_only_on_domain() {
    let found = violations(
        "application",
        &["crate::infra", "crate::output", "crate::cli", "russh"],
    );
    assert!(
        found.is_empty(),
        "Found outer-layer imports in application/:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_presentation_imports_or_prints() {
    let found = violations(
        "infra",
        &["crate::output", "crate::cli", "println!", "eprintln!"],
    );
    assert!(
        found.is_empty(),
        "Found presentation concerns in infra/:\n{}",
        found.join("\n")
    );
}
