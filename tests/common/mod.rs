//! Shared test helpers for gnatoms integration tests.
//!
//! All tests use temp directories — no side effects on the real tree. The
//! binary always runs inside its own temp dir so a stray `gnatoms.toml` in
//! the working directory cannot leak in.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Create an empty working directory.
pub fn setup_workdir() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}

/// Write `contents` to `dir/name`, returning the full path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(&path, contents).expect("failed to write file");
    path
}

/// Run gnatoms in `dir` with the given arguments.
pub fn gnatoms_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gnatoms"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("GNATOMS_LOG_FORMAT")
        .output()
        .expect("failed to execute gnatoms")
}

/// Run gnatoms and assert it succeeds. Returns stdout as string.
pub fn gnatoms_ok(dir: &Path, args: &[&str]) -> String {
    let out = gnatoms_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "gnatoms {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Run gnatoms and assert it fails. Returns stderr as string.
pub fn gnatoms_fails(dir: &Path, args: &[&str]) -> String {
    let out = gnatoms_in(dir, args);
    assert!(
        !out.status.success(),
        "Expected gnatoms {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}
