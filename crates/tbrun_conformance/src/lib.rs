//! Conformance test helpers for the tbrun harness.
//!
//! Provides a throwaway repository with module directories and manifests, a
//! harness configuration built through the same environment path the CLI
//! uses, and a small builder for verdict waveforms.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tbrun_config::{load_config_with, HarnessConfig};
use tempfile::TempDir;

/// A temporary repository root holding module directories.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Creates `rel_dir` with a `filelist.json` naming `top` and `files`.
    pub fn add_module(&self, rel_dir: &str, top: &str, files: &[&str]) -> PathBuf {
        let module = self.root().join(rel_dir);
        fs::create_dir_all(&module).unwrap();
        let manifest = serde_json::json!({ "top": top, "files": files });
        fs::write(module.join("filelist.json"), manifest.to_string()).unwrap();
        module
    }

    /// Writes a file relative to the repository root.
    pub fn write(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.root().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Loads the harness configuration with `REPO_ROOT` at this repository.
    pub fn config(&self, sim: &str) -> HarnessConfig {
        let vars: HashMap<&str, String> = [
            ("REPO_ROOT", self.root().display().to_string()),
            ("SIM", sim.to_string()),
        ]
        .into_iter()
        .collect();
        load_config_with(|name| vars.get(name).cloned(), None).unwrap()
    }

    /// Canonical form of a module directory, matching [`Repo::config`]'s root.
    pub fn canonical(&self, path: &Path) -> PathBuf {
        path.canonicalize().unwrap()
    }
}

impl Default for Repo {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a VCD with `tb.dut.error_o` (id `e`) and `tb.dut.pass_o` (id `p`).
///
/// Each change is `(time_ns, signal, value)` where signal is `'e'` or `'p'`
/// and value is one of `0 1 x z`. Changes are emitted in the given order.
pub fn verdict_vcd(changes: &[(u64, char, char)]) -> String {
    let mut out = String::from(
        "$timescale 1ns $end\n\
         $scope module tb $end\n\
         $scope module dut $end\n\
         $var wire 1 e error_o $end\n\
         $var wire 1 p pass_o $end\n\
         $var wire 1 c clk $end\n\
         $upscope $end\n\
         $upscope $end\n\
         $enddefinitions $end\n",
    );
    let mut last = None;
    for &(t, signal, value) in changes {
        if last != Some(t) {
            out.push_str(&format!("#{t}\n"));
            last = Some(t);
        }
        out.push_str(&format!("{value}{signal}\n"));
    }
    out
}
