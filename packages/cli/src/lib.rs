#![deny(clippy::all)]

//! Command line front end for dependency overrides.
//!
//! Runs the same hooks a bundler would, for inspecting what a configuration
//! does to a project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use override_deps::OverrideDeps;
use rayon::prelude::*;

/// Result of running the rewrite pass over one file.
#[derive(Debug)]
pub enum FileOutcome {
    Rewritten { path: PathBuf, code: String },
    Unchanged { path: PathBuf },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Rewritten { path, .. } | FileOutcome::Unchanged { path } => path,
        }
    }
}

/// Expand glob patterns; plain paths are kept even if they match nothing so
/// that reading them reports the missing file.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            files.push(PathBuf::from(input));
            continue;
        }
        let matches = glob(input).with_context(|| format!("invalid glob pattern `{}`", input))?;
        for entry in matches {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Run the rewrite pass over `files` in parallel, in input order.
pub fn rewrite_files(plugin: &OverrideDeps, files: &[PathBuf]) -> Result<Vec<FileOutcome>> {
    files
        .par_iter()
        .map(|path| -> Result<FileOutcome> {
            let code = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let id = unit_id(path);
            Ok(match plugin.transform(&code, &id) {
                Some(code) => FileOutcome::Rewritten {
                    path: path.clone(),
                    code,
                },
                None => FileOutcome::Unchanged { path: path.clone() },
            })
        })
        .collect()
}

/// Unit ids are absolute, `/`-separated paths, as bundlers hand them out.
fn unit_id(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use override_deps::{ExportEnumerator, PluginOptions, TargetConfig};

    fn plugin() -> OverrideDeps {
        let options = PluginOptions::new(".").with_target(TargetConfig::new("react"));
        OverrideDeps::with_enumerator(options, ExportEnumerator::new(Vec::new())).unwrap()
    }

    #[test]
    fn should_expand_globs_and_keep_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "").unwrap();
        fs::write(dir.path().join("b.js"), "").unwrap();
        fs::write(dir.path().join("c.css"), "").unwrap();

        let pattern = format!("{}/*.js", dir.path().display());
        let files = expand_inputs(&[pattern, "missing.ts".to_string()]).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("a.js"),
                dir.path().join("b.js"),
                PathBuf::from("missing.ts"),
            ]
        );
    }

    #[test]
    fn should_rewrite_only_files_that_change() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app.js");
        let util = dir.path().join("util.js");
        fs::write(&app, "import React from 'react';").unwrap();
        fs::write(&util, "export const x = 1;").unwrap();

        let outcomes = rewrite_files(&plugin(), &[app.clone(), util.clone()]).unwrap();
        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            FileOutcome::Rewritten { path, code } => {
                assert_eq!(path, &app);
                assert_eq!(code, "import React from 'virtual:react';");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(&outcomes[1], FileOutcome::Unchanged { path } if path == &util));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = rewrite_files(&plugin(), &[PathBuf::from("/no/such/file.js")]);
        assert!(result.is_err());
    }
}
