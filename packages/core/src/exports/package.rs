//! Package lookup
//!
//! Finds `node_modules/<package>` the way Node does, walking up from the
//! project root, and picks entry files from its `package.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const COMMONJS_CONDITIONS: &[&str] = &["require", "node", "default"];
const ESM_CONDITIONS: &[&str] = &["import", "module", "default"];
const FILE_SUFFIXES: &[&str] = &[".js", ".cjs", ".mjs", "/index.js", "/index.cjs", "/index.mjs"];

/// The subset of `package.json` used to find entry points.
#[derive(Debug, Default, Deserialize)]
pub struct PackageManifest {
    pub main: Option<String>,
    pub module: Option<String>,
    pub exports: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl PackageManifest {
    fn is_esm_package(&self) -> bool {
        self.kind.as_deref() == Some("module")
    }

    /// The `"."` entry of `exports`, which may also be written as the
    /// conditions object itself or a bare string.
    fn root_export(&self) -> Option<&Value> {
        match self.exports.as_ref()? {
            Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map.get("."),
            other => Some(other),
        }
    }

    fn conditional_entry(&self, conditions: &[&str]) -> Option<String> {
        self.root_export()
            .and_then(|value| pick_condition(value, conditions))
            .map(str::to_string)
    }

    /// Entry a `require()` would load.
    pub fn commonjs_entry(&self) -> Option<String> {
        if let Some(entry) = self.conditional_entry(COMMONJS_CONDITIONS) {
            return Some(entry);
        }
        match &self.main {
            Some(main) if !self.is_esm_package() || main.ends_with(".cjs") => Some(main.clone()),
            Some(_) => None,
            None if self.is_esm_package() => None,
            None => Some("index.js".to_string()),
        }
    }

    /// Entry a dynamic `import()` would load.
    pub fn esm_entry(&self) -> Option<String> {
        if let Some(entry) = self.conditional_entry(ESM_CONDITIONS) {
            return Some(entry);
        }
        if let Some(module) = &self.module {
            return Some(module.clone());
        }
        match &self.main {
            Some(main) if self.is_esm_package() || main.ends_with(".mjs") => Some(main.clone()),
            None if self.is_esm_package() => Some("index.js".to_string()),
            _ => None,
        }
    }
}

fn pick_condition<'a>(value: &'a Value, conditions: &[&str]) -> Option<&'a str> {
    match value {
        Value::String(entry) => Some(entry.as_str()),
        // Node tries conditions in the order the package lists them.
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| conditions.contains(&key.as_str()))
            .find_map(|(_, nested)| pick_condition(nested, conditions)),
        Value::Array(alternatives) => alternatives
            .iter()
            .find_map(|alternative| pick_condition(alternative, conditions)),
        _ => None,
    }
}

/// An installed package.
#[derive(Debug)]
pub struct InstalledPackage {
    pub dir: PathBuf,
    pub manifest: PackageManifest,
}

impl InstalledPackage {
    /// Find `package` in the nearest `node_modules` at or above `root`.
    pub fn locate(root: &Path, package: &str) -> Option<Self> {
        for dir in root.ancestors() {
            let package_dir = dir.join("node_modules").join(package);
            let manifest_path = package_dir.join("package.json");
            if !manifest_path.is_file() {
                continue;
            }

            let content = match fs::read_to_string(&manifest_path) {
                Ok(content) => content,
                Err(e) => {
                    debug!(path = %manifest_path.display(), error = %e, "unreadable package manifest");
                    return None;
                }
            };
            return match serde_json::from_str(&content) {
                Ok(manifest) => Some(Self {
                    dir: package_dir,
                    manifest,
                }),
                Err(e) => {
                    debug!(path = %manifest_path.display(), error = %e, "invalid package manifest");
                    None
                }
            };
        }
        None
    }

    /// Resolve an entry path from the manifest to an existing file.
    pub fn entry_file(&self, entry: &str) -> Option<PathBuf> {
        resolve_file(&self.dir.join(entry.trim_start_matches("./")))
    }
}

/// Apply Node's extension and index-file probing to `path`.
pub fn resolve_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    let base = path.to_string_lossy();
    FILE_SUFFIXES
        .iter()
        .map(|suffix| PathBuf::from(format!("{}{}", base, suffix)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> PackageManifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn plain_main_is_commonjs() {
        let m = manifest(r#"{ "main": "./cjs/lib.js" }"#);
        assert_eq!(m.commonjs_entry().as_deref(), Some("./cjs/lib.js"));
        assert_eq!(m.esm_entry(), None);
    }

    #[test]
    fn missing_main_defaults_to_index() {
        let m = manifest("{}");
        assert_eq!(m.commonjs_entry().as_deref(), Some("index.js"));
    }

    #[test]
    fn module_field_is_esm() {
        let m = manifest(r#"{ "main": "lib.cjs", "module": "lib.mjs" }"#);
        assert_eq!(m.commonjs_entry().as_deref(), Some("lib.cjs"));
        assert_eq!(m.esm_entry().as_deref(), Some("lib.mjs"));
    }

    #[test]
    fn type_module_main_is_esm_only() {
        let m = manifest(r#"{ "type": "module", "main": "index.js" }"#);
        assert_eq!(m.commonjs_entry(), None);
        assert_eq!(m.esm_entry().as_deref(), Some("index.js"));
    }

    #[test]
    fn exports_conditions_are_honoured() {
        let m = manifest(
            r#"{
                "main": "legacy.js",
                "exports": {
                    ".": {
                        "types": "./index.d.ts",
                        "import": "./esm/index.js",
                        "require": { "types": "./index.d.cts", "default": "./cjs/index.cjs" }
                    },
                    "./package.json": "./package.json"
                }
            }"#,
        );
        assert_eq!(m.commonjs_entry().as_deref(), Some("./cjs/index.cjs"));
        assert_eq!(m.esm_entry().as_deref(), Some("./esm/index.js"));
    }

    #[test]
    fn exports_shorthand_string() {
        let m = manifest(r#"{ "exports": "./main.js" }"#);
        assert_eq!(m.commonjs_entry().as_deref(), Some("./main.js"));
        assert_eq!(m.esm_entry().as_deref(), Some("./main.js"));
    }

    #[test]
    fn exports_conditions_without_subpaths() {
        let m = manifest(r#"{ "exports": { "import": "./a.mjs", "require": "./a.cjs" } }"#);
        assert_eq!(m.commonjs_entry().as_deref(), Some("./a.cjs"));
        assert_eq!(m.esm_entry().as_deref(), Some("./a.mjs"));
    }

    #[test]
    fn exports_conditions_follow_key_order() {
        let m = manifest(r#"{ "exports": { "default": "./a.js", "import": "./b.mjs" } }"#);
        assert_eq!(m.esm_entry().as_deref(), Some("./a.js"));
        assert_eq!(m.commonjs_entry().as_deref(), Some("./a.js"));

        let m = manifest(r#"{ "exports": { "node": { "import": "./n.mjs" }, "require": "./r.cjs" } }"#);
        assert_eq!(m.commonjs_entry().as_deref(), Some("./r.cjs"));
    }
}
