//! Virtual module synthesis
//!
//! The module behind an alias re-exposes the original package, with the
//! configured overrides bound in place of the matching exports:
//!
//! ```js
//! import * as original from "react";
//! export default original.default ?? original;
//! export const useState = original["useState"];
//! export const useMemo = (...args) => original.useMemo(...args);
//! export const __namespace = original;
//! ```
//!
//! Passthroughs read the namespace by string key so exotic names work and the
//! bundler never sees an `export *` that could turn ambiguous.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::LoadError;
use crate::exports::ExportEnumerator;
use crate::registry::{Target, TargetRegistry};
use crate::resolver::alias_of;
use crate::sanitizer::safe_ident;

/// Binding of the original package inside a virtual module.
pub const NAMESPACE_IDENT: &str = "original";

/// Export carrying the unfiltered original namespace.
pub const NAMESPACE_EXPORT: &str = "__namespace";

/// Produces the content behind virtual module ids.
pub struct VirtualModuleSynthesizer<'a> {
    registry: &'a TargetRegistry,
    enumerator: &'a ExportEnumerator,
    root: &'a Path,
}

impl<'a> VirtualModuleSynthesizer<'a> {
    pub fn new(registry: &'a TargetRegistry, enumerator: &'a ExportEnumerator, root: &'a Path) -> Self {
        Self {
            registry,
            enumerator,
            root,
        }
    }

    /// Content of the virtual module `id`, or `None` when `id` is not one of
    /// ours. Nothing is cached.
    pub fn load(&self, id: &str) -> Result<Option<String>, LoadError> {
        let Some(alias) = alias_of(id) else {
            return Ok(None);
        };
        let Some(target) = self.registry.by_alias(alias) else {
            return Ok(None);
        };

        if let Some(file) = &target.file_override {
            let path = self.root.join(file);
            info!(alias, path = %path.display(), "loading file override");
            return fs::read_to_string(&path)
                .map(Some)
                .map_err(|source| LoadError::FileOverride {
                    alias: alias.to_string(),
                    path,
                    source,
                });
        }

        let exports = self.enumerator.enumerate(&target.package);
        info!(
            alias,
            package = %target.package,
            exports = exports.len(),
            overrides = target.overrides.len(),
            "synthesizing virtual module"
        );
        synthesize(target, &exports).map(Some)
    }
}

/// Assemble the module source for `target` given the original's exports.
pub fn synthesize(target: &Target, exports: &BTreeSet<String>) -> Result<String, LoadError> {
    let ns = NAMESPACE_IDENT;
    let mut bindings = Bindings::new(&target.package);
    let mut out = Vec::with_capacity(exports.len() + target.overrides.len() + 3);

    out.push(format!("import * as {} from {};", ns, js_string(&target.package)));
    out.push(format!("export default {ns}.default ?? {ns};"));

    let passthroughs = exports
        .iter()
        .filter(|name| name.as_str() != "default" && !target.overrides.contains_key(name.as_str()));
    for name in passthroughs {
        let ident = bindings.claim(name)?;
        out.push(format!("export const {} = {}[{}];", ident, ns, js_string(name)));
    }

    for (name, body) in &target.overrides {
        let ident = bindings.claim(name)?;
        let rhs = body.evaluate(ns).map_err(|source| LoadError::Override {
            package: target.package.clone(),
            export: name.clone(),
            source,
        })?;
        out.push(format!("export const {} = {};", ident, rhs));
    }

    out.push(format!("export const {} = {};", NAMESPACE_EXPORT, ns));
    Ok(out.join("\n"))
}

/// Export identifiers already bound in the module being assembled.
struct Bindings<'a> {
    package: &'a str,
    claimed: HashMap<String, String>,
}

impl<'a> Bindings<'a> {
    fn new(package: &'a str) -> Self {
        let mut claimed = HashMap::new();
        claimed.insert(NAMESPACE_EXPORT.to_string(), NAMESPACE_EXPORT.to_string());
        Self { package, claimed }
    }

    fn claim(&mut self, name: &str) -> Result<String, LoadError> {
        let ident = safe_ident(name).into_owned();
        if let Some(first) = self.claimed.get(&ident) {
            return Err(LoadError::DuplicateBinding {
                package: self.package.to_string(),
                first: first.clone(),
                second: name.to_string(),
                ident,
            });
        }
        self.claimed.insert(ident.clone(), name.to_string());
        Ok(ident)
    }
}

fn js_string(value: &str) -> String {
    Value::from(value).to_string()
}
