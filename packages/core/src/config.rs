//! Plugin configuration
//!
//! Override rules as users write them, either built in Rust or loaded from a
//! JSON file:
//!
//! ```json
//! {
//!   "targets": [
//!     {
//!       "package": "react",
//!       "overrides": {
//!         "useMemo": { "template": "(...args) => {ns}.useMemo(...args)" },
//!         "version": "\"mocked\""
//!       }
//!     }
//!   ]
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{BoxError, ConfigError};

/// Placeholder replaced by the namespace identifier in template bodies.
pub const NAMESPACE_PLACEHOLDER: &str = "{ns}";

/// Generator receiving the namespace identifier and returning an expression.
pub type GeneratorFn = dyn Fn(&str) -> Result<String, BoxError> + Send + Sync;

/// Predicate over compilation unit ids deciding which units get rewritten.
pub type IncludeFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Right-hand side bound to an overridden export.
#[derive(Clone)]
pub enum OverrideBody {
    /// Expression emitted verbatim.
    Literal(String),
    /// Expression in which every `{ns}` becomes the namespace identifier.
    Template(String),
    /// Expression produced from the namespace identifier at load time.
    Generator(Arc<GeneratorFn>),
}

impl OverrideBody {
    pub fn literal(body: impl Into<String>) -> Self {
        OverrideBody::Literal(body.into())
    }

    pub fn template(template: impl Into<String>) -> Self {
        OverrideBody::Template(template.into())
    }

    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        OverrideBody::Generator(Arc::new(move |ns: &str| -> Result<String, BoxError> { Ok(f(ns)) }))
    }

    pub fn try_generator<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        OverrideBody::Generator(Arc::new(f))
    }

    /// Produce the expression for a module whose original namespace is bound
    /// to `namespace`.
    pub fn evaluate(&self, namespace: &str) -> Result<String, BoxError> {
        match self {
            OverrideBody::Literal(body) => Ok(body.clone()),
            OverrideBody::Template(template) => {
                Ok(template.replace(NAMESPACE_PLACEHOLDER, namespace))
            }
            OverrideBody::Generator(generator) => generator(namespace),
        }
    }
}

impl fmt::Debug for OverrideBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideBody::Literal(body) => f.debug_tuple("Literal").field(body).finish(),
            OverrideBody::Template(template) => f.debug_tuple("Template").field(template).finish(),
            OverrideBody::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<&str> for OverrideBody {
    fn from(body: &str) -> Self {
        OverrideBody::literal(body)
    }
}

impl From<String> for OverrideBody {
    fn from(body: String) -> Self {
        OverrideBody::Literal(body)
    }
}

/// One override rule.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Exact package name to override, e.g. `react`.
    pub package: String,
    /// Specifier imports get redirected to. Defaults to `virtual:<package>`.
    pub alias: Option<String>,
    /// Export name to replacement, in declared order.
    pub overrides: IndexMap<String, OverrideBody>,
    /// File whose content replaces the synthesized module entirely.
    /// Relative paths are resolved against [`PluginOptions::root`].
    pub file_override: Option<PathBuf>,
    /// Also redirect bare `import "<package>"`. Defaults to true.
    pub rewrite_side_effect_imports: Option<bool>,
}

impl TargetConfig {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            alias: None,
            overrides: IndexMap::new(),
            file_override: None,
            rewrite_side_effect_imports: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_override(mut self, name: impl Into<String>, body: impl Into<OverrideBody>) -> Self {
        self.overrides.insert(name.into(), body.into());
        self
    }

    pub fn with_file_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_override = Some(path.into());
        self
    }

    pub fn with_side_effect_imports(mut self, rewrite: bool) -> Self {
        self.rewrite_side_effect_imports = Some(rewrite);
        self
    }
}

/// Everything the plugin is constructed from.
#[derive(Clone)]
pub struct PluginOptions {
    pub targets: Vec<TargetConfig>,
    /// Units the rewrite pass inspects. `None` means [`default_include`].
    pub include: Option<IncludeFilter>,
    /// Base directory for file overrides and package discovery.
    pub root: PathBuf,
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions")
            .field("targets", &self.targets)
            .field("include", &self.include.as_ref().map(|_| ".."))
            .field("root", &self.root)
            .finish()
    }
}

impl PluginOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            targets: Vec::new(),
            include: None,
            root: root.into(),
        }
    }

    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_include<F>(mut self, include: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.include = Some(Arc::new(include));
        self
    }

    /// The include predicate in effect.
    pub fn include_filter(&self) -> IncludeFilter {
        self.include
            .clone()
            .unwrap_or_else(|| Arc::new(default_include))
    }

    /// Load options from a JSON file. A relative `root` is taken relative to
    /// the file's directory; a missing one means that directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&content, base_dir)
    }

    pub fn from_json_str(json: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawOptions = serde_json::from_str(json)?;
        raw.into_options(base_dir)
    }
}

/// Only user-land code: no dependencies, no virtual modules.
pub fn default_include(id: &str) -> bool {
    !id.contains("/node_modules/") && !id.starts_with('\0')
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    root: Option<PathBuf>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    targets: Vec<RawTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTarget {
    package: String,
    alias: Option<String>,
    #[serde(default)]
    overrides: IndexMap<String, RawOverrideBody>,
    file_override: Option<PathBuf>,
    rewrite_side_effect_imports: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOverrideBody {
    Literal(String),
    Template { template: String },
}

impl RawOptions {
    fn into_options(self, base_dir: &Path) -> Result<PluginOptions, ConfigError> {
        let root = match self.root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        };

        let targets = self
            .targets
            .into_iter()
            .map(|raw| TargetConfig {
                package: raw.package,
                alias: raw.alias,
                overrides: raw
                    .overrides
                    .into_iter()
                    .map(|(name, body)| {
                        let body = match body {
                            RawOverrideBody::Literal(body) => OverrideBody::Literal(body),
                            RawOverrideBody::Template { template } => OverrideBody::Template(template),
                        };
                        (name, body)
                    })
                    .collect(),
                file_override: raw.file_override,
                rewrite_side_effect_imports: raw.rewrite_side_effect_imports,
            })
            .collect();

        let include = if self.include.is_empty() && self.exclude.is_empty() {
            None
        } else {
            Some(glob_filter(&self.include, &self.exclude)?)
        };

        Ok(PluginOptions {
            targets,
            include,
            root,
        })
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn glob_filter(include: &[String], exclude: &[String]) -> Result<IncludeFilter, ConfigError> {
    let include = compile_patterns(include)?;
    let exclude = compile_patterns(exclude)?;
    Ok(Arc::new(move |id: &str| {
        default_include(id)
            && (include.is_empty() || include.iter().any(|p| p.matches(id)))
            && !exclude.iter().any(|p| p.matches(id))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_include_skips_dependencies_and_virtuals() {
        assert!(default_include("/app/src/main.tsx"));
        assert!(!default_include("/app/node_modules/react/index.js"));
        assert!(!default_include("\0virtual:react"));
        assert!(!default_include("\0commonjsHelpers.js"));
    }

    #[test]
    fn template_replaces_every_placeholder() {
        let body = OverrideBody::template("{ns}.a ?? {ns}.b");
        assert_eq!(body.evaluate("original").unwrap(), "original.a ?? original.b");
    }

    #[test]
    fn generator_receives_namespace() {
        let body = OverrideBody::generator(|ns| format!("{}.useMemo", ns));
        assert_eq!(body.evaluate("original").unwrap(), "original.useMemo");
    }

    #[test]
    fn generator_failure_is_returned() {
        let body = OverrideBody::try_generator(|_| Err("boom".into()));
        assert_eq!(body.evaluate("original").unwrap_err().to_string(), "boom");
    }

    #[test]
    fn builder_keeps_override_order() {
        let target = TargetConfig::new("react")
            .with_override("useState", "a")
            .with_override("useMemo", "b")
            .with_override("createElement", "c");
        let names: Vec<_> = target.overrides.keys().map(String::as_str).collect();
        assert_eq!(names, ["useState", "useMemo", "createElement"]);
    }
}
