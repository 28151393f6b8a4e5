//! Target registry
//!
//! Normalizes the configured targets once and indexes them by package name
//! and by alias. Everything downstream reads from here.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::warn;

use crate::config::{OverrideBody, TargetConfig};
use crate::error::ConfigError;
use crate::sanitizer::safe_ident;
use crate::synthesizer::NAMESPACE_EXPORT;

/// Prefix of the alias used when a target does not name one.
pub const DEFAULT_ALIAS_PREFIX: &str = "virtual:";

/// Export names an override may not claim.
const RESERVED_EXPORTS: &[&str] = &["default", NAMESPACE_EXPORT];

/// A target with every default applied.
#[derive(Debug, Clone)]
pub struct Target {
    pub package: String,
    pub alias: String,
    pub overrides: IndexMap<String, OverrideBody>,
    pub file_override: Option<PathBuf>,
    pub rewrite_side_effect_imports: bool,
}

impl Target {
    fn from_config(config: &TargetConfig) -> Self {
        Self {
            package: config.package.clone(),
            alias: config
                .alias
                .clone()
                .unwrap_or_else(|| format!("{}{}", DEFAULT_ALIAS_PREFIX, config.package)),
            overrides: config.overrides.clone(),
            file_override: config.file_override.clone(),
            rewrite_side_effect_imports: config.rewrite_side_effect_imports.unwrap_or(true),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut bound: HashMap<String, &str> = HashMap::new();
        for name in self.overrides.keys() {
            if RESERVED_EXPORTS.contains(&name.as_str()) {
                return Err(ConfigError::ReservedOverride {
                    package: self.package.clone(),
                    name: name.clone(),
                });
            }
            let ident = safe_ident(name).into_owned();
            if let Some(first) = bound.get(&ident) {
                return Err(ConfigError::OverrideCollision {
                    package: self.package.clone(),
                    first: first.to_string(),
                    second: name.clone(),
                    ident,
                });
            }
            bound.insert(ident, name);
        }
        Ok(())
    }
}

/// Targets in declared order, plus alias and package lookups.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
    by_alias: HashMap<String, usize>,
    by_package: HashMap<String, usize>,
}

impl TargetRegistry {
    /// Apply defaults to every target and index them. When two targets share
    /// an alias or a package, the later one shadows the earlier in lookups.
    pub fn new(configs: &[TargetConfig]) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for config in configs {
            let target = Target::from_config(config);
            target.validate()?;

            let index = registry.targets.len();
            if registry.by_alias.insert(target.alias.clone(), index).is_some() {
                warn!(alias = %target.alias, "alias configured twice, the later target wins");
            }
            if registry.by_package.insert(target.package.clone(), index).is_some() {
                warn!(package = %target.package, "package configured twice, the later target wins");
            }
            registry.targets.push(target);
        }
        Ok(registry)
    }

    pub fn by_alias(&self, alias: &str) -> Option<&Target> {
        self.by_alias.get(alias).map(|&i| &self.targets[i])
    }

    pub fn by_package(&self, package: &str) -> Option<&Target> {
        self.by_package.get(package).map(|&i| &self.targets[i])
    }

    /// Every configured target in declared order, shadowed ones included.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Distinct package names.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.by_package.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_apply_defaults() {
        let registry = TargetRegistry::new(&[TargetConfig::new("react")]).unwrap();
        let target = registry.by_package("react").unwrap();
        assert_eq!(target.alias, "virtual:react");
        assert!(target.rewrite_side_effect_imports);
        assert!(target.overrides.is_empty());
        assert!(registry.by_alias("virtual:react").is_some());
    }

    #[test]
    fn should_keep_explicit_settings() {
        let registry = TargetRegistry::new(&[TargetConfig::new("react")
            .with_alias("my-react")
            .with_side_effect_imports(false)])
        .unwrap();
        let target = registry.by_alias("my-react").unwrap();
        assert_eq!(target.package, "react");
        assert!(!target.rewrite_side_effect_imports);
        assert!(registry.by_alias("virtual:react").is_none());
    }

    #[test]
    fn later_duplicate_shadows_earlier() {
        let registry = TargetRegistry::new(&[
            TargetConfig::new("react").with_alias("a"),
            TargetConfig::new("react").with_alias("b"),
        ])
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_package("react").unwrap().alias, "b");
        assert_eq!(registry.by_alias("a").unwrap().alias, "a");
        assert_eq!(registry.packages().count(), 1);
    }

    #[test]
    fn should_reject_reserved_override_names() {
        for name in ["default", "__namespace"] {
            let err = TargetRegistry::new(&[TargetConfig::new("react").with_override(name, "1")])
                .unwrap_err();
            assert!(matches!(err, ConfigError::ReservedOverride { .. }), "{}", name);
        }
    }

    #[test]
    fn should_reject_overrides_mangling_to_same_identifier() {
        let err = TargetRegistry::new(&[TargetConfig::new("lib")
            .with_override("a-b", "1")
            .with_override("a.b", "2")])
        .unwrap_err();
        match err {
            ConfigError::OverrideCollision { first, second, ident, .. } => {
                assert_eq!(first, "a-b");
                assert_eq!(second, "a.b");
                assert_eq!(ident, "__a_b");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
