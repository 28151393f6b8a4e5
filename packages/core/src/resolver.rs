//! Virtual module ids
//!
//! Aliases are turned into ids carrying a `\0` marker so that no other
//! resolver or the filesystem ever mistakes them for real paths.

use crate::registry::TargetRegistry;

/// Marker prefix of every virtual module id handed to the host.
pub const VIRTUAL_PREFIX: &str = "\0virtual:";

/// Resolve `specifier` to a virtual id if it is a configured alias.
pub fn resolve_specifier(registry: &TargetRegistry, specifier: &str) -> Option<String> {
    registry
        .by_alias(specifier)
        .map(|_| format!("{}{}", VIRTUAL_PREFIX, specifier))
}

/// The alias wrapped by a virtual id.
pub fn alias_of(id: &str) -> Option<&str> {
    id.strip_prefix(VIRTUAL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;

    #[test]
    fn should_resolve_known_alias() {
        let registry = TargetRegistry::new(&[TargetConfig::new("react").with_alias("my-react")]).unwrap();
        let id = resolve_specifier(&registry, "my-react").unwrap();
        assert_eq!(id, "\0virtual:my-react");
        assert_eq!(alias_of(&id), Some("my-react"));
    }

    #[test]
    fn should_not_resolve_package_name_or_unknown_specifier() {
        let registry = TargetRegistry::new(&[TargetConfig::new("react").with_alias("my-react")]).unwrap();
        assert_eq!(resolve_specifier(&registry, "react"), None);
        assert_eq!(resolve_specifier(&registry, "vue"), None);
    }

    #[test]
    fn default_alias_id_keeps_both_prefixes() {
        let registry = TargetRegistry::new(&[TargetConfig::new("react")]).unwrap();
        assert_eq!(
            resolve_specifier(&registry, "virtual:react").as_deref(),
            Some("\0virtual:virtual:react")
        );
    }

    #[test]
    fn non_virtual_ids_have_no_alias() {
        assert_eq!(alias_of("react"), None);
        assert_eq!(alias_of("/src/main.ts"), None);
    }
}
