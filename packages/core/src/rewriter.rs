//! Import specifier rewriting
//!
//! Redirects static imports and re-exports of overridden packages to their
//! aliases. This is a text pass over common statement shapes, not a parse:
//!
//! - `import X from "pkg"`, `import { a } from "pkg"`, `import * as X from "pkg"`
//! - `import "pkg"` (unless the target opts out)
//! - `export * from "pkg"`
//! - `export { a } from "pkg"`
//!
//! Only the quoted specifier changes. Dynamic `import("pkg")`, `require` and
//! `export * as ns from "pkg"` are left alone.

use std::borrow::Cow;

use regex::{Captures, Regex};
use tracing::debug;

use crate::config::IncludeFilter;
use crate::error::ConfigError;
use crate::registry::{Target, TargetRegistry};

/// Compiled rewrite rules for one target.
#[derive(Debug)]
struct TargetRules {
    alias: String,
    import_from: Regex,
    side_effect: Option<Regex>,
    export_all: Regex,
    export_named: Regex,
}

impl TargetRules {
    fn new(target: &Target) -> Result<Self, ConfigError> {
        let pkg = regex::escape(&target.package);
        let specifier = format!(r#"('{pkg}'|"{pkg}")"#);
        let rule = |head: &str| Regex::new(&format!("({}){}", head, specifier));

        Ok(Self {
            alias: target.alias.clone(),
            import_from: rule(r#"\bimport\s+[^'"]*?\sfrom\s*"#)?,
            side_effect: if target.rewrite_side_effect_imports {
                Some(rule(r"\bimport\s*")?)
            } else {
                None
            },
            export_all: rule(r"\bexport\s+\*\s+from\s*")?,
            export_named: rule(r"\bexport\s+\{[^}]*\}\s+from\s*")?,
        })
    }

    fn apply(&self, code: &str) -> String {
        let code = redirect(&self.import_from, code, &self.alias);
        let code = match &self.side_effect {
            Some(re) => Cow::Owned(redirect(re, &code, &self.alias).into_owned()),
            None => code,
        };
        let code = redirect(&self.export_all, &code, &self.alias).into_owned();
        redirect(&self.export_named, &code, &self.alias).into_owned()
    }
}

/// Swap the quoted specifier in capture 2 for `alias`, keeping its quotes.
fn redirect<'t>(re: &Regex, code: &'t str, alias: &str) -> Cow<'t, str> {
    re.replace_all(code, |caps: &Captures| {
        let quote = &caps[2][..1];
        format!("{}{}{}{}", &caps[1], quote, alias, quote)
    })
}

/// The rewrite pass run on every compilation unit.
pub struct SpecifierRewriter {
    rules: Vec<TargetRules>,
    quoted_packages: Vec<[String; 2]>,
    include: IncludeFilter,
}

impl SpecifierRewriter {
    pub fn new(registry: &TargetRegistry, include: IncludeFilter) -> Result<Self, ConfigError> {
        let rules = registry
            .targets()
            .iter()
            .map(TargetRules::new)
            .collect::<Result<Vec<_>, _>>()?;
        let quoted_packages = registry
            .packages()
            .map(|pkg| [format!("'{}'", pkg), format!("\"{}\"", pkg)])
            .collect();
        Ok(Self {
            rules,
            quoted_packages,
            include,
        })
    }

    /// Whether any configured package appears as a quoted literal.
    pub fn mentions_target(&self, code: &str) -> bool {
        self.quoted_packages
            .iter()
            .any(|[single, double]| code.contains(single.as_str()) || code.contains(double.as_str()))
    }

    /// Rewritten source of unit `id`, or `None` when the unit is excluded or
    /// nothing changed.
    pub fn rewrite(&self, code: &str, id: &str) -> Option<String> {
        if !(self.include)(id) {
            return None;
        }
        if !self.mentions_target(code) {
            return None;
        }

        let mut transformed = code.to_string();
        for rules in &self.rules {
            transformed = rules.apply(&transformed);
        }

        if transformed == code {
            return None;
        }
        debug!(id, "redirected overridden imports");
        Some(transformed)
    }
}
