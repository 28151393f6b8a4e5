//! CommonJS export discovery
//!
//! Approximates the keys of the object `require(package)` would return by
//! scanning the CommonJS entry for assignments to `exports`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::package::{resolve_file, InstalledPackage};
use super::ExportDiscovery;

/// How many `module.exports = require("./x")` hops are followed.
const MAX_REDIRECTS: usize = 4;

// exports.foo = / module.exports.foo =
static DOT_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^.\w$])(?:module\.)?exports\.([A-Za-z_$][\w$]*)\s*=").unwrap()
});

// exports["foo-bar"] =
static INDEX_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^.\w$])(?:module\.)?exports\[\s*['"]([^'"]+)['"]\s*\]\s*="#).unwrap()
});

// Object.defineProperty(exports, "foo", ...)
static DEFINE_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Object\.defineProperty\(\s*(?:module\.)?exports\s*,\s*['"]([^'"]+)['"]"#).unwrap()
});

// module.exports = { a, b: c, d() {} }
static OBJECT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"module\.exports\s*=\s*\{").unwrap());

static PROPERTY_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap());

// module.exports = require("./cjs/lib.js")
static REDIRECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"module\.exports\s*=\s*require\(\s*['"](\.{1,2}/[^'"]+)['"]\s*\)"#).unwrap()
});

/// Interop markers that are not part of the surface.
const IGNORED: &[&str] = &["default", "__esModule"];

/// Export names assigned in a CommonJS source.
pub fn scan_commonjs_exports(source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for re in [&*DOT_ASSIGNMENT, &*INDEX_ASSIGNMENT] {
        for caps in re.captures_iter(source) {
            // `=` followed by `=` is a comparison, not an assignment.
            let rest = &source[caps.get(0).map_or(0, |m| m.end())..];
            if !rest.starts_with('=') {
                names.insert(caps[1].to_string());
            }
        }
    }

    for caps in DEFINE_PROPERTY.captures_iter(source) {
        names.insert(caps[1].to_string());
    }

    for m in OBJECT_LITERAL.find_iter(source) {
        names.extend(object_literal_entries(&source[m.end()..]).into_iter().filter_map(property_key));
    }

    names.retain(|name| !IGNORED.contains(&name.as_str()));
    names
}

/// Top-level entries of an object literal whose `{` was just consumed, up
/// to its closing brace. Commas inside nested brackets and strings do not
/// split entries.
fn object_literal_entries(rest: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' | '(' | '[' => depth += 1,
            '}' if depth == 0 => {
                entries.push(&rest[start..i]);
                return entries;
            }
            '}' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(&rest[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    // Unterminated literal: nothing trustworthy to report.
    Vec::new()
}

/// The key of one object literal entry, if it is a plain identifier or a
/// quoted string. Spreads and computed keys have no static name.
fn property_key(entry: &str) -> Option<String> {
    let entry = entry.trim();
    let entry = entry.strip_prefix("async ").map_or(entry, str::trim_start);
    if entry.is_empty() || entry.starts_with("...") {
        return None;
    }

    let (key, rest) = match entry.as_bytes()[0] {
        q @ (b'"' | b'\'') => {
            let close = entry[1..].find(q as char)? + 1;
            (&entry[1..close], &entry[close + 1..])
        }
        _ => {
            let end = entry.find([':', '(']).unwrap_or(entry.len());
            let key = entry[..end].trim();
            if !PROPERTY_KEY.is_match(key) {
                return None;
            }
            (key, &entry[end..])
        }
    };

    let rest = rest.trim_start();
    (!key.is_empty() && (rest.is_empty() || rest.starts_with([':', '(']))).then(|| key.to_string())
}

/// Relative targets of `module.exports = require(...)`, in source order.
pub fn scan_redirects(source: &str) -> Vec<String> {
    REDIRECT
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Discovery through the package's CommonJS entry.
pub struct CommonJsDiscovery {
    root: PathBuf,
}

impl CommonJsDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExportDiscovery for CommonJsDiscovery {
    fn name(&self) -> &'static str {
        "commonjs"
    }

    fn discover(&self, package: &str) -> Option<BTreeSet<String>> {
        let installed = InstalledPackage::locate(&self.root, package)?;
        let entry = installed.manifest.commonjs_entry()?;
        let file = installed.entry_file(&entry)?;
        collect_file(&file, 0)
    }
}

fn collect_file(path: &Path, depth: usize) -> Option<BTreeSet<String>> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read commonjs entry");
            return None;
        }
    };

    let mut names = scan_commonjs_exports(&source);
    if depth >= MAX_REDIRECTS {
        return Some(names);
    }

    // Conditional redirects (development/production builds) expose the same
    // surface, the first one that resolves is enough.
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let redirected = scan_redirects(&source)
        .iter()
        .filter_map(|target| resolve_file(&base.join(target)))
        .find_map(|target| collect_file(&target, depth + 1));
    if let Some(more) = redirected {
        names.extend(more);
    }
    Some(names)
}
