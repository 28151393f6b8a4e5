//! Export binding identifiers
//!
//! Export names discovered on a package (or configured as overrides) are not
//! always valid identifiers, e.g. `"foo-bar"` exported through
//! `exports["foo-bar"] = ...`. Those names are mangled into something that can
//! appear after `export const`.
//!
//! The mapping is not injective: `"a-b"` and `"a.b"` both become `__a_b`.
//! Callers that bind several names in one module must check for collisions.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix put in front of every mangled name.
pub const MANGLE_PREFIX: &str = "__";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

// ASCII-only on purpose, anything outside [A-Za-z0-9_] is replaced.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Whether `name` can be used as-is as a binding identifier.
pub fn is_valid_ident(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Map an export name to a valid binding identifier.
///
/// Valid identifiers are returned unchanged. Anything else is prefixed with
/// [`MANGLE_PREFIX`] and has every non-word character replaced by `_`.
pub fn safe_ident(name: &str) -> Cow<'_, str> {
    if is_valid_ident(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{}{}", MANGLE_PREFIX, NON_WORD.replace_all(name, "_")))
    }
}
