//! Import rewriting tests
//!
//! Drives the `transform` hook the way a host pipeline would.

use override_deps::{ExportEnumerator, OverrideDeps, PluginOptions, TargetConfig};

fn plugin(targets: Vec<TargetConfig>) -> OverrideDeps {
    let mut options = PluginOptions::new(".");
    options.targets = targets;
    OverrideDeps::with_enumerator(options, ExportEnumerator::new(Vec::new())).unwrap()
}

fn react() -> OverrideDeps {
    plugin(vec![TargetConfig::new("react")])
}

fn transform(plugin: &OverrideDeps, code: &str) -> Option<String> {
    plugin.transform(code, "src/main.js")
}

#[test]
fn should_rewrite_default_imports() {
    assert_eq!(
        transform(&react(), "import React from 'react';").as_deref(),
        Some("import React from 'virtual:react';")
    );
}

#[test]
fn should_rewrite_named_imports() {
    assert_eq!(
        transform(&react(), r#"import { useState, useMemo } from "react";"#).as_deref(),
        Some(r#"import { useState, useMemo } from "virtual:react";"#)
    );
}

#[test]
fn should_rewrite_namespace_imports() {
    assert_eq!(
        transform(&react(), "import * as React from 'react';").as_deref(),
        Some("import * as React from 'virtual:react';")
    );
}

#[test]
fn should_rewrite_mixed_default_and_named_imports() {
    assert_eq!(
        transform(&react(), "import React, { useState } from 'react';").as_deref(),
        Some("import React, { useState } from 'virtual:react';")
    );
}

#[test]
fn should_rewrite_side_effect_imports_by_default() {
    assert_eq!(
        transform(&react(), "import 'react';").as_deref(),
        Some("import 'virtual:react';")
    );
}

#[test]
fn should_not_rewrite_side_effect_imports_if_disabled() {
    let p = plugin(vec![TargetConfig::new("react").with_side_effect_imports(false)]);
    assert_eq!(transform(&p, "import 'react';"), None);
}

#[test]
fn disabled_side_effect_imports_leave_other_statements_rewritable() {
    let p = plugin(vec![TargetConfig::new("react").with_side_effect_imports(false)]);
    assert_eq!(
        transform(&p, "import 'react';\nimport React from 'react';").as_deref(),
        Some("import 'react';\nimport React from 'virtual:react';")
    );
}

#[test]
fn should_rewrite_exports() {
    assert_eq!(
        transform(&react(), "export * from 'react';\nexport { useState } from 'react';").as_deref(),
        Some("export * from 'virtual:react';\nexport { useState } from 'virtual:react';")
    );
}

#[test]
fn should_not_transform_code_without_the_target_package() {
    assert_eq!(transform(&react(), "import Vue from 'vue';"), None);
}

#[test]
fn should_handle_multiple_targets() {
    let p = plugin(vec![TargetConfig::new("react"), TargetConfig::new("vue")]);
    assert_eq!(
        transform(&p, "import React from 'react';\nimport Vue from 'vue';").as_deref(),
        Some("import React from 'virtual:react';\nimport Vue from 'virtual:vue';")
    );
}

#[test]
fn should_use_custom_alias() {
    let p = plugin(vec![TargetConfig::new("react").with_alias("my-react")]);
    assert_eq!(
        transform(&p, "import React from 'react';").as_deref(),
        Some("import React from 'my-react';")
    );
}

#[test]
fn should_rewrite_scoped_packages() {
    let p = plugin(vec![TargetConfig::new("@tanstack/react-query")]);
    assert_eq!(
        transform(&p, r#"import { useQuery } from "@tanstack/react-query";"#).as_deref(),
        Some(r#"import { useQuery } from "virtual:@tanstack/react-query";"#)
    );
}

#[test]
fn should_preserve_surrounding_code() {
    let code = "// entry\nimport React from 'react';\n\nexport const App = () => React.createElement('div');\n";
    assert_eq!(
        transform(&react(), code).as_deref(),
        Some("// entry\nimport React from 'virtual:react';\n\nexport const App = () => React.createElement('div');\n")
    );
}

#[test]
fn mention_without_import_is_not_handled() {
    assert_eq!(transform(&react(), "const name = 'react';"), None);
}

#[test]
fn should_skip_dependency_and_virtual_units() {
    let p = react();
    let code = "import React from 'react';";
    assert_eq!(p.transform(code, "/app/node_modules/lib/index.js"), None);
    assert_eq!(p.transform(code, "\0virtual:virtual:react"), None);
    assert!(p.transform(code, "/app/src/index.js").is_some());
}

#[test]
fn should_use_custom_include_filter() {
    let options = PluginOptions::new(".")
        .with_target(TargetConfig::new("react"))
        .with_include(|id| id.starts_with("/app/src/"));
    let p = OverrideDeps::with_enumerator(options, ExportEnumerator::new(Vec::new())).unwrap();
    let code = "import React from 'react';";
    assert_eq!(p.transform(code, "/app/test/index.js"), None);
    assert!(p.transform(code, "/app/src/index.js").is_some());
}
