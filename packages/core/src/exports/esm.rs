//! ES module export discovery
//!
//! Reads the names a dynamic `import(package)` namespace would expose from the
//! package's ESM entry. `export * from "./x"` is not followed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::{Declaration, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use tracing::debug;

use super::package::InstalledPackage;
use super::ExportDiscovery;

/// Export names declared in a module source. `None` if it cannot be parsed.
pub fn scan_module_exports(source: &str, path: &Path) -> Option<BTreeSet<String>> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path)
        .unwrap_or_else(|_| SourceType::mjs())
        .with_module(true);
    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked {
        debug!(path = %path.display(), "unparsable module entry");
        return None;
    }

    let mut names = BTreeSet::new();
    for stmt in &ret.program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) => {
                if !decl.export_kind.is_value() {
                    continue;
                }
                if let Some(declaration) = &decl.declaration {
                    collect_declaration(declaration, &mut names);
                }
                for spec in &decl.specifiers {
                    if spec.export_kind.is_value() {
                        names.insert(spec.exported.name().to_string());
                    }
                }
            }
            Statement::ExportAllDeclaration(decl) => match &decl.exported {
                Some(exported) => {
                    names.insert(exported.name().to_string());
                }
                None => {
                    debug!(source = %decl.source.value, "star re-export not followed");
                }
            },
            _ => {}
        }
    }

    names.remove("default");
    Some(names)
}

fn collect_declaration(declaration: &Declaration<'_>, names: &mut BTreeSet<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                if let Some(id) = declarator.id.get_binding_identifier() {
                    names.insert(id.name.to_string());
                }
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                names.insert(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                names.insert(id.name.to_string());
            }
        }
        _ => {}
    }
}

/// Discovery through the package's ES module entry.
pub struct EsModuleDiscovery {
    root: PathBuf,
}

impl EsModuleDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExportDiscovery for EsModuleDiscovery {
    fn name(&self) -> &'static str {
        "esm"
    }

    fn discover(&self, package: &str) -> Option<BTreeSet<String>> {
        let installed = InstalledPackage::locate(&self.root, package)?;
        let entry = installed.manifest.esm_entry()?;
        let file = installed.entry_file(&entry)?;
        let source = match fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                debug!(path = %file.display(), error = %e, "cannot read module entry");
                return None;
            }
        };
        scan_module_exports(&source, &file)
    }
}
