#![deny(clippy::all)]

use std::collections::HashMap;
use std::path::Path;

use napi::{Error, Result, Status};
use napi_derive::napi;
use override_deps::{ExportEnumerator, OverrideDeps, PluginOptions, StaticExports};

fn to_napi_error(e: impl std::fmt::Display) -> Error {
    Error::new(Status::GenericFailure, e.to_string())
}

/// The override plugin as seen from JavaScript. The Vite/Rollup plugin object
/// forwards `resolveId`, `load` and `transform` to these methods.
#[napi(js_name = "OverrideDeps")]
pub struct JsOverrideDeps {
    inner: OverrideDeps,
}

#[napi]
impl JsOverrideDeps {
    /// Load options from a JSON configuration file.
    #[napi(factory)]
    pub fn from_config_file(path: String) -> Result<Self> {
        let options = PluginOptions::load(Path::new(&path)).map_err(to_napi_error)?;
        let inner = OverrideDeps::new(options).map_err(to_napi_error)?;
        Ok(Self { inner })
    }

    /// Build from a JSON options string; relative paths are resolved against
    /// `root`.
    #[napi(factory)]
    pub fn from_json(options: String, root: String) -> Result<Self> {
        let options = PluginOptions::from_json_str(&options, Path::new(&root)).map_err(to_napi_error)?;
        let inner = OverrideDeps::new(options).map_err(to_napi_error)?;
        Ok(Self { inner })
    }

    /// Like `fromJson`, with export names supplied by the host instead of
    /// discovered on disk, e.g. `Object.keys(require(pkg))` computed in Node.
    #[napi(factory)]
    pub fn with_known_exports(
        options: String,
        root: String,
        exports: HashMap<String, Vec<String>>,
    ) -> Result<Self> {
        let options = PluginOptions::from_json_str(&options, Path::new(&root)).map_err(to_napi_error)?;
        let known = exports
            .into_iter()
            .fold(StaticExports::new(), |table, (package, names)| table.with_package(package, names));
        let enumerator = ExportEnumerator::new(vec![
            Box::new(known),
            Box::new(override_deps::exports::CommonJsDiscovery::new(&options.root)),
            Box::new(override_deps::exports::EsModuleDiscovery::new(&options.root)),
        ]);
        let inner = OverrideDeps::with_enumerator(options, enumerator).map_err(to_napi_error)?;
        Ok(Self { inner })
    }

    #[napi(getter)]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    #[napi(getter)]
    pub fn enforce(&self) -> String {
        self.inner.enforce().to_string()
    }

    #[napi]
    pub fn resolve_id(&self, source: String) -> Option<String> {
        self.inner.resolve_id(&source)
    }

    #[napi]
    pub fn load(&self, id: String) -> Result<Option<String>> {
        self.inner.load(&id).map_err(to_napi_error)
    }

    #[napi]
    pub fn transform(&self, code: String, id: String) -> Option<String> {
        self.inner.transform(&code, &id)
    }

    #[napi]
    pub fn exports_of(&self, package: String) -> Vec<String> {
        self.inner.exports_of(&package).into_iter().collect()
    }
}

/// Library version
#[napi]
pub fn version() -> String {
    override_deps::version().to_string()
}
