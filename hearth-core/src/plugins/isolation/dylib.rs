//! Native dynamic-library contexts
//!
//! Each context copies the artifact into its own temporary directory before
//! opening it. The loader therefore never keeps the original file open, and
//! a replaced file is opened as a new library on the next load instead of
//! being served from the dynamic linker's cache.

use std::path::Path;

use hearth_plugin_api::{API_VERSION, PluginRegistrar};
use libloading::Library;
use tempfile::TempDir;

use super::{ArtifactLoader, IsolationContext};
use crate::plugins::error::{InvalidPlugin, PluginHostError};

const API_VERSION_SYMBOL: &[u8] = b"_hearth_plugin_api_version";
const REGISTER_SYMBOL: &[u8] = b"_hearth_plugin_register";

/// Loads plugins built with `export_plugin!`
#[derive(Debug, Default, Clone)]
pub struct DylibLoader;

impl DylibLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactLoader for DylibLoader {
    fn create_context(&self, name: &str) -> Result<Box<dyn IsolationContext>, PluginHostError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("hearth-{name}-"))
            .tempdir()?;
        tracing::debug!(context = %name, dir = %dir.path().display(), "Created plugin context");
        Ok(Box::new(DylibContext {
            name: name.to_string(),
            library: None,
            dir,
        }))
    }
}

struct DylibContext {
    name: String,
    // Declared before `dir` so the library closes before its file is deleted
    library: Option<Library>,
    dir: TempDir,
}

impl DylibContext {
    fn open(&self, path: &Path) -> Result<(Library, PluginRegistrar), InvalidPlugin> {
        // SAFETY: the artifact comes from the operator's plugin directory and is
        // expected to follow the export_plugin! contract.
        let library = unsafe { Library::new(path)? };

        // SAFETY: symbol signature is fixed by export_plugin!
        let found = unsafe {
            let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
                library.get(API_VERSION_SYMBOL)?;
            api_version_fn()
        };
        if found != API_VERSION {
            return Err(InvalidPlugin::ApiVersionMismatch {
                expected: API_VERSION,
                found,
            });
        }

        let mut registrar = PluginRegistrar::new();
        // SAFETY: symbol signature is fixed by export_plugin!, and the API
        // version check above guarantees the registrar layout matches.
        unsafe {
            let register_fn: libloading::Symbol<extern "C" fn(&mut PluginRegistrar)> =
                library.get(REGISTER_SYMBOL)?;
            register_fn(&mut registrar);
        }

        Ok((library, registrar))
    }
}

impl IsolationContext for DylibContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_artifact(&mut self, bytes: &[u8]) -> Result<PluginRegistrar, PluginHostError> {
        let file_name = format!(
            "{}{}{}",
            std::env::consts::DLL_PREFIX,
            self.name,
            std::env::consts::DLL_SUFFIX
        );
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, bytes)?;

        let (library, registrar) = self
            .open(&path)
            .map_err(|reason| PluginHostError::invalid(&self.name, reason))?;
        self.library = Some(library);
        Ok(registrar)
    }

    fn unload(self: Box<Self>) {
        let DylibContext { name, library, dir } = *self;
        drop(library);
        if let Err(e) = dir.close() {
            tracing::warn!(context = %name, error = %e, "Failed to remove plugin context directory");
        }
    }
}
