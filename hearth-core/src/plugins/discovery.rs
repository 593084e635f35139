//! Directory-wide bootstrap
//!
//! A sweep loads every artifact in the plugin directory. One plugin
//! failing never stops the others; every outcome ends up in the report.

use std::path::{Path, PathBuf};

use super::enabled::EnabledList;
use super::error::{ErrorKind, PluginHostError};
use super::host::PluginHost;

/// An artifact found in the plugin directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArtifact {
    /// File stem, used as the requested plugin name
    pub name: String,
    pub path: PathBuf,
}

/// Find all `*.{extension}` files in `dir`, sorted by file name.
///
/// A missing directory yields no artifacts.
pub fn discover_artifacts(
    dir: &Path,
    extension: &str,
) -> Result<Vec<DiscoveredArtifact>, PluginHostError> {
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "Plugin directory does not exist");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping artifact with a non UTF-8 name");
            continue;
        };
        if name.is_empty() {
            continue;
        }
        found.push(DiscoveredArtifact {
            name: name.to_string(),
            path,
        });
    }

    found.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(found)
}

/// Result of loading one discovered artifact
#[derive(Debug)]
pub struct LoadOutcome {
    /// Requested name (file stem)
    pub requested: String,
    /// Resolved plugin name, or why loading failed
    pub result: Result<String, PluginHostError>,
}

/// Per-plugin results of a bootstrap sweep
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub outcomes: Vec<LoadOutcome>,
    /// Plugins that loaded but could not be enabled
    pub enable_errors: Vec<(String, PluginHostError)>,
}

impl BootstrapReport {
    /// Resolved names of the plugins that loaded
    pub fn loaded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(String::as_str))
            .collect()
    }

    /// Requested names that failed, with the failure kind
    pub fn failures(&self) -> Vec<(&str, ErrorKind)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Err(e) => Some((o.requested.as_str(), e.kind())),
                Ok(_) => None,
            })
            .collect()
    }

    /// Outcome for one requested name
    pub fn outcome(&self, requested: &str) -> Option<&LoadOutcome> {
        self.outcomes.iter().find(|o| o.requested == requested)
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok()) && self.enable_errors.is_empty()
    }
}

impl PluginHost {
    /// Load every artifact in the plugin directory, leaving them disabled
    pub async fn load_all(&mut self) -> Result<BootstrapReport, PluginHostError> {
        let artifacts = discover_artifacts(&self.config.plugin_dir, &self.config.extension)?;
        tracing::debug!(count = artifacts.len(), "Discovered plugin artifacts");

        let mut report = BootstrapReport::default();
        for artifact in artifacts {
            let result = self
                .load_plugin(&artifact.name)
                .await
                .map(|p| p.name().to_string());
            if let Err(e) = &result {
                tracing::error!(plugin = %artifact.name, error = %e, "Failed to load plugin");
            }
            report.outcomes.push(LoadOutcome {
                requested: artifact.name,
                result,
            });
        }

        tracing::info!(
            loaded = report.loaded().len(),
            failed = report.failures().len(),
            "Plugin bootstrap complete"
        );
        Ok(report)
    }

    /// Load every artifact, then enable the ones on the enabled list
    pub async fn bootstrap(
        &mut self,
        enabled: &EnabledList,
    ) -> Result<BootstrapReport, PluginHostError> {
        let mut report = self.load_all().await?;

        let to_enable: Vec<String> = self
            .registry
            .iter()
            .filter(|p| enabled.is_enabled(p.name()) || enabled.is_enabled(p.requested_name()))
            .map(|p| p.name().to_string())
            .collect();

        for name in to_enable {
            if let Err(e) = self.enable(&name).await {
                report.enable_errors.push((name, e));
            }
        }
        Ok(report)
    }
}
