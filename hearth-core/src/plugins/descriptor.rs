//! Descriptor extraction from a filled registrar

use hearth_plugin_api::{PluginDescriptor, PluginFactory, PluginRegistrar};

use super::error::InvalidPlugin;

/// The single plugin type an artifact exports
pub struct Extracted {
    pub descriptor: PluginDescriptor,
    pub type_name: &'static str,
    pub factory: PluginFactory,
}

/// Pull the one plugin type out of a registrar and validate its identity.
///
/// A mismatch between the version the artifact was built as and the version
/// its descriptor declares is only a warning.
pub fn extract(registrar: PluginRegistrar) -> Result<Extracted, InvalidPlugin> {
    let build_version = registrar.build_version().map(str::to_owned);
    let mut entries = registrar.into_entries();

    let entry = match entries.len() {
        0 => return Err(InvalidPlugin::NoPluginType),
        1 => entries.remove(0),
        count => {
            return Err(InvalidPlugin::MultiplePluginTypes {
                count,
                types: entries.iter().map(|e| e.type_name.to_string()).collect(),
            });
        }
    };

    let Some(descriptor) = entry.descriptor else {
        return Err(InvalidPlugin::MissingDescriptor {
            type_name: entry.type_name.to_string(),
        });
    };

    for (field, value) in [("name", &descriptor.name), ("version", &descriptor.version)] {
        if value.trim().is_empty() {
            return Err(InvalidPlugin::EmptyIdentity {
                type_name: entry.type_name.to_string(),
                field,
            });
        }
    }

    if let Some(built) = build_version.filter(|v| *v != descriptor.version) {
        tracing::warn!(
            plugin = %descriptor.name,
            declared = %descriptor.version,
            built = %built,
            "Declared plugin version differs from artifact version"
        );
    }

    Ok(Extracted {
        descriptor,
        type_name: entry.type_name,
        factory: entry.factory,
    })
}
