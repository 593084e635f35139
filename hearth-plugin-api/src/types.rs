//! Plugin types and metadata structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identity and metadata a plugin declares about itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Plugin name, unique across a host (case-sensitive)
    pub name: String,
    /// Author-declared version
    pub version: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plugin author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Names of plugins that must be loaded first, in load order
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Platform events the plugin's connection needs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Intents>,
    /// Bundled default configuration (TOML)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_config: Option<String>,
}

impl PluginDescriptor {
    /// Create a descriptor with just a name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_intents(mut self, intents: Intents) -> Self {
        self.intents = Some(intents);
        self
    }

    pub fn with_default_config(mut self, toml: impl Into<String>) -> Self {
        self.default_config = Some(toml.into());
        self
    }
}

/// Plugin author
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            url: None,
        }
    }
}

/// A category of platform events a connection subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Guilds,
    GuildMembers,
    GuildModeration,
    GuildMessages,
    GuildMessageReactions,
    GuildVoiceStates,
    GuildPresences,
    GuildScheduledEvents,
    DirectMessages,
    MessageContent,
}

impl Intent {
    /// Privileged intents must be granted explicitly by the platform
    pub fn is_privileged(self) -> bool {
        matches!(
            self,
            Self::GuildMembers | Self::GuildPresences | Self::MessageContent
        )
    }
}

/// Set of intents requested by a plugin's connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intents(BTreeSet<Intent>);

impl Intents {
    /// The set used when a plugin declares nothing: guild metadata and
    /// guild messages, no privileged intents.
    pub fn minimal() -> Self {
        [Intent::Guilds, Intent::GuildMessages].into_iter().collect()
    }

    pub fn contains(&self, intent: Intent) -> bool {
        self.0.contains(&intent)
    }

    pub fn insert(&mut self, intent: Intent) -> bool {
        self.0.insert(intent)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any requested intent is privileged
    pub fn is_privileged(&self) -> bool {
        self.0.iter().any(|i| i.is_privileged())
    }

    pub fn iter(&self) -> impl Iterator<Item = Intent> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Intent> for Intents {
    fn from_iter<I: IntoIterator<Item = Intent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Lifecycle state of a loaded plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Loaded and configured, never enabled
    Loaded,
    /// Running
    Enabled,
    /// Stopped after having been enabled
    Disabled,
    /// Torn down; terminal
    Unloaded,
}

impl PluginState {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    /// Loaded and Disabled both count as "not running but resident"
    pub fn is_resident_disabled(self) -> bool {
        matches!(self, Self::Loaded | Self::Disabled)
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loaded => "loaded",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Unloaded => "unloaded",
        };
        f.write_str(s)
    }
}

/// Read-only view of a plugin, as exposed to other plugins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub state: PluginState,
}
