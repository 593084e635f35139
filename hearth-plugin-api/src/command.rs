//! Command surface declarations

/// A command a plugin exposes to chat users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command name as typed by users, without prefix (e.g. "ban")
    pub name: String,
    /// Short description for help text
    pub description: String,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}
