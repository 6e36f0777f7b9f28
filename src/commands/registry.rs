//! Page-scoped dynamic command registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Action run when a command phrase is recognized
pub type CommandAction = Arc<dyn Fn() + Send + Sync>;

/// A registered voice command
#[derive(Clone)]
pub struct CommandEntry {
    /// Normalized phrase the command answers to
    pub phrase: String,
    /// Action to run
    pub action: CommandAction,
    /// Human-readable description for help output
    pub description: String,
}

impl CommandEntry {
    /// Create an entry, normalizing the phrase
    pub fn new(
        phrase: &str,
        action: impl Fn() + Send + Sync + 'static,
        description: impl Into<String>,
    ) -> Self {
        Self {
            phrase: normalize_phrase(phrase),
            action: Arc::new(action),
            description: description.into(),
        }
    }

    /// Run the action
    pub fn run(&self) {
        (self.action)();
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("phrase", &self.phrase)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Normalize a phrase or transcript for matching
#[must_use]
pub fn normalize_phrase(phrase: &str) -> String {
    phrase.trim().to_lowercase()
}

/// Dynamic commands keyed by normalized phrase
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; a later registration for the same phrase wins
    ///
    /// Returns the entry it replaced, if any.
    pub fn register(&mut self, entry: CommandEntry) -> Option<CommandEntry> {
        let replaced = self.entries.insert(entry.phrase.clone(), entry);
        if let Some(old) = &replaced {
            tracing::debug!(phrase = %old.phrase, "voice command replaced");
        }
        replaced
    }

    /// Remove a command; removing an unknown phrase is a no-op
    pub fn unregister(&mut self, phrase: &str) -> Option<CommandEntry> {
        self.entries.remove(&normalize_phrase(phrase))
    }

    /// Look up a command by already-normalized phrase
    #[must_use]
    pub fn get(&self, normalized: &str) -> Option<&CommandEntry> {
        self.entries.get(normalized)
    }

    /// Whether a phrase is registered
    #[must_use]
    pub fn contains(&self, phrase: &str) -> bool {
        self.entries.contains_key(&normalize_phrase(phrase))
    }

    /// Registered commands sorted by phrase
    #[must_use]
    pub fn entries(&self) -> Vec<&CommandEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.phrase.cmp(&b.phrase));
        entries
    }

    /// Number of registered commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
