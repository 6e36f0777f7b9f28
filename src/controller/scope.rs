//! Page-scoped command registration

use super::VoiceController;
use crate::Result;
use crate::commands::normalize_phrase;

/// Commands registered for the lifetime of one mounted page
///
/// Dropping the scope removes every phrase it added, so a page cannot leave
/// commands behind when it unmounts.
///
/// ```no_run
/// # async fn demo(voice: link_voice::VoiceController) -> link_voice::Result<()> {
/// let mut scope = voice.page_scope();
/// scope.add("next card", || println!("next"), "show the next card")?;
/// scope.add("flip card", || println!("flip"), "reveal the answer")?;
/// // page unmounts
/// drop(scope);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PageScope {
    controller: VoiceController,
    phrases: Vec<String>,
}

impl PageScope {
    pub(crate) const fn new(controller: VoiceController) -> Self {
        Self {
            controller,
            phrases: Vec::new(),
        }
    }

    /// Register a command for as long as this scope lives
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn add(
        &mut self,
        phrase: &str,
        action: impl Fn() + Send + Sync + 'static,
        description: impl Into<String>,
    ) -> Result<()> {
        self.controller
            .add_custom_command(phrase, action, description)?;

        let phrase = normalize_phrase(phrase);
        if !self.phrases.contains(&phrase) {
            self.phrases.push(phrase);
        }
        Ok(())
    }

    /// Remove one command before the scope ends
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn remove(&mut self, phrase: &str) -> Result<()> {
        let phrase = normalize_phrase(phrase);
        self.phrases.retain(|p| *p != phrase);
        self.controller.remove_custom_command(&phrase)
    }

    /// Phrases this scope registered
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Drop for PageScope {
    fn drop(&mut self) {
        for phrase in self.phrases.drain(..) {
            if self.controller.remove_custom_command(&phrase).is_err() {
                // controller already gone, nothing left to clean up
                break;
            }
        }
    }
}
