//! Process-wide assistant session state.
//!
//! Only the display name is durable. The greeting guard lives in the
//! session-scoped store so that re-entering the assistant within the same
//! process never re-triggers the onboarding greeting.

use crate::error::Result;
use crate::store::KeyValueStore;
use std::sync::Arc;

/// Durable key holding the user's display name.
pub const USER_NAME_KEY: &str = "userName";
/// Session key set once the onboarding greeting has been spoken.
pub const GREETED_KEY: &str = "voiceAssistantGreeted";

/// Display name, onboarding flag and greeting guard.
pub struct SessionState {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    display_name: Option<String>,
    alias: Option<String>,
    gathering_name: bool,
}

impl SessionState {
    /// Load the display name from the durable store.
    pub fn load(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        let display_name = durable
            .get(USER_NAME_KEY)
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        Self {
            durable,
            session,
            display_name,
            alias: None,
            gathering_name: false,
        }
    }

    /// The stored display name, if onboarding has completed.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Name to address the user by: stored name, then the session alias,
    /// then `anonymous`.
    pub fn addressed_as<'a>(&'a self, anonymous: &'a str) -> &'a str {
        self.display_name
            .as_deref()
            .or(self.alias.as_deref())
            .unwrap_or(anonymous)
    }

    /// Whether the onboarding dialog currently owns transcripts.
    pub fn is_gathering_name(&self) -> bool {
        self.gathering_name
    }

    /// Whether the onboarding greeting was already spoken in this session.
    pub fn has_greeted(&self) -> bool {
        self.session.get(GREETED_KEY).is_some()
    }

    /// Record that the onboarding greeting has been spoken.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub fn mark_greeted(&self) -> Result<()> {
        self.session.set(GREETED_KEY, "true")
    }

    /// Start gathering the name. Refused once a name is stored.
    pub fn begin_gathering(&mut self) -> bool {
        if self.display_name.is_some() {
            return false;
        }
        self.gathering_name = true;
        true
    }

    /// Stop gathering without a name, addressing the user as `alias` for the
    /// rest of the session.
    pub fn abandon_gathering(&mut self, alias: &str) {
        self.gathering_name = false;
        self.alias = Some(alias.to_owned());
    }

    /// Store the captured name and end the gathering dialog.
    ///
    /// The in-memory state is updated even if persisting fails, so the
    /// current session still uses the name.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store rejects the write.
    pub fn capture_name(&mut self, name: &str) -> Result<()> {
        self.gathering_name = false;
        self.display_name = Some(name.to_owned());
        self.durable.set(USER_NAME_KEY, name)
    }
}
