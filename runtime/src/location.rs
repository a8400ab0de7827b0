//! Browser location and history, abstracted.

use parking_lot::Mutex;

pub trait Location: Send + Sync {
    /// The current URL (path and query).
    fn url(&self) -> String;

    /// Navigate to `url`, adding a history entry.
    fn push(&self, url: &str);

    /// Replace the current history entry with `url`.
    fn replace(&self, url: &str);
}

/// In-memory history, newest entry last.
#[derive(Debug)]
pub struct MemoryLocation {
    history: Mutex<Vec<String>>,
}

impl MemoryLocation {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial.into()]),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl Location for MemoryLocation {
    fn url(&self) -> String {
        self.history.lock().last().cloned().unwrap_or_default()
    }

    fn push(&self, url: &str) {
        self.history.lock().push(url.to_string());
    }

    fn replace(&self, url: &str) {
        let mut history = self.history.lock();
        match history.last_mut() {
            Some(last) => *last = url.to_string(),
            None => history.push(url.to_string()),
        }
    }
}
