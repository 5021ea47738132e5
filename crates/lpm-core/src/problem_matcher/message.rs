/// Message used when no step captured any text.
pub const DEFAULT_MESSAGE: &str = "No message found.";

/// Message text of an open diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBuffer {
    text: String,
    appending: bool,
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self {
            text: DEFAULT_MESSAGE.to_string(),
            appending: false,
        }
    }
}

impl MessageBuffer {
    /// Add a captured fragment.
    ///
    /// The first non-empty fragment replaces the default text; later ones are appended after a
    /// single space. Fragments are trimmed; blank ones are ignored.
    pub fn push(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if self.appending {
            self.text.push(' ');
            self.text.push_str(fragment);
        } else {
            self.text.clear();
            self.text.push_str(fragment);
            self.appending = true;
        }
    }

    /// Current text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}
