//! Admin messages.
//!
//! Every mutating admin endpoint answers with a list of messages ("The movie
//! “Heat” was added successfully.", "3 records were updated") for the client
//! to show once.

use serde::{Serialize, Serializer};

/// The severity level of a message (DEBUG=10 ... ERROR=40).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageLevel {
    Debug = 10,
    Info = 20,
    Success = 25,
    Warning = 30,
    Error = 40,
}

impl MessageLevel {
    /// Returns the CSS tag for this level.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for MessageLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    /// Creates a message with the given level and text.
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Creates a success-level message.
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Success, text)
    }

    /// Creates a warning-level message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, text)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// The confirmation shown after saving an object.
pub fn saved_message(verbose_name: &str, repr: &str, created: bool) -> Message {
    let verb = if created { "added" } else { "changed" };
    Message::success(format!(
        "The {verbose_name} “{repr}” was {verb} successfully."
    ))
}

/// The confirmation shown after deleting objects.
pub fn deleted_message(count: usize, verbose_name: &str, verbose_name_plural: &str) -> Message {
    let items = if count == 1 {
        verbose_name
    } else {
        verbose_name_plural
    };
    Message::success(format!("Successfully deleted {count} {items}."))
}

/// The confirmation shown after deleting one object from its change view.
pub fn deleted_object_message(verbose_name: &str, repr: &str) -> Message {
    Message::success(format!("The {verbose_name} “{repr}” was deleted successfully."))
}

/// The confirmation shown after saving list-editable changes.
pub fn changed_rows_message(count: usize, verbose_name: &str, verbose_name_plural: &str) -> Message {
    if count == 1 {
        Message::success(format!("1 {verbose_name} was changed successfully."))
    } else {
        Message::success(format!(
            "{count} {verbose_name_plural} were changed successfully."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_level_tag() {
        assert_eq!(MessageLevel::Debug.tag(), "debug");
        assert_eq!(MessageLevel::Success.tag(), "success");
        assert_eq!(MessageLevel::Error.to_string(), "error");
        assert!(MessageLevel::Warning > MessageLevel::Success);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::success("1 record was updated");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"level": "success", "text": "1 record was updated"}));
    }

    #[test]
    fn test_saved_message() {
        assert_eq!(
            saved_message("movie", "Heat", true).text,
            "The movie “Heat” was added successfully."
        );
        assert_eq!(
            saved_message("genre", "Drama", false).text,
            "The genre “Drama” was changed successfully."
        );
    }

    #[test]
    fn test_deleted_message() {
        assert_eq!(
            deleted_message(1, "movie", "movies").text,
            "Successfully deleted 1 movie."
        );
        assert_eq!(
            deleted_message(3, "movie", "movies").to_string(),
            "Successfully deleted 3 movies."
        );
    }

    #[test]
    fn test_changed_rows_message() {
        assert_eq!(
            changed_rows_message(1, "movie", "movies").text,
            "1 movie was changed successfully."
        );
        assert_eq!(
            changed_rows_message(2, "movie", "movies").text,
            "2 movies were changed successfully."
        );
        assert_eq!(
            deleted_object_message("genre", "Drama").text,
            "The genre “Drama” was deleted successfully."
        );
    }
}
