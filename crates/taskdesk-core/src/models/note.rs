use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_plausible_email, require_non_empty, UserId, ValidationError};

/// Who besides the owner may read a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteVisibility {
    #[default]
    Private,
    Public,
    Shared,
}

impl NoteVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteVisibility::Private => "private",
            NoteVisibility::Public => "public",
            NoteVisibility::Shared => "shared",
        }
    }
}

impl fmt::Display for NoteVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteVisibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(NoteVisibility::Private),
            "public" => Ok(NoteVisibility::Public),
            "shared" => Ok(NoteVisibility::Shared),
            _ => Err(ValidationError::UnknownValue {
                field: "visibility",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub visibility: NoteVisibility,
    #[serde(deserialize_with = "super::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Who to credit in listings: the owner's email when the server sent it
    pub fn author_label(&self) -> &str {
        self.owner_email.as_deref().unwrap_or(self.owner_id.as_str())
    }
}

/// Body of `POST /notes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteCreate {
    pub title: String,
    pub content: String,
    pub visibility: NoteVisibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_with_emails: Option<Vec<String>>,
}

impl NoteCreate {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            visibility: NoteVisibility::default(),
            shared_with_emails: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("Title", &self.title)?;
        require_non_empty("Content", &self.content)?;
        validate_recipients(Some(self.visibility), self.shared_with_emails.as_deref())
    }
}

/// Body of `PATCH /notes/{id}`. Unset fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<NoteVisibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_with_emails: Option<Vec<String>>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.visibility.is_none()
            && self.shared_with_emails.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            require_non_empty("Title", title)?;
        }
        if let Some(ref content) = self.content {
            require_non_empty("Content", content)?;
        }
        validate_recipients(self.visibility, self.shared_with_emails.as_deref())
    }
}

fn validate_recipients(
    visibility: Option<NoteVisibility>,
    recipients: Option<&[String]>,
) -> Result<(), ValidationError> {
    let recipients = recipients.unwrap_or_default();
    if visibility == Some(NoteVisibility::Shared) && recipients.is_empty() {
        return Err(ValidationError::MissingRecipients);
    }
    match recipients.iter().find(|email| !is_plausible_email(email)) {
        Some(bad) => Err(ValidationError::InvalidEmail(bad.clone())),
        None => Ok(()),
    }
}

/// Split a comma-separated recipient list, dropping blanks
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipients() {
        assert_eq!(
            parse_recipients(" a@x.com, b@y.org ,,"),
            vec!["a@x.com".to_string(), "b@y.org".to_string()]
        );
        assert!(parse_recipients("  ").is_empty());
    }

    #[test]
    fn test_shared_note_requires_recipients() {
        let mut note = NoteCreate::new("Plan", "Q3 roadmap");
        note.visibility = NoteVisibility::Shared;
        assert_eq!(note.validate(), Err(ValidationError::MissingRecipients));

        note.shared_with_emails = Some(vec!["teammate@x.com".into()]);
        assert!(note.validate().is_ok());

        note.shared_with_emails = Some(vec!["teammate".into()]);
        assert!(matches!(note.validate(), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_create_requires_content() {
        let note = NoteCreate::new("Title", " ");
        assert_eq!(note.validate(), Err(ValidationError::EmptyField("Content")));
    }

    #[test]
    fn test_update_switching_to_shared() {
        let update = NoteUpdate {
            visibility: Some(NoteVisibility::Shared),
            ..Default::default()
        };
        assert_eq!(update.validate(), Err(ValidationError::MissingRecipients));

        let update = NoteUpdate {
            visibility: Some(NoteVisibility::Public),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"visibility": "public"})
        );
    }

    #[test]
    fn test_parse_note_and_author_label() {
        let json = r#"{
            "id": "n1",
            "title": "Hello",
            "content": "World",
            "owner_id": "u2",
            "visibility": "shared",
            "created_at": "2024-05-01T10:00:00"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.visibility, NoteVisibility::Shared);
        assert_eq!(note.author_label(), "u2");

        let with_email = Note {
            owner_email: Some("owner@x.com".into()),
            ..note
        };
        assert_eq!(with_email.author_label(), "owner@x.com");
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("PUBLIC".parse::<NoteVisibility>().unwrap(), NoteVisibility::Public);
        assert!("team".parse::<NoteVisibility>().is_err());
    }
}
