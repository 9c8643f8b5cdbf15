use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, UserId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    /// Wire value, also used as the `status` query filter
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    /// Accepts wire values and display names ("in_progress", "In Progress", "in-progress")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "status",
                value: s.to_string(),
            })
    }
}

/// A task as listed by `GET /tasks`. `owner_id` is the assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub owner_id: UserId,
    #[serde(deserialize_with = "super::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<UserId>,
}

/// Body of `POST /tasks`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Admin only. Without it an admin's task goes to every user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

impl TaskCreate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            assignee_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("Title", &self.title)
    }
}

/// Body of `PATCH /tasks/{id}`. Unset fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.title {
            Some(ref title) => require_non_empty("Title", title),
            None => Ok(()),
        }
    }
}

/// Parse the task count out of a create acknowledgement ("3 task(s) created successfully")
pub fn created_count(message: &str) -> Option<usize> {
    message.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str_variants() {
        assert_eq!("pending".parse::<TaskStatus>().unwrap(), TaskStatus::Pending);
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("In Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("DONE".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_parse_task_response() {
        let json = r#"{
            "id": "6650a1",
            "title": "Write report",
            "description": null,
            "status": "in_progress",
            "owner_id": "u1",
            "created_at": "2024-05-01T10:00:00.123456",
            "updated_at": null,
            "updated_by": null
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.owner_id, UserId::from("u1"));
        assert!(task.description.is_none());
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn test_create_omits_unset_fields() {
        let body = serde_json::to_value(TaskCreate::new("Ship it")).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Ship it", "status": "pending"}));
    }

    #[test]
    fn test_update_sends_only_set_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(!update.is_empty());
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"status": "done"}));
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        assert_eq!(
            TaskCreate::new("   ").validate(),
            Err(ValidationError::EmptyField("Title"))
        );
        let update = TaskUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_created_count() {
        assert_eq!(created_count("3 task(s) created successfully"), Some(3));
        assert_eq!(created_count("created"), None);
        assert_eq!(created_count(""), None);
    }
}
