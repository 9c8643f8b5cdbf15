//! Plain-text rendering of tasks, notes and the dashboard.

use chrono::{DateTime, Local, Utc};

use taskdesk_core::access::{can_modify_note, can_modify_task, note_reach};
use taskdesk_core::models::{Note, Profile, Task};

/// How many items the dashboard previews per list
pub const DASHBOARD_PREVIEW_LEN: usize = 3;

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn render_task(task: &Task, profile: Option<&Profile>) -> String {
    let mut out = format!("{}  {}\n", task.id, task.title);
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("    {}\n", description));
    }
    out.push_str(&format!("    Status: {}", task.status));
    if profile.is_some_and(Profile::is_admin) {
        out.push_str(&format!("  ·  Assignee: {}", task.owner_id));
    }
    out.push('\n');
    if can_modify_task(task, profile) {
        out.push_str(&format!(
            "    Actions: taskdesk tasks edit {id} | taskdesk tasks delete {id}\n",
            id = task.id
        ));
    }
    out
}

pub fn render_tasks(tasks: &[Task], profile: Option<&Profile>) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }
    tasks
        .iter()
        .map(|task| render_task(task, profile))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_note(note: &Note, profile: Option<&Profile>) -> String {
    let mut out = format!(
        "{}  {}  [{}, {}]\n",
        note.id,
        note.title,
        note.visibility,
        note_reach(note, profile).label()
    );
    for line in note.content.lines() {
        out.push_str(&format!("    {}\n", line));
    }
    out.push_str(&format!(
        "    Created by {} · {}\n",
        note.author_label(),
        format_timestamp(&note.created_at)
    ));
    if can_modify_note(note, profile) {
        out.push_str(&format!(
            "    Actions: taskdesk notes edit {id} | taskdesk notes delete {id}\n",
            id = note.id
        ));
    }
    out
}

pub fn render_notes(notes: &[Note], profile: Option<&Profile>) -> String {
    if notes.is_empty() {
        return "No notes yet. Create one with `taskdesk notes create`.\n".to_string();
    }
    notes
        .iter()
        .map(|note| render_note(note, profile))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_dashboard(tasks: &[Task], notes: &[Note]) -> String {
    let tasks = &tasks[..tasks.len().min(DASHBOARD_PREVIEW_LEN)];
    let notes = &notes[..notes.len().min(DASHBOARD_PREVIEW_LEN)];

    let mut out = format!("Tasks ({} recent)\n", tasks.len());
    if tasks.is_empty() {
        out.push_str("  No tasks yet\n");
    }
    for task in tasks {
        out.push_str(&format!("  - {} ({})\n", task.title, task.status));
    }
    out.push_str("  View all: taskdesk tasks list\n\n");

    out.push_str(&format!("Notes ({} recent)\n", notes.len()));
    if notes.is_empty() {
        out.push_str("  No notes yet\n");
    }
    for note in notes {
        out.push_str(&format!("  - {}\n", note.title));
    }
    out.push_str("  View all: taskdesk notes list\n");
    out
}

pub fn render_profile(profile: &Profile) -> String {
    let mut out = format!("{} ({})\n  id: {}\n", profile.email, profile.role.as_str(), profile.id);
    if let Some(ref created_at) = profile.created_at {
        out.push_str(&format!("  member since: {}\n", format_timestamp(created_at)));
    }
    out
}
