//! Ownership predicates.
//!
//! These only decide which actions to offer; the backend enforces the real
//! policy and answers 403 when the client guesses wrong.

use crate::models::{Note, NoteVisibility, Profile, Task, UserId};

/// Whether the signed-in user owns a resource. False when nobody is signed in.
pub fn is_owner(owner_id: &UserId, profile: Option<&Profile>) -> bool {
    profile.is_some_and(|p| &p.id == owner_id)
}

/// Only the owner may edit or delete a note
pub fn can_modify_note(note: &Note, profile: Option<&Profile>) -> bool {
    is_owner(&note.owner_id, profile)
}

/// The task listing only contains tasks assigned to the caller (or every
/// task, for admins), so any signed-in user may act on what they see.
pub fn can_modify_task(_task: &Task, profile: Option<&Profile>) -> bool {
    profile.is_some()
}

/// Admins may assign a new task to someone else or to everyone
pub fn can_assign_tasks(profile: Option<&Profile>) -> bool {
    profile.is_some_and(Profile::is_admin)
}

/// Why a note shows up in the caller's listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteReach {
    Own,
    SharedWithMe,
    Public,
    /// Someone else's private note. The notes listing never returns these,
    /// for admins included, so it only shows up for hand-built records.
    OthersPrivate,
}

impl NoteReach {
    pub fn label(&self) -> &'static str {
        match self {
            NoteReach::Own => "mine",
            NoteReach::SharedWithMe => "shared with me",
            NoteReach::Public => "public",
            NoteReach::OthersPrivate => "private",
        }
    }
}

pub fn note_reach(note: &Note, profile: Option<&Profile>) -> NoteReach {
    if can_modify_note(note, profile) {
        return NoteReach::Own;
    }
    match note.visibility {
        NoteVisibility::Shared => NoteReach::SharedWithMe,
        NoteVisibility::Public => NoteReach::Public,
        NoteVisibility::Private => NoteReach::OthersPrivate,
    }
}
