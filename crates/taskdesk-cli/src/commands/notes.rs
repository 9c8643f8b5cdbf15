use anyhow::{anyhow, bail, Result};
use clap::Subcommand;
use tracing::info;

use taskdesk_core::access::can_modify_note;
use taskdesk_core::api::ApiError;
use taskdesk_core::gate::Route;
use taskdesk_core::models::{parse_recipients, Note, NoteCreate, NoteUpdate, NoteVisibility};
use taskdesk_core::ApiClient;

use super::{confirm, print_json};
use crate::app::App;
use crate::views::{render_note, render_notes};

#[derive(Subcommand)]
pub enum NoteCommand {
    /// List your notes, notes shared with you and public notes
    List,
    /// Create a note
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "private")]
        visibility: NoteVisibility,
        /// Comma-separated recipient emails (required for shared notes)
        #[arg(long)]
        share: Option<String>,
    },
    /// Edit a note you own
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        visibility: Option<NoteVisibility>,
        #[arg(long)]
        share: Option<String>,
    },
    /// Delete a note you own
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub async fn run(app: &mut App, command: NoteCommand) -> Result<()> {
    let api = app.authorized_api(Route::Notes)?;

    match command {
        NoteCommand::List => {
            let notes = match api.list_notes().await {
                Ok(notes) => notes,
                Err(e) => return Err(app.api_failure(e, "Failed to fetch notes")),
            };
            if app.json {
                return print_json(&notes);
            }
            print!("{}", render_notes(&notes, app.profile()));
        }
        NoteCommand::Create {
            title,
            content,
            visibility,
            share,
        } => {
            let note = NoteCreate {
                title,
                content,
                visibility,
                shared_with_emails: share.as_deref().map(parse_recipients),
            };
            note.validate()?;

            let created = match api.create_note(&note).await {
                Ok(created) => created,
                Err(e) => return Err(app.api_failure(e, "Failed to create note")),
            };
            info!(note_id = %created.id, "Note created");
            if app.json {
                return print_json(&created);
            }
            print!("{}", render_note(&created, app.profile()));
        }
        NoteCommand::Edit {
            id,
            title,
            content,
            visibility,
            share,
        } => {
            let update = NoteUpdate {
                title,
                content,
                visibility,
                shared_with_emails: share.as_deref().map(parse_recipients),
            };
            if update.is_empty() {
                bail!("Nothing to change. Pass --title, --content, --visibility or --share.");
            }
            update.validate()?;
            owned_note(app, &api, &id, "edit").await?;

            let ack = match api.update_note(&id, &update).await {
                Ok(ack) => ack,
                Err(e) => return Err(denied_or_failure(app, e, "edit", "Failed to update note")),
            };
            if app.json {
                return print_json(&ack);
            }
            println!("{}", ack.message);
        }
        NoteCommand::Delete { id, yes } => {
            let note = owned_note(app, &api, &id, "delete").await?;
            if !yes && !confirm(&format!("Delete note \"{}\"?", note.title))? {
                println!("Cancelled.");
                return Ok(());
            }
            if let Err(e) = api.delete_note(&id).await {
                return Err(denied_or_failure(app, e, "delete", "Failed to delete note"));
            }
            println!("Note deleted.");
        }
    }
    Ok(())
}

/// Look the note up and check the signed-in user owns it
async fn owned_note(app: &mut App, api: &ApiClient, id: &str, action: &str) -> Result<Note> {
    let notes = match api.list_notes().await {
        Ok(notes) => notes,
        Err(e) => return Err(app.api_failure(e, "Failed to fetch notes")),
    };
    let Some(note) = notes.into_iter().find(|note| note.id == id) else {
        bail!("Note not found");
    };
    if !can_modify_note(&note, app.profile()) {
        bail!("You are not allowed to {} this note", action);
    }
    Ok(note)
}

fn denied_or_failure(app: &mut App, err: anyhow::Error, action: &str, fallback: &str) -> anyhow::Error {
    if let Some(ApiError::AccessDenied(_)) = taskdesk_core::api::error::find_api_error(&err) {
        return anyhow!("You are not allowed to {} this note", action);
    }
    app.api_failure(err, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::signed_in_app;
    use crate::app::SESSION_EXPIRED;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_listing(owner: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "n1",
                "title": "Groceries",
                "content": "milk",
                "owner_id": owner,
                "visibility": "public",
                "created_at": "2024-05-01T10:00:00"
            }])))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_server_refusal_reads_as_not_allowed() {
        let server = server_listing("u1").await;
        Mock::given(method("DELETE"))
            .and(path("/notes/n1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not authorized"})))
            .expect(1)
            .mount(&server)
            .await;
        let mut app = signed_in_app(server.uri()).await;

        let err = run(&mut app, NoteCommand::Delete { id: "n1".into(), yes: true })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "You are not allowed to delete this note");
        assert!(app.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_edit_of_foreign_note_refused_locally() {
        let server = server_listing("u2").await;
        Mock::given(method("PATCH"))
            .and(path("/notes/n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(0)
            .mount(&server)
            .await;
        let mut app = signed_in_app(server.uri()).await;

        let command = NoteCommand::Edit {
            id: "n1".into(),
            title: Some("Mine now".into()),
            content: None,
            visibility: None,
            share: None,
        };
        let err = run(&mut app, command).await.unwrap_err();
        assert_eq!(err.to_string(), "You are not allowed to edit this note");
    }

    #[tokio::test]
    async fn test_missing_note_reported() {
        let server = server_listing("u1").await;
        let mut app = signed_in_app(server.uri()).await;

        let err = run(&mut app, NoteCommand::Delete { id: "zzz".into(), yes: true })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Note not found");
    }

    #[tokio::test]
    async fn test_unauthorized_still_ends_session() {
        let server = MockServer::start().await;
        let mut app = signed_in_app(server.uri()).await;

        let err = denied_or_failure(&mut app, ApiError::Unauthorized.into(), "delete", "Failed to delete note");
        assert_eq!(err.to_string(), SESSION_EXPIRED);
        assert!(!app.session.is_authenticated());

        let denied = denied_or_failure(
            &mut app,
            ApiError::AccessDenied("nope".into()).into(),
            "edit",
            "Failed to update note",
        );
        assert_eq!(denied.to_string(), "You are not allowed to edit this note");
    }
}
