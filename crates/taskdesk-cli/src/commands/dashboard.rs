use anyhow::Result;

use taskdesk_core::gate::Route;

use super::print_json;
use crate::app::App;
use crate::views::{render_dashboard, DASHBOARD_PREVIEW_LEN};

pub async fn show(app: &mut App) -> Result<()> {
    let api = app.authorized_api(Route::Dashboard)?;

    let (tasks, notes) = match futures::try_join!(api.list_tasks(None), api.list_notes()) {
        Ok(lists) => lists,
        Err(e) => return Err(app.api_failure(e, "Failed to load dashboard data")),
    };

    if app.json {
        let preview = serde_json::json!({
            "tasks": &tasks[..tasks.len().min(DASHBOARD_PREVIEW_LEN)],
            "notes": &notes[..notes.len().min(DASHBOARD_PREVIEW_LEN)],
        });
        return print_json(&preview);
    }
    print!("{}", render_dashboard(&tasks, &notes));
    Ok(())
}
