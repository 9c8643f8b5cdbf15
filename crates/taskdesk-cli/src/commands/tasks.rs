use anyhow::{bail, Result};
use clap::Subcommand;
use tracing::info;

use taskdesk_core::access::can_assign_tasks;
use taskdesk_core::gate::Route;
use taskdesk_core::models::task::created_count;
use taskdesk_core::models::{TaskCreate, TaskStatus, TaskUpdate};

use super::print_json;
use crate::app::App;
use crate::views::render_tasks;

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks visible to you
    List {
        /// Only show tasks with this status (pending, in_progress, done)
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Create a task
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "pending")]
        status: TaskStatus,
        /// Assign to a specific user (admins only; default is everyone)
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Change a task's title, description or status
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete { id: String },
}

pub async fn run(app: &mut App, command: TaskCommand) -> Result<()> {
    let api = app.authorized_api(Route::Tasks)?;

    match command {
        TaskCommand::List { status } => {
            let tasks = match api.list_tasks(status).await {
                Ok(tasks) => tasks,
                Err(e) => return Err(app.api_failure(e, "Failed to load tasks")),
            };
            if app.json {
                return print_json(&tasks);
            }
            print!("{}", render_tasks(&tasks, app.profile()));
        }
        TaskCommand::Create {
            title,
            description,
            status,
            assignee,
        } => {
            if assignee.is_some() && !can_assign_tasks(app.profile()) {
                bail!("Only admins can assign tasks");
            }
            let task = TaskCreate {
                title,
                description: description.filter(|d| !d.trim().is_empty()),
                status,
                assignee_id: assignee,
            };
            task.validate()?;

            let ack = match api.create_task(&task).await {
                Ok(ack) => ack,
                Err(e) => return Err(app.api_failure(e, "Failed to create task")),
            };
            info!(message = %ack.message, "Task created");
            if app.json {
                return print_json(&ack);
            }
            match created_count(&ack.message) {
                Some(n) => println!("{} task(s) created", n),
                None => println!("{}", ack.message),
            }
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            status,
        } => {
            let update = TaskUpdate {
                title,
                description,
                status,
            };
            if update.is_empty() {
                bail!("Nothing to change. Pass --title, --description or --status.");
            }
            update.validate()?;

            let ack = match api.update_task(&id, &update).await {
                Ok(ack) => ack,
                Err(e) => return Err(app.api_failure(e, "Failed to update task")),
            };
            if app.json {
                return print_json(&ack);
            }
            println!("{}", ack.message);
        }
        TaskCommand::Delete { id } => {
            if let Err(e) = api.delete_task(&id).await {
                return Err(app.api_failure(e, "Failed to delete task"));
            }
            println!("Task deleted.");
        }
    }
    Ok(())
}
