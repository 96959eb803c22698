//! Task management commands for CLI.

use clap::{Subcommand, ValueEnum};
use focusflick_core::task;
use focusflick_core::{Priority, Task, TaskDraft};

use super::{open_app, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task name
        name: String,
        /// Priority (default: low)
        #[arg(long, value_enum, default_value = "low")]
        priority: PriorityArg,
        /// Due date, MM/DD/YYYY or YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a task. Pass an empty string to clear due date or description
    Edit {
        /// Task ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New priority
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// New due date
        #[arg(long)]
        due: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task as done
    Done {
        /// Task ID
        id: String,
    },
    /// Mark a task as not done
    Undone {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Add a note to a task
    Note {
        /// Task ID
        id: String,
        /// Note text
        text: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        TaskAction::Add {
            name,
            priority,
            due,
            description,
        } => {
            let task = app.add_task(&TaskDraft {
                name,
                priority: priority.into(),
                due_date: due,
                description,
            })?;
            println!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { all, json } => {
            let mut tasks: Vec<&Task> = app
                .document()
                .user
                .tasks
                .iter()
                .filter(|t| all || !t.completed)
                .collect();
            tasks.sort_by_key(|t| (t.completed, t.priority, t.due_date));
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for t in tasks {
                    println!("{}", task_line(t));
                }
            }
        }
        TaskAction::Edit {
            id,
            name,
            priority,
            due,
            description,
        } => {
            let current = task::find(&app.document().user.tasks, &id)?;
            let draft = TaskDraft {
                name: name.unwrap_or_else(|| current.name.clone()),
                priority: priority.map(Priority::from).unwrap_or(current.priority),
                due_date: due.or_else(|| {
                    current
                        .due_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                }),
                description: description.or_else(|| current.description.clone()),
            };
            app.edit_task(&id, &draft)?;
            println!("Task updated: {id}");
        }
        TaskAction::Done { id } => {
            let events = app.set_task_completed(&id, true)?;
            println!("Task completed: {id}");
            if !events.is_empty() {
                print_json(&events)?;
            }
        }
        TaskAction::Undone { id } => {
            app.set_task_completed(&id, false)?;
            println!("Task reopened: {id}");
        }
        TaskAction::Delete { id } => {
            let task = app.delete_task(&id)?;
            println!("Task deleted: {} ({})", task.id, task.name);
        }
        TaskAction::Note { id, text } => {
            if app.add_task_note(&id, &text)? {
                println!("Note added to {id}");
            } else {
                println!("Empty note ignored");
            }
        }
    }
    Ok(())
}

fn task_line(t: &Task) -> String {
    let mark = if t.completed { "x" } else { " " };
    let due = t
        .due_date
        .map(|d| format!("  due {}", d.format("%m/%d/%Y")))
        .unwrap_or_default();
    let notes = match t.notes.len() {
        0 => String::new(),
        n => format!("  ({n} notes)"),
    };
    format!(
        "[{mark}] {}  {:<6} {}{due}{notes}",
        t.id,
        t.priority.label(),
        t.name
    )
}
