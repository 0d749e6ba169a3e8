use std::fmt::Write as _;
use std::io::{self, Write};

use crate::models::{CLIConfig, Task, TaskStatus, Toast, ToastLevel};
use crate::state::{CreateForm, Dashboard, Layout, Page};

const INDEX_WIDTH: usize = 4;
const STATUS_WIDTH: usize = 12;

pub fn banner(cfg: &CLIConfig) {
    println!("Taskboard");
    println!("API: {}", cfg.base_url);
    println!("Type /help for commands.");
}

pub fn prompt(page: Page) {
    match page {
        Page::Dashboard => print!("dashboard> "),
        Page::CreateTask => print!("create> "),
    }
    let _ = io::stdout().flush();
}

pub fn help(page: Page) {
    println!("Commands:");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
    println!("  /dashboard             Go to the dashboard (reloads tasks)");
    println!("  /create                Go to the create form");
    println!("  /config                Show current config");
    println!("  /base <url>            Update base URL");
    match page {
        Page::Dashboard => {
            println!("  /edit <n>              Edit task n");
            println!("  /title <text>          Set title of the task under edit");
            println!("  /desc <text>           Set description of the task under edit");
            println!("  /save                  Save the task under edit");
            println!("  /cancel                Discard the edit");
            println!("  /status <n>            Choose a new status for task n");
            println!("  /pick <status>         Apply the status (pending|completed)");
            println!("  /close                 Close the status chooser");
            println!("  /delete <n>            Delete task n");
        }
        Page::CreateTask => {
            println!("  /title <text>          Set title");
            println!("  /desc <text>           Set description");
            println!("  /status <status>       Set status (pending|completed)");
            println!("  /submit                Create the task");
        }
    }
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    match cfg.width {
        Some(width) => println!("  width: {}", width),
        None => println!("  width: terminal"),
    }
}

pub fn toast(toast: &Toast) {
    match toast.level {
        ToastLevel::Success => println!("ok: {}", toast.message),
        ToastLevel::Warning => println!("warning: {}", toast.message),
        ToastLevel::Error => eprintln!("error: {}", toast.message),
    }
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}

pub fn dashboard(state: &Dashboard, layout: Layout, width: u16) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Task Dashboard");
    if !state.loaded {
        let _ = writeln!(out, "Loading tasks...");
        return out;
    }
    if state.tasks.is_empty() {
        let _ = writeln!(out, "No tasks yet. Use /create to add one.");
        return out;
    }
    match layout {
        Layout::Table => table(&mut out, state, width as usize),
        Layout::Cards => cards(&mut out, state),
    }
    out
}

pub fn create_form(form: &CreateForm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Create Task");
    let _ = writeln!(out, "  title:       {}", placeholder(&form.title));
    let _ = writeln!(out, "  description: {}", placeholder(&form.description));
    let _ = writeln!(out, "  status:      {}", form.status.label());
    out
}

fn table(out: &mut String, state: &Dashboard, width: usize) {
    let remaining = width.saturating_sub(INDEX_WIDTH + STATUS_WIDTH + 3).max(20);
    let title_width = remaining * 2 / 5;
    let desc_width = remaining - title_width;

    let _ = writeln!(
        out,
        "{:<iw$} {:<tw$} {:<dw$} {:<sw$}",
        "#",
        "Title",
        "Description",
        "Status",
        iw = INDEX_WIDTH,
        tw = title_width,
        dw = desc_width,
        sw = STATUS_WIDTH,
    );
    let _ = writeln!(out, "{}", "-".repeat(INDEX_WIDTH + title_width + desc_width + STATUS_WIDTH + 3));

    for (idx, task) in state.tasks.iter().enumerate() {
        let (title, description, status) = match &state.editing {
            Some(session) if session.task_id == task.id => (
                format!("> {}", session.title),
                session.description.clone(),
                "editing".to_string(),
            ),
            _ => (task.title.clone(), task.description.clone(), badge(task.status)),
        };
        let _ = writeln!(
            out,
            "{:<iw$} {:<tw$} {:<dw$} {:<sw$}",
            idx + 1,
            truncate(&title, title_width),
            truncate(&description, desc_width),
            status,
            iw = INDEX_WIDTH,
            tw = title_width,
            dw = desc_width,
            sw = STATUS_WIDTH,
        );
        if state.is_editing(&task.id) {
            let _ = writeln!(out, "{:iw$} /save | /cancel", "", iw = INDEX_WIDTH);
        }
        if state.open_popover_id.as_deref() == Some(task.id.as_str()) {
            let _ = writeln!(out, "{:iw$} {}", "", popover(task.status), iw = INDEX_WIDTH);
        }
    }
}

fn cards(out: &mut String, state: &Dashboard) {
    for (idx, task) in state.tasks.iter().enumerate() {
        match &state.editing {
            Some(session) if session.task_id == task.id => {
                let _ = writeln!(out, "#{} (editing)", idx + 1);
                let _ = writeln!(out, "   title:       {}", placeholder(&session.title));
                let _ = writeln!(out, "   description: {}", placeholder(&session.description));
                let _ = writeln!(out, "   /save | /cancel");
            }
            _ => card(out, idx + 1, task),
        }
        if state.open_popover_id.as_deref() == Some(task.id.as_str()) {
            let _ = writeln!(out, "   {}", popover(task.status));
        }
        let _ = writeln!(out);
    }
}

fn card(out: &mut String, position: usize, task: &Task) {
    let _ = writeln!(out, "#{} {} {}", position, task.title, badge(task.status));
    let _ = writeln!(out, "   {}", task.description);
    if let Some(created_at) = task.created_at {
        let _ = writeln!(out, "   created {}", created_at.format("%Y-%m-%d %H:%M"));
    }
}

fn popover(current: TaskStatus) -> String {
    let options: Vec<String> = TaskStatus::ALL
        .iter()
        .map(|status| {
            let mark = if *status == current { "(x)" } else { "( )" };
            format!("{} {}", mark, status.label())
        })
        .collect();
    format!("status: {}  /pick <status>", options.join("  "))
}

fn badge(status: TaskStatus) -> String {
    format!("[{}]", status.label())
}

fn placeholder(value: &str) -> &str {
    if value.is_empty() {
        "<empty>"
    } else {
        value
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EditSession;

    fn sample() -> Dashboard {
        Dashboard {
            tasks: vec![
                Task {
                    id: "b".to_string(),
                    title: "Write report".to_string(),
                    description: "Quarterly numbers".to_string(),
                    status: TaskStatus::Pending,
                    created_at: None,
                },
                Task {
                    id: "a".to_string(),
                    title: "Buy milk".to_string(),
                    description: "2%".to_string(),
                    status: TaskStatus::Completed,
                    created_at: None,
                },
            ],
            loaded: true,
            ..Dashboard::default()
        }
    }

    #[test]
    fn empty_dashboard_shows_no_tasks_state() {
        let state = Dashboard {
            loaded: true,
            ..Dashboard::default()
        };
        let out = dashboard(&state, Layout::Table, 120);
        assert!(out.contains("No tasks yet"));
    }

    #[test]
    fn unfetched_dashboard_shows_loading() {
        let out = dashboard(&Dashboard::default(), Layout::Cards, 60);
        assert!(out.contains("Loading tasks..."));
        assert!(!out.contains("No tasks yet"));
    }

    #[test]
    fn table_lists_tasks_in_order() {
        let out = dashboard(&sample(), Layout::Table, 120);
        let report = out.find("Write report").unwrap();
        let milk = out.find("Buy milk").unwrap();
        assert!(report < milk);
        assert!(out.contains("[Pending]"));
        assert!(out.contains("[Completed]"));
        assert!(out.contains("Description"));
    }

    #[test]
    fn cards_render_one_block_per_task() {
        let out = dashboard(&sample(), Layout::Cards, 60);
        assert!(out.contains("#1 Write report [Pending]"));
        assert!(out.contains("#2 Buy milk [Completed]"));
        assert!(!out.contains("Description"));
    }

    #[test]
    fn edited_task_shows_buffer() {
        let mut state = sample();
        state.editing = Some(EditSession {
            task_id: "a".to_string(),
            title: "Buy oat milk".to_string(),
            description: String::new(),
            status: TaskStatus::Completed,
        });

        let table = dashboard(&state, Layout::Table, 120);
        assert!(table.contains("> Buy oat milk"));
        assert!(table.contains("/save | /cancel"));

        let cards = dashboard(&state, Layout::Cards, 60);
        assert!(cards.contains("title:       Buy oat milk"));
        assert!(cards.contains("description: <empty>"));
    }

    #[test]
    fn open_popover_marks_current_status() {
        let mut state = sample();
        state.open_popover_id = Some("b".to_string());

        let out = dashboard(&state, Layout::Table, 120);
        assert!(out.contains("(x) Pending  ( ) Completed"));
    }

    #[test]
    fn truncates_long_values() {
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("short", 6), "short");
    }

    #[test]
    fn create_form_shows_fields() {
        let form = CreateForm {
            title: "Buy milk".to_string(),
            ..CreateForm::default()
        };
        let out = create_form(&form);
        assert!(out.contains("title:       Buy milk"));
        assert!(out.contains("description: <empty>"));
        assert!(out.contains("status:      Pending"));
    }
}
