use std::io;

use crossterm::terminal;

use crate::client::HTTPClient;
use crate::models::{CLIConfig, TaskStatus};
use crate::render;
use crate::state::{CreateForm, Dashboard, Layout, Page};

const FALLBACK_WIDTH: u16 = 100;

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
    pub page: Page,
    pub dashboard: Dashboard,
    pub form: CreateForm,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self {
            config,
            client,
            page: Page::Dashboard,
            dashboard: Dashboard::default(),
            form: CreateForm::default(),
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        self.navigate(Page::Dashboard);
        loop {
            render::prompt(self.page);
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if !line.starts_with('/') {
                render::info("commands start with /, type /help");
                continue;
            }
            if self.handle_command(&line) {
                break;
            }
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(self.page),
            "config" => render::config(&self.config),
            "base" => self.set_base(rest),
            "dashboard" => self.navigate(Page::Dashboard),
            "create" => self.navigate(Page::CreateTask),
            _ => match self.page {
                Page::Dashboard => self.dashboard_command(cmd, rest),
                Page::CreateTask => self.form_command(cmd, rest),
            },
        }
        false
    }

    fn dashboard_command(&mut self, cmd: &str, rest: &str) {
        match cmd {
            "edit" => {
                if let Some(id) = self.task_id(rest) {
                    self.dashboard.begin_edit(&id);
                    self.show();
                }
            }
            "title" => {
                if self.dashboard.set_edit_title(rest) {
                    self.show();
                } else {
                    render::error("no task is being edited, use /edit <n>");
                }
            }
            "desc" => {
                if self.dashboard.set_edit_description(rest) {
                    self.show();
                } else {
                    render::error("no task is being edited, use /edit <n>");
                }
            }
            "save" => match self.dashboard.save_edit(&self.client) {
                Some(toast) => {
                    render::toast(&toast);
                    self.show();
                }
                None => render::error("no task is being edited, use /edit <n>"),
            },
            "cancel" => {
                self.dashboard.cancel_edit();
                self.show();
            }
            "status" => {
                if let Some(id) = self.task_id(rest) {
                    self.dashboard.open_popover(&id);
                    self.show();
                }
            }
            "pick" => {
                let Some(id) = self.dashboard.open_popover_id.clone() else {
                    render::error("no status chooser open, use /status <n>");
                    return;
                };
                match rest.parse::<TaskStatus>() {
                    Ok(status) => {
                        let toast = self.dashboard.select_status(&self.client, &id, status);
                        render::toast(&toast);
                        self.show();
                    }
                    Err(err) => render::error(&err.to_string()),
                }
            }
            "close" => {
                self.dashboard.close_popover();
                self.show();
            }
            "delete" => {
                if let Some(id) = self.task_id(rest) {
                    let toast = self.dashboard.delete(&self.client, &id);
                    render::toast(&toast);
                    self.show();
                }
            }
            _ => render::info("unknown command, type /help"),
        }
    }

    fn form_command(&mut self, cmd: &str, rest: &str) {
        match cmd {
            "title" => {
                self.form.title = rest.to_string();
                self.show();
            }
            "desc" => {
                self.form.description = rest.to_string();
                self.show();
            }
            "status" => match rest.parse::<TaskStatus>() {
                Ok(status) => {
                    self.form.status = status;
                    self.show();
                }
                Err(err) => render::error(&err.to_string()),
            },
            "submit" => match self.form.submit(&self.client) {
                Ok(toast) => {
                    render::toast(&toast);
                    self.navigate(Page::Dashboard);
                }
                Err(toast) => render::toast(&toast),
            },
            _ => render::info("unknown command, type /help"),
        }
    }

    /// Switching to the dashboard mounts it again, which refetches the list.
    fn navigate(&mut self, page: Page) {
        self.page = page;
        if page == Page::Dashboard {
            if let Some(toast) = self.dashboard.mount(&self.client) {
                render::toast(&toast);
            }
        }
        self.show();
    }

    fn show(&self) {
        match self.page {
            Page::Dashboard => {
                let width = self.width();
                let layout = Layout::from_width(width);
                print!("{}", render::dashboard(&self.dashboard, layout, width));
            }
            Page::CreateTask => print!("{}", render::create_form(&self.form)),
        }
    }

    fn width(&self) -> u16 {
        self.config.width.unwrap_or_else(|| {
            terminal::size()
                .map(|(cols, _)| cols)
                .unwrap_or(FALLBACK_WIDTH)
        })
    }

    fn task_id(&self, rest: &str) -> Option<String> {
        let found = rest
            .parse::<usize>()
            .ok()
            .and_then(|position| self.dashboard.task_at(position));
        match found {
            Some(task) => Some(task.id.clone()),
            None => {
                render::error("unknown task number");
                None
            }
        }
    }

    fn set_base(&mut self, rest: &str) {
        if rest.is_empty() {
            render::info(&format!("base: {}", self.config.base_url));
            return;
        }
        match HTTPClient::new(rest) {
            Ok(client) => {
                self.config.base_url = rest.to_string();
                self.client = client;
                render::info("base url updated");
                if self.page == Page::Dashboard {
                    self.navigate(Page::Dashboard);
                }
            }
            Err(err) => render::error(&err.to_string()),
        }
    }
}
