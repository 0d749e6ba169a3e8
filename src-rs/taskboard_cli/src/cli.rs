use std::env;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://localhost:3000";

pub fn parse_config() -> CLIConfig {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args(
        CLIConfig {
            base_url: env_or("TASKBOARD_URL", DEFAULT_URL.to_string()),
            width: env_opt("TASKBOARD_WIDTH").and_then(|raw| raw.parse::<u16>().ok()),
        },
        &args,
    )
}

fn parse_args(mut cfg: CLIConfig, args: &[String]) -> CLIConfig {
    let mut idx = 0;
    while idx < args.len() {
        match args[idx].as_str() {
            "--base" => {
                if let Some(value) = args.get(idx + 1) {
                    cfg.base_url = value.clone();
                    idx += 1;
                }
            }
            "--width" => {
                if let Some(value) = args.get(idx + 1) {
                    if let Ok(parsed) = value.parse::<u16>() {
                        cfg.width = Some(parsed);
                    }
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    cfg
}

fn env_or(key: &str, fallback: String) -> String {
    env::var(key).unwrap_or(fallback)
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
