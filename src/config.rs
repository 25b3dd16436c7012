use std::{
    fs::{self, create_dir_all},
    path::{Path, PathBuf},
};

const DEFAULT_FILE: &str = "\
# mysh configuration
#prompt = \"mysh> \"
greeting = \"Welcome to mysh!\"
farewell = \"mysh: exiting\"
#startup
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: Option<String>,
    pub greeting: Option<String>,
    pub farewell: Option<String>,
    pub startup: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: None,
            greeting: Some("Welcome to mysh!".to_string()),
            farewell: Some("mysh: exiting".to_string()),
            startup: vec![],
        }
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mysh").join("mysh.conf"))
}

/// Loads the user's config, writing the commented default file first if
/// there is none yet.
pub fn init() -> Config {
    let Some(config_path) = config_file_path() else {
        log::debug!("no config directory, using defaults");
        return Config::default();
    };
    init_at(&config_path)
}

fn init_at(config_path: &Path) -> Config {
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = create_dir_all(parent) {
                log::warn!("could not create {}: {e}", parent.display());
            }
        }
        if let Err(e) = fs::write(config_path, DEFAULT_FILE) {
            log::warn!("could not write {}: {e}", config_path.display());
        }
    }
    load_config(config_path)
}

pub fn load_config(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) => {
            log::debug!("reading {} failed: {e}", path.display());
            Config::default()
        }
    }
}

fn parse_config(content: &str) -> Config {
    let mut config = Config::default();
    let mut in_startup = false;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(comment) = line.strip_prefix('#') {
            if comment.trim().eq_ignore_ascii_case("startup") {
                in_startup = true;
            }
            continue;
        }

        if in_startup {
            config.startup.push(line.to_string());
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            log::warn!("ignoring config line: {line}");
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim() {
            "prompt" => config.prompt = Some(value),
            "greeting" => config.greeting = Some(value).filter(|v| !v.is_empty()),
            "farewell" => config.farewell = Some(value).filter(|v| !v.is_empty()),
            other => log::warn!("unknown config key: {other}"),
        }
    }
    config
}
