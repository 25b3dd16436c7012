use std::env;

use nu_ansi_term::{Color, Style};

/// Interactive prompt, either fixed text from the config or the shortened
/// working directory.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    custom: Option<String>,
    colored: bool,
}

impl Prompt {
    pub fn new(custom: Option<String>) -> Self {
        Self { custom, colored: true }
    }

    #[cfg(test)]
    fn plain(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Prompt text; a leading `!` marks that the previous command failed.
    pub fn render(&self, last_failed: bool) -> String {
        let body = match &self.custom {
            Some(prompt) => prompt.clone(),
            None => shortened_cwd(),
        };
        let marker = if last_failed { "!" } else { "" };

        if !self.colored {
            return format!("{marker}{body}");
        }
        format!(
            "{}{}",
            Color::Red.bold().paint(marker),
            Style::new().fg(Color::Green).paint(body)
        )
    }
}

fn shortened_cwd() -> String {
    let path = env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "no path".into());
    let home = env::var("HOME").unwrap_or_default();
    shorten(&path, &home)
}

/// `/home/me/src/mysh` with home `/home/me` becomes `~/s/mysh> `.
fn shorten(path: &str, home: &str) -> String {
    let path = match path.strip_prefix(home) {
        Some(rest) if !home.is_empty() && (rest.is_empty() || rest.starts_with('/')) => format!("~{rest}"),
        _ => path.to_string(),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let start = if path.starts_with('/') { "/" } else { "" };
    let Some((last, parents)) = segments.split_last() else {
        return format!("{start}> ");
    };

    let mut shortened: Vec<String> = parents
        .iter()
        .map(|seg| match seg.strip_prefix('.') {
            Some(rest) => format!(".{}", rest.chars().next().unwrap_or_default()),
            None => seg.chars().next().unwrap_or_default().to_string(),
        })
        .collect();
    shortened.push((*last).to_string());

    format!("{start}{}> ", shortened.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_parent_segments() {
        assert_eq!(shorten("/usr/local/bin", "/home/me"), "/u/l/bin> ");
        assert_eq!(shorten("/home/me/src/mysh", "/home/me"), "~/s/mysh> ");
        assert_eq!(shorten("/home/me/.config/mysh", "/home/me"), "~/.c/mysh> ");
    }

    #[test]
    fn root_and_home() {
        assert_eq!(shorten("/", "/home/me"), "/> ");
        assert_eq!(shorten("/home/me", "/home/me"), "~> ");
        assert_eq!(shorten("/home/meow", "/home/me"), "/h/meow> ");
    }

    #[test]
    fn failure_marker() {
        let prompt = Prompt::new(Some("mysh> ".into())).plain();
        assert_eq!(prompt.render(false), "mysh> ");
        assert_eq!(prompt.render(true), "!mysh> ");
    }
}
