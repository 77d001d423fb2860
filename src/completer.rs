use reedline::{Completer, Span, Suggestion};
use std::sync::{Arc, Mutex};

pub const COMMANDS: &[&str] = &[
    "sort",
    "click",
    "filter",
    "filters",
    "page",
    "next",
    "prev",
    "per-page",
    "hide",
    "show",
    "columns",
    "reset-columns",
    "use",
    "tables",
    "\\export",
    "\\logs",
    "\\help",
    "\\clear",
    "\\quit",
];

/// Commands whose argument is a column
const COLUMN_COMMANDS: &[&str] = &["sort", "click", "hide", "show"];

/// Column names of the active table, replaced when the session switches tables
pub type SharedColumns = Arc<Mutex<Vec<String>>>;

pub struct CommandCompleter {
    columns: SharedColumns,
}

impl CommandCompleter {
    pub fn new(columns: SharedColumns) -> Self {
        Self { columns }
    }

    fn columns(&self) -> Vec<String> {
        self.columns
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn candidates(&self, words: &[&str]) -> Vec<(String, Option<String>)> {
        match words {
            [] => COMMANDS
                .iter()
                .map(|c| (c.to_string(), Some("command".to_string())))
                .collect(),
            [command] if COLUMN_COMMANDS.contains(command) => self
                .columns()
                .into_iter()
                .map(|c| (c, Some("column".to_string())))
                .collect(),
            ["sort", _] => ["asc", "desc"]
                .iter()
                .map(|d| (d.to_string(), Some("direction".to_string())))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let start_pos = input
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let partial = input[start_pos..].to_lowercase();
        let words: Vec<&str> = input[..start_pos].split_whitespace().collect();

        self.candidates(&words)
            .into_iter()
            .filter(|(value, _)| value.to_lowercase().starts_with(&partial))
            .map(|(value, description)| Suggestion {
                value,
                description,
                extra: None,
                span: Span {
                    start: start_pos,
                    end: pos,
                },
                style: None,
                append_whitespace: words.is_empty(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(completer: &mut CommandCompleter, line: &str) -> Vec<String> {
        completer
            .complete(line, line.len())
            .into_iter()
            .map(|s| s.value)
            .collect()
    }

    #[test]
    fn test_completes_commands_and_columns() {
        let columns: SharedColumns = Arc::new(Mutex::new(vec!["Name".to_string(), "Total".to_string()]));
        let mut completer = CommandCompleter::new(columns);
        assert_eq!(values(&mut completer, "pe"), vec!["per-page"]);
        assert_eq!(values(&mut completer, "sort t"), vec!["Total"]);
        assert_eq!(values(&mut completer, "sort Name d"), vec!["desc"]);
        assert!(values(&mut completer, "page 2 ").is_empty());
    }

    #[test]
    fn test_columns_follow_table_switch() {
        let columns: SharedColumns = Arc::new(Mutex::new(vec!["Order".to_string()]));
        let mut completer = CommandCompleter::new(columns.clone());
        assert_eq!(values(&mut completer, "hide O"), vec!["Order"]);

        *columns.lock().unwrap() = vec!["Region".to_string(), "Owner".to_string()];
        assert_eq!(values(&mut completer, "hide O"), vec!["Owner"]);
        assert!(values(&mut completer, "show Ord").is_empty());
    }
}
