//! Line-oriented control of a watch session from stdin.

use codeferry_watcher::{AffordanceId, KeyChord, UserAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Action(UserAction),
    List,
    Quit,
}

pub const HELP: &str = "commands: <chord> (e.g. ctrl+shift+e) | click <id> | copy <text> | list | quit";

/// Parse one stdin line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_lowercase().as_str() {
        "list" | "ls" => ConsoleCommand::List,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        "click" => {
            let id: AffordanceId = rest.parse().map_err(|_| format!("not an affordance id: `{rest}`"))?;
            ConsoleCommand::Action(UserAction::Click(id))
        }
        "copy" => ConsoleCommand::Action(UserAction::ClipboardCopy(rest.to_string())),
        _ if head.contains('+') && rest.is_empty() => {
            let chord: KeyChord = head.parse().map_err(|e| format!("{e}"))?;
            ConsoleCommand::Action(UserAction::KeyPress(chord))
        }
        _ => return Err(format!("unknown command `{head}`; {HELP}")),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_command() {
        assert_eq!(parse_line("list"), Ok(Some(ConsoleCommand::List)));
        assert_eq!(parse_line("  QUIT "), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(
            parse_line("click #3"),
            Ok(Some(ConsoleCommand::Action(UserAction::Click(AffordanceId(3)))))
        );
        assert_eq!(
            parse_line("copy git log --oneline"),
            Ok(Some(ConsoleCommand::Action(UserAction::ClipboardCopy("git log --oneline".into()))))
        );
        assert_eq!(
            parse_line("ctrl+shift+e"),
            Ok(Some(ConsoleCommand::Action(UserAction::KeyPress("Ctrl+Shift+E".parse().unwrap()))))
        );
        assert_eq!(parse_line(""), Ok(None));
    }

    #[test]
    fn reports_bad_input() {
        assert!(parse_line("click abc").is_err());
        assert!(parse_line("dance").unwrap_err().contains("unknown command"));
        assert!(parse_line("ctrl+").is_err());
    }
}
