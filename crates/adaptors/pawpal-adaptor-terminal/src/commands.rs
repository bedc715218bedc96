//! REPL line parsing

use pawpal_core::{payload, ToolArgs};

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text for the companion
    Chat(String),
    /// Mood, energy and last interaction
    Status,
    /// List capabilities
    Tools,
    /// Call a capability directly
    Tool {
        /// Capability name
        name: String,
        /// Arguments parsed from a JSON object
        args: ToolArgs,
    },
    /// Fire a proactive event by name
    Trigger(String),
    /// Show the command list
    Help,
    /// Leave
    Quit,
}

/// Usage text for `/help`
pub const HELP: &str = "\
/status                 mood, energy, last interaction
/tools                  list capabilities
/tool <name> [json]     call a capability, e.g. /tool add_reminder {\"title\":\"喝水\",\"time\":\"15:00\"}
/trigger <event>        fire a proactive event, e.g. /trigger lonely_check
/help                   this text
/quit                   exit";

/// Parse a line; `Err` carries a message for the user
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Chat(line.to_string()));
    };

    let (word, tail) = match rest.split_once(char::is_whitespace) {
        Some((word, tail)) => (word, tail.trim()),
        None => (rest, ""),
    };

    match word {
        "status" => Ok(Command::Status),
        "tools" => Ok(Command::Tools),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "trigger" if tail.is_empty() => Err("usage: /trigger <event>".to_string()),
        "trigger" => Ok(Command::Trigger(tail.to_string())),
        "tool" => parse_tool(tail),
        other => Err(format!("unknown command /{}; try /help", other)),
    }
}

fn parse_tool(tail: &str) -> Result<Command, String> {
    let (name, raw_args) = match tail.split_once(char::is_whitespace) {
        Some((name, raw)) => (name, raw.trim()),
        None => (tail, ""),
    };
    if name.is_empty() {
        return Err("usage: /tool <name> [json-args]".to_string());
    }

    let args = if raw_args.is_empty() {
        ToolArgs::new()
    } else {
        let value: serde_json::Value =
            serde_json::from_str(raw_args).map_err(|e| format!("bad JSON arguments: {}", e))?;
        if !value.is_object() {
            return Err("arguments must be a JSON object".to_string());
        }
        payload(value)
    };

    Ok(Command::Tool {
        name: name.to_string(),
        args,
    })
}
