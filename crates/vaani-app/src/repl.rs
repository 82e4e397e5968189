//! Line commands understood by the terminal front end.

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text for the bot.
    Say(String),
    /// `/lang <code>`
    Language(String),
    /// `/langs`
    Languages,
    /// `/voice [phrase]`: capture session; the phrase stands in for speech.
    Voice(Option<String>),
    /// `/history`
    History,
    /// `/export`
    Export,
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
    /// An unrecognized slash command.
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  <text>            send a message
  /lang <code>      switch language (resets the conversation)
  /langs            list available languages
  /voice [phrase]   speak a phrase into the microphone
  /history          show the conversation
  /export           print the conversation as JSON
  /quit             leave";

pub fn parse(line: &str) -> ReplCommand {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return ReplCommand::Say(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "lang" | "language" if !arg.is_empty() => ReplCommand::Language(arg.to_string()),
        "langs" | "languages" => ReplCommand::Languages,
        "voice" | "mic" => ReplCommand::Voice((!arg.is_empty()).then(|| arg.to_string())),
        "history" => ReplCommand::History,
        "export" => ReplCommand::Export,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        _ => ReplCommand::Unknown(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_said_verbatim() {
        assert_eq!(parse("namaste ji "), ReplCommand::Say("namaste ji ".to_string()));
        assert_eq!(parse(""), ReplCommand::Say(String::new()));
    }

    #[test]
    fn test_language_commands() {
        assert_eq!(parse("/lang en-IN"), ReplCommand::Language("en-IN".to_string()));
        assert_eq!(parse("  /lang   ta-IN  "), ReplCommand::Language("ta-IN".to_string()));
        assert_eq!(parse("/langs"), ReplCommand::Languages);
        assert_eq!(parse("/lang"), ReplCommand::Unknown("lang".to_string()));
    }

    #[test]
    fn test_voice_command() {
        assert_eq!(parse("/voice"), ReplCommand::Voice(None));
        assert_eq!(
            parse("/voice kya haal hai"),
            ReplCommand::Voice(Some("kya haal hai".to_string()))
        );
    }

    #[test]
    fn test_misc_commands() {
        assert_eq!(parse("/history"), ReplCommand::History);
        assert_eq!(parse("/export"), ReplCommand::Export);
        assert_eq!(parse("/help"), ReplCommand::Help);
        assert_eq!(parse("/quit"), ReplCommand::Quit);
        assert_eq!(parse("/exit"), ReplCommand::Quit);
        assert_eq!(parse("/dance"), ReplCommand::Unknown("dance".to_string()));
    }
}
