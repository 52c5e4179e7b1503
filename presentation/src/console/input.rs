//! Parsing of console lines

use orca_domain::{OrchestrationEvent, ParticipantId, Role};

/// What one line typed at the console asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Message(String),
    Inject { role: Role, text: String },
    Function { name: String, output: String },
    Rebuild,
    Help,
    Quit,
    /// Blank line.
    Empty,
    /// Malformed command; the string explains why.
    Invalid(String),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleInput::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ConsoleInput::Message(line.to_string());
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(n, r)| (n, r.trim()));
        match name {
            "quit" | "exit" | "q" => ConsoleInput::Quit,
            "help" | "h" | "?" => ConsoleInput::Help,
            "rebuild" => ConsoleInput::Rebuild,
            "inject" => {
                let Some((role, text)) = rest.split_once(char::is_whitespace) else {
                    return ConsoleInput::Invalid("usage: /inject <role> <text>".to_string());
                };
                match role.parse::<Role>() {
                    Ok(role) => ConsoleInput::Inject {
                        role,
                        text: text.trim().to_string(),
                    },
                    Err(e) => ConsoleInput::Invalid(e.to_string()),
                }
            }
            "function" => match rest.split_once(char::is_whitespace) {
                Some((name, output)) => ConsoleInput::Function {
                    name: name.to_string(),
                    output: output.trim().to_string(),
                },
                None => ConsoleInput::Invalid("usage: /function <name> <output>".to_string()),
            },
            other => ConsoleInput::Invalid(format!("Unknown command: /{}", other)),
        }
    }

    /// The event this input publishes on behalf of `sender`, if any.
    pub fn into_event(self, sender: &ParticipantId) -> Option<OrchestrationEvent> {
        match self {
            ConsoleInput::Message(text) => Some(OrchestrationEvent::ClientMessage {
                participant_id: sender.clone(),
                text,
            }),
            ConsoleInput::Inject { role, text } => Some(OrchestrationEvent::MessageInjected {
                sender: sender.clone(),
                role,
                text,
            }),
            ConsoleInput::Function { name, output } => {
                Some(OrchestrationEvent::FunctionReturned { name, output })
            }
            ConsoleInput::Rebuild => Some(OrchestrationEvent::RebuildPrompt),
            ConsoleInput::Help | ConsoleInput::Quit | ConsoleInput::Empty | ConsoleInput::Invalid(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            ConsoleInput::parse("  hello there \n"),
            ConsoleInput::Message("hello there".to_string())
        );
        assert_eq!(ConsoleInput::parse("   "), ConsoleInput::Empty);
    }

    #[test]
    fn test_commands() {
        assert_eq!(ConsoleInput::parse("/q"), ConsoleInput::Quit);
        assert_eq!(ConsoleInput::parse("/help"), ConsoleInput::Help);
        assert_eq!(ConsoleInput::parse("/rebuild"), ConsoleInput::Rebuild);
        assert_eq!(
            ConsoleInput::parse("/inject system  Be brief."),
            ConsoleInput::Inject {
                role: Role::System,
                text: "Be brief.".to_string()
            }
        );
        assert_eq!(
            ConsoleInput::parse("/function weather 12C, light rain"),
            ConsoleInput::Function {
                name: "weather".to_string(),
                output: "12C, light rain".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_commands() {
        assert!(matches!(ConsoleInput::parse("/inject"), ConsoleInput::Invalid(_)));
        assert!(matches!(ConsoleInput::parse("/inject wizard hi"), ConsoleInput::Invalid(_)));
        assert!(matches!(ConsoleInput::parse("/function"), ConsoleInput::Invalid(_)));
        assert_eq!(
            ConsoleInput::parse("/dance"),
            ConsoleInput::Invalid("Unknown command: /dance".to_string())
        );
    }

    #[test]
    fn test_into_event() {
        let me = ParticipantId::new("console");
        assert_eq!(
            ConsoleInput::parse("hi").into_event(&me),
            Some(OrchestrationEvent::ClientMessage {
                participant_id: me.clone(),
                text: "hi".to_string()
            })
        );
        assert_eq!(
            ConsoleInput::Rebuild.into_event(&me),
            Some(OrchestrationEvent::RebuildPrompt)
        );
        assert_eq!(ConsoleInput::Quit.into_event(&me), None);
    }
}
