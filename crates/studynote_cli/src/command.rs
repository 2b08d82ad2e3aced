//! Command-line parsing.
//!
//! Commands are a keyword followed by `x/VALUE` flags, e.g.
//! `add n/queue t/LINKED_LIST i/5 p/arrays,pointers`. A flag value runs until
//! the next flag, so names may contain spaces.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use studynote_core::{Topic, MAX_IMPORTANCE, MIN_IMPORTANCE};

static FLAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)([a-z])/").expect("valid flag regex"));

/// One parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        name: String,
        topic: Topic,
        importance: Option<u8>,
        prerequisites: Vec<String>,
    },
    Remove {
        name: String,
    },
    List,
    Filter {
        keyword: FilterKeyword,
        topic: Option<Topic>,
    },
    Topo {
        name: Option<String>,
    },
    Clear {
        topic: Topic,
    },
    Export,
    Help {
        command: Option<String>,
    },
    TestMode,
    ExitTestMode,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKeyword {
    Topic,
    Importance,
}

/// Reason a line could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingField {
        command: &'static str,
        flag: char,
    },
    UnexpectedArguments(&'static str),
    UnknownTopic(String),
    InvalidImportance(String),
    UnknownKeyword(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no command given"),
            Self::UnknownCommand(word) => write!(f, "unknown command `{word}`"),
            Self::MissingField { command, flag } => {
                write!(f, "`{command}` needs a non-empty {flag}/ field")
            }
            Self::UnexpectedArguments(command) => {
                write!(f, "`{command}` does not take any arguments")
            }
            Self::UnknownTopic(topic) => write!(f, "{topic} is not a known topic"),
            Self::InvalidImportance(value) => write!(
                f,
                "{value} is not in the valid {MIN_IMPORTANCE}-{MAX_IMPORTANCE} range for importance"
            ),
            Self::UnknownKeyword(keyword) => {
                write!(f, "filter keyword must be `topic` or `importance`, got `{keyword}`")
            }
        }
    }
}

impl Error for ParseError {}

/// Parses one input line.
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let input = input.trim();
    let (word, rest) = input
        .split_once(char::is_whitespace)
        .map_or((input, ""), |(word, rest)| (word, rest.trim()));
    let flags = Flags::parse(rest);

    match word {
        "" => Err(ParseError::Empty),
        "add" => {
            let name = flags.required("add", 'n')?;
            let topic = parse_topic(flags.required("add", 't')?)?;
            let importance = flags.get('i').map(parse_importance).transpose()?;
            let prerequisites = flags
                .get('p')
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|entry| !entry.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Ok(Command::Add {
                name: name.to_string(),
                topic,
                importance,
                prerequisites,
            })
        }
        "remove" => Ok(Command::Remove {
            name: flags.required("remove", 'n')?.to_string(),
        }),
        "list" => no_arguments("list", rest, Command::List),
        "filter" => {
            let keyword = match flags.required("filter", 'k')? {
                "topic" => FilterKeyword::Topic,
                "importance" => FilterKeyword::Importance,
                other => return Err(ParseError::UnknownKeyword(other.to_string())),
            };
            let topic = flags.get('t').map(parse_topic).transpose()?;
            if keyword == FilterKeyword::Topic && topic.is_none() {
                return Err(ParseError::MissingField {
                    command: "filter",
                    flag: 't',
                });
            }
            Ok(Command::Filter { keyword, topic })
        }
        "topo" => Ok(Command::Topo {
            name: flags.get('n').map(str::to_string),
        }),
        "clear" => Ok(Command::Clear {
            topic: parse_topic(flags.required("clear", 't')?)?,
        }),
        "export" => no_arguments("export", rest, Command::Export),
        "help" => Ok(Command::Help {
            command: flags.get('c').map(str::to_string),
        }),
        "test-mode" => no_arguments("test-mode", rest, Command::TestMode),
        "exit-test-mode" => no_arguments("exit-test-mode", rest, Command::ExitTestMode),
        "exit" => no_arguments("exit", rest, Command::Exit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn no_arguments(
    command: &'static str,
    rest: &str,
    parsed: Command,
) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(ParseError::UnexpectedArguments(command))
    }
}

fn parse_topic(value: &str) -> Result<Topic, ParseError> {
    Topic::parse(value).ok_or_else(|| ParseError::UnknownTopic(value.to_string()))
}

fn parse_importance(value: &str) -> Result<u8, ParseError> {
    value
        .parse::<u8>()
        .ok()
        .filter(|importance| (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(importance))
        .ok_or_else(|| ParseError::InvalidImportance(value.to_string()))
}

/// `x/VALUE` pairs of one command line, first occurrence wins.
struct Flags<'a> {
    values: Vec<(char, &'a str)>,
}

impl<'a> Flags<'a> {
    fn parse(rest: &'a str) -> Self {
        let mut markers = Vec::new();
        for caps in FLAG_RE.captures_iter(rest) {
            let (Some(whole), Some(flag)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if let Some(flag) = flag.as_str().chars().next() {
                markers.push((flag, whole.start(), whole.end()));
            }
        }

        let mut values = Vec::with_capacity(markers.len());
        for (idx, (flag, _, value_start)) in markers.iter().enumerate() {
            let value_end = markers
                .get(idx + 1)
                .map_or(rest.len(), |(_, next_start, _)| *next_start);
            values.push((*flag, rest[*value_start..value_end].trim()));
        }
        Self { values }
    }

    fn get(&self, flag: char) -> Option<&'a str> {
        self.values
            .iter()
            .find(|(candidate, value)| *candidate == flag && !value.is_empty())
            .map(|(_, value)| *value)
    }

    fn required(&self, command: &'static str, flag: char) -> Result<&'a str, ParseError> {
        self.get(flag)
            .ok_or(ParseError::MissingField { command, flag })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command, FilterKeyword, ParseError};
    use studynote_core::Topic;

    #[test]
    fn add_parses_all_flags_in_any_order() {
        let command = parse_command("add t/SS_SHORTEST_PATH n/dijkstra notes i/9 p/heap, bfs")
            .expect("valid add");
        assert_eq!(
            command,
            Command::Add {
                name: "dijkstra notes".to_string(),
                topic: Topic::SsShortestPath,
                importance: Some(9),
                prerequisites: vec!["heap".to_string(), "bfs".to_string()],
            }
        );
    }

    #[test]
    fn add_requires_name_and_known_topic() {
        assert_eq!(
            parse_command("add t/SORTING"),
            Err(ParseError::MissingField {
                command: "add",
                flag: 'n'
            })
        );
        assert_eq!(
            parse_command("add n/queue t/linked_list"),
            Err(ParseError::UnknownTopic("linked_list".to_string()))
        );
    }

    #[test]
    fn add_rejects_importance_outside_range() {
        assert_eq!(
            parse_command("add n/queue t/LINKED_LIST i/11"),
            Err(ParseError::InvalidImportance("11".to_string()))
        );
        assert_eq!(
            parse_command("add n/queue t/LINKED_LIST i/high"),
            Err(ParseError::InvalidImportance("high".to_string()))
        );
    }

    #[test]
    fn slash_inside_a_value_is_not_a_flag() {
        let command = parse_command("remove n/insert/delete").expect("valid remove");
        assert_eq!(
            command,
            Command::Remove {
                name: "insert/delete".to_string()
            }
        );
    }

    #[test]
    fn filter_by_topic_needs_topic() {
        assert_eq!(
            parse_command("filter k/topic"),
            Err(ParseError::MissingField {
                command: "filter",
                flag: 't'
            })
        );
        assert_eq!(
            parse_command("filter k/importance"),
            Ok(Command::Filter {
                keyword: FilterKeyword::Importance,
                topic: None
            })
        );
    }

    #[test]
    fn single_word_commands_reject_arguments() {
        assert_eq!(parse_command("  list  "), Ok(Command::List));
        assert_eq!(
            parse_command("list everything"),
            Err(ParseError::UnexpectedArguments("list"))
        );
        assert_eq!(parse_command("exit-test-mode"), Ok(Command::ExitTestMode));
        assert_eq!(parse_command("export"), Ok(Command::Export));
    }

    #[test]
    fn unknown_and_empty_input_are_errors() {
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_command("delete n/queue"),
            Err(ParseError::UnknownCommand("delete".to_string()))
        );
    }
}
