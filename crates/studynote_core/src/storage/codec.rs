//! Record line codec.
//!
//! Line shape: `name&@*TOPIC&@*importance&@*prereq,prereq`. The fourth field
//! may be empty. Decoding is total: every malformed line maps to a
//! [`CorruptRecord`] and nothing panics.

use crate::model::note::{Note, MAX_IMPORTANCE, MIN_IMPORTANCE};
use crate::model::topic::Topic;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const RECORD_SEPARATOR: &str = "&@*";
pub const PREREQUISITE_DELIMITER: char = ',';
const FIELD_COUNT: usize = 4;

/// Reason a stored line could not be decoded into a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptRecord {
    FieldCount(usize),
    EmptyName,
    UnknownTopic(String),
    NonNumericImportance(String),
    ImportanceOutOfRange(i64),
    EmptyPrerequisite,
}

impl Display for CorruptRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldCount(count) => {
                write!(f, "expected {FIELD_COUNT} fields, found {count}")
            }
            Self::EmptyName => write!(f, "empty note name"),
            Self::UnknownTopic(value) => write!(f, "unknown topic `{value}`"),
            Self::NonNumericImportance(value) => {
                write!(f, "importance `{value}` is not an integer")
            }
            Self::ImportanceOutOfRange(value) => write!(
                f,
                "importance {value} outside {MIN_IMPORTANCE}-{MAX_IMPORTANCE}"
            ),
            Self::EmptyPrerequisite => write!(f, "empty prerequisite entry"),
        }
    }
}

impl Error for CorruptRecord {}

/// Encodes one note as a record line, without the trailing newline.
///
/// Callers validate the note first; the codec does not escape reserved tokens.
pub fn encode_note(note: &Note) -> String {
    let importance = note.importance.to_string();
    let delimiter = PREREQUISITE_DELIMITER.to_string();
    let prerequisites = note.prerequisites.join(delimiter.as_str());
    [
        note.name.as_str(),
        note.topic.as_str(),
        importance.as_str(),
        prerequisites.as_str(),
    ]
    .join(RECORD_SEPARATOR)
}

/// Decodes one record line. A trailing `\r` is ignored.
pub fn decode_note(line: &str) -> Result<Note, CorruptRecord> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split(RECORD_SEPARATOR).collect();
    let [name, topic, importance, prerequisites] = fields.as_slice() else {
        return Err(CorruptRecord::FieldCount(fields.len()));
    };

    if name.trim().is_empty() {
        return Err(CorruptRecord::EmptyName);
    }
    let topic =
        Topic::parse(topic).ok_or_else(|| CorruptRecord::UnknownTopic((*topic).to_string()))?;
    let importance = parse_importance(importance)?;
    let prerequisites = parse_prerequisites(prerequisites)?;

    Ok(Note {
        name: (*name).to_string(),
        topic,
        importance,
        prerequisites,
    })
}

/// Returns the name field of a record line without decoding the rest.
pub fn record_name(line: &str) -> Option<&str> {
    line.split(RECORD_SEPARATOR).next()
}

fn parse_importance(value: &str) -> Result<u8, CorruptRecord> {
    let parsed = value
        .trim()
        .parse::<i64>()
        .map_err(|_| CorruptRecord::NonNumericImportance(value.to_string()))?;
    if !(i64::from(MIN_IMPORTANCE)..=i64::from(MAX_IMPORTANCE)).contains(&parsed) {
        return Err(CorruptRecord::ImportanceOutOfRange(parsed));
    }
    u8::try_from(parsed).map_err(|_| CorruptRecord::ImportanceOutOfRange(parsed))
}

fn parse_prerequisites(value: &str) -> Result<Vec<String>, CorruptRecord> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(PREREQUISITE_DELIMITER)
        .map(|entry| {
            if entry.trim().is_empty() {
                Err(CorruptRecord::EmptyPrerequisite)
            } else {
                Ok(entry.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{decode_note, encode_note, record_name, CorruptRecord};
    use crate::model::note::Note;
    use crate::model::topic::Topic;

    #[test]
    fn encode_uses_fixed_field_order() {
        let note = Note::new("queue", Topic::LinkedList).with_importance(7);
        assert_eq!(encode_note(&note), "queue&@*LINKED_LIST&@*7&@*");

        let with_prereqs = Note::new("dijkstra", Topic::SsShortestPath)
            .with_importance(9)
            .with_prerequisites(["bfs", "heap"]);
        assert_eq!(
            encode_note(&with_prereqs),
            "dijkstra&@*SS_SHORTEST_PATH&@*9&@*bfs,heap"
        );
    }

    #[test]
    fn decode_restores_encoded_note() {
        let note = Note::new("union by rank", Topic::UnionFindDs)
            .with_importance(10)
            .with_prerequisites(["arrays"]);
        assert_eq!(decode_note(&encode_note(&note)), Ok(note));
    }

    #[test]
    fn decode_tolerates_crlf_line_endings() {
        let decoded = decode_note("queue&@*LINKED_LIST&@*5&@*\r").expect("crlf line decodes");
        assert_eq!(decoded.name, "queue");
        assert!(decoded.prerequisites.is_empty());
    }

    #[test]
    fn decode_rejects_missing_field() {
        assert_eq!(
            decode_note("queue&@*LINKED_LIST&@*5"),
            Err(CorruptRecord::FieldCount(3))
        );
        assert_eq!(decode_note(""), Err(CorruptRecord::FieldCount(1)));
    }

    #[test]
    fn decode_rejects_bad_importance() {
        assert_eq!(
            decode_note("queue&@*LINKED_LIST&@*high&@*"),
            Err(CorruptRecord::NonNumericImportance("high".to_string()))
        );
        assert_eq!(
            decode_note("queue&@*LINKED_LIST&@*0&@*"),
            Err(CorruptRecord::ImportanceOutOfRange(0))
        );
        assert_eq!(
            decode_note("queue&@*LINKED_LIST&@*11&@*"),
            Err(CorruptRecord::ImportanceOutOfRange(11))
        );
    }

    #[test]
    fn decode_rejects_unknown_topic_and_empty_name() {
        assert_eq!(
            decode_note("queue&@*TREES&@*5&@*"),
            Err(CorruptRecord::UnknownTopic("TREES".to_string()))
        );
        assert_eq!(
            decode_note("&@*SORTING&@*5&@*"),
            Err(CorruptRecord::EmptyName)
        );
        assert_eq!(
            decode_note("merge&@*SORTING&@*5&@*a,,b"),
            Err(CorruptRecord::EmptyPrerequisite)
        );
    }

    #[test]
    fn record_name_reads_first_field() {
        assert_eq!(record_name("queue&@*LINKED_LIST&@*5&@*"), Some("queue"));
    }
}
