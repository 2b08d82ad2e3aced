//! Fixed topic set and the per-topic note aggregate.

use crate::model::note::Note;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One of the fixed study topics notes are filed under.
///
/// The `SCREAMING_SNAKE_CASE` spelling is shared by the record format, the
/// backing file names and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    Sorting,
    LinkedList,
    GraphStructures,
    BinaryHeap,
    HashTable,
    GraphTraversal,
    BinarySearchTree,
    SsShortestPath,
    UnionFindDs,
    MinimumSpanningTree,
}

impl Topic {
    /// Every topic, in display order.
    pub const ALL: [Topic; 10] = [
        Topic::Sorting,
        Topic::LinkedList,
        Topic::GraphStructures,
        Topic::BinaryHeap,
        Topic::HashTable,
        Topic::GraphTraversal,
        Topic::BinarySearchTree,
        Topic::SsShortestPath,
        Topic::UnionFindDs,
        Topic::MinimumSpanningTree,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Sorting => "SORTING",
            Topic::LinkedList => "LINKED_LIST",
            Topic::GraphStructures => "GRAPH_STRUCTURES",
            Topic::BinaryHeap => "BINARY_HEAP",
            Topic::HashTable => "HASH_TABLE",
            Topic::GraphTraversal => "GRAPH_TRAVERSAL",
            Topic::BinarySearchTree => "BINARY_SEARCH_TREE",
            Topic::SsShortestPath => "SS_SHORTEST_PATH",
            Topic::UnionFindDs => "UNION_FIND_DS",
            Topic::MinimumSpanningTree => "MINIMUM_SPANNING_TREE",
        }
    }

    /// Parses the canonical spelling. Matching is case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        Topic::ALL.into_iter().find(|topic| topic.as_str() == value)
    }

    /// Name of the backing file for this topic inside a storage root.
    pub fn file_name(self) -> String {
        format!("{}.txt", self.as_str())
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded contents of one topic, in backing-file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNotes {
    pub topic: Topic,
    pub notes: Vec<Note>,
}

impl TopicNotes {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            notes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Returns whether a note called `name` is filed here.
    pub fn contains(&self, name: &str) -> bool {
        self.notes.iter().any(|note| note.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Topic;

    #[test]
    fn parse_accepts_canonical_names_only() {
        assert_eq!(Topic::parse("LINKED_LIST"), Some(Topic::LinkedList));
        assert_eq!(Topic::parse("linked_list"), None);
        assert_eq!(Topic::parse("TREES"), None);
    }

    #[test]
    fn every_topic_parses_back_from_its_name() {
        for topic in Topic::ALL {
            assert_eq!(Topic::parse(topic.as_str()), Some(topic));
        }
    }

    #[test]
    fn file_name_uses_txt_extension() {
        assert_eq!(Topic::UnionFindDs.file_name(), "UNION_FIND_DS.txt");
    }
}
