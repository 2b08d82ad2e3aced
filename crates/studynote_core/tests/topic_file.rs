use studynote_core::storage::codec::encode_note;
use studynote_core::{Note, StorageError, Topic, TopicFile};
use std::fs;
use tempfile::TempDir;

fn linked_list_file(dir: &TempDir) -> TopicFile {
    let path = dir.path().join(Topic::LinkedList.file_name());
    fs::write(&path, "").unwrap();
    let mut file = TopicFile::new(Topic::LinkedList, path);
    file.read_file().unwrap();
    file
}

#[test]
fn read_file_keeps_valid_lines_and_counts_corrupted_ones() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    fs::write(
        &path,
        "queue&@*LINKED_LIST&@*5&@*\n\
         stack&@*LINKED_LIST&@*7&@*queue\n\
         deque&@*LINKED_LIST&@*eleven&@*\n\
         skip list&@*LINKED_LIST&@*2&@*\n",
    )
    .unwrap();

    let mut file = TopicFile::new(Topic::LinkedList, &path);
    let corrupted = file.read_file().unwrap();

    assert_eq!(corrupted, 1);
    let notes = file.convert_file_to_topic();
    assert_eq!(notes.len(), 3);
    let names: Vec<&str> = notes.iter().map(|note| note.name.as_str()).collect();
    assert_eq!(names, ["queue", "stack", "skip list"]);
    assert_eq!(notes.notes[1].prerequisites, vec!["queue".to_string()]);
}

#[test]
fn read_file_does_not_rewrite_corrupted_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    let original = "broken line\nqueue&@*LINKED_LIST&@*5&@*\n";
    fs::write(&path, original).unwrap();

    let mut file = TopicFile::new(Topic::LinkedList, &path);
    assert_eq!(file.read_file().unwrap(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn read_file_skips_blank_lines_without_counting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    fs::write(&path, "\nqueue&@*LINKED_LIST&@*5&@*\n\n").unwrap();

    let mut file = TopicFile::new(Topic::LinkedList, &path);
    assert_eq!(file.read_file().unwrap(), 0);
    assert_eq!(file.records().len(), 1);
}

#[test]
fn read_file_reports_missing_backing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    let mut file = TopicFile::new(Topic::LinkedList, &path);

    let err = file.read_file().unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound(missing) if missing == path));
}

#[test]
fn write_note_appends_to_memory_and_disk() {
    let dir = TempDir::new().unwrap();
    let mut file = linked_list_file(&dir);

    let first = encode_note(&Note::new("queue", Topic::LinkedList));
    let second = encode_note(&Note::new("stack", Topic::LinkedList).with_importance(8));
    file.write_note_to_file(first.clone()).unwrap();
    file.write_note_to_file(second.clone()).unwrap();

    assert_eq!(file.records(), [first.clone(), second.clone()]);
    let on_disk = fs::read_to_string(file.path()).unwrap();
    assert_eq!(on_disk, format!("{first}\n{second}\n"));

    let mut reread = TopicFile::new(Topic::LinkedList, file.path());
    assert_eq!(reread.read_file().unwrap(), 0);
    assert_eq!(reread.records(), file.records());
}

#[test]
fn delete_entry_rewrites_file_without_the_named_note() {
    let dir = TempDir::new().unwrap();
    let mut file = linked_list_file(&dir);
    for name in ["queue", "stack", "deque"] {
        file.write_note_to_file(encode_note(&Note::new(name, Topic::LinkedList)))
            .unwrap();
    }

    assert!(file.delete_entry("stack").unwrap());
    assert!(!file.contains("stack"));
    let on_disk = fs::read_to_string(file.path()).unwrap();
    assert!(!on_disk.contains("stack"));
    assert_eq!(on_disk.lines().count(), 2);
}

#[test]
fn delete_entry_without_match_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    // The corrupted line would vanish on any rewrite.
    let original = "garbage\nqueue&@*LINKED_LIST&@*5&@*\n";
    fs::write(&path, original).unwrap();
    let mut file = TopicFile::new(Topic::LinkedList, &path);
    file.read_file().unwrap();

    assert!(!file.delete_entry("missing").unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn clear_file_truncates_disk_and_memory() {
    let dir = TempDir::new().unwrap();
    let mut file = linked_list_file(&dir);
    file.write_note_to_file(encode_note(&Note::new("queue", Topic::LinkedList)))
        .unwrap();

    file.clear_file().unwrap();

    assert!(file.records().is_empty());
    assert!(file.convert_file_to_topic().is_empty());
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "");
}

#[test]
fn read_file_counts_invalid_utf8_lines_as_corrupted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    let mut bytes = b"queue&@*LINKED_LIST&@*5&@*\n".to_vec();
    bytes.extend_from_slice(b"\xff\xfe garbage\n");
    bytes.extend_from_slice(b"stack&@*LINKED_LIST&@*7&@*\n");
    fs::write(&path, &bytes).unwrap();

    let mut file = TopicFile::new(Topic::LinkedList, &path);

    assert_eq!(file.read_file().unwrap(), 1);
    let names: Vec<String> = file
        .convert_file_to_topic()
        .iter()
        .map(|note| note.name.clone())
        .collect();
    assert_eq!(names, ["queue", "stack"]);
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

#[test]
fn append_after_missing_final_newline_starts_a_new_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    fs::write(&path, "queue&@*LINKED_LIST&@*5&@*").unwrap();
    let mut file = TopicFile::new(Topic::LinkedList, &path);
    file.read_file().unwrap();

    file.write_note_to_file(encode_note(&Note::new("stack", Topic::LinkedList)))
        .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "queue&@*LINKED_LIST&@*5&@*\nstack&@*LINKED_LIST&@*5&@*\n"
    );
    let mut reread = TopicFile::new(Topic::LinkedList, &path);
    assert_eq!(reread.read_file().unwrap(), 0);
    assert_eq!(reread.records(), file.records());
}

#[test]
fn write_note_rejects_foreign_and_malformed_lines() {
    let dir = TempDir::new().unwrap();
    let mut file = linked_list_file(&dir);

    let foreign = encode_note(&Note::new("merge", Topic::Sorting));
    let err = file.write_note_to_file(foreign).unwrap_err();
    assert!(matches!(
        err,
        StorageError::RejectedRecord {
            topic: Topic::LinkedList,
            ..
        }
    ));
    assert!(file.write_note_to_file("not a record".to_string()).is_err());
    assert!(file
        .write_note_to_file("a&@*LINKED_LIST&@*5&@*\nb&@*LINKED_LIST&@*5&@*".to_string())
        .is_err());

    assert!(file.records().is_empty());
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "");
}

#[test]
fn unread_file_refuses_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LINKED_LIST.txt");
    let original = "queue&@*LINKED_LIST&@*5&@*\n";
    fs::write(&path, original).unwrap();
    let mut file = TopicFile::new(Topic::LinkedList, &path);

    let err = file
        .write_note_to_file(encode_note(&Note::new("deque", Topic::LinkedList)))
        .unwrap_err();

    assert!(matches!(err, StorageError::TopicNotLoaded(Topic::LinkedList)));
    assert!(!file.is_loaded());
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}
