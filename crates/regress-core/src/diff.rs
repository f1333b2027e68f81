//! Zero-context unified diffs between expected and actual field values.

use difference::{Changeset, Difference};
use serde_json::Value;

const LINE_SPLIT: &str = "\n";

/// One line per string for a string array, pretty-printed JSON otherwise.
/// Embedded line breaks are escaped so every element stays a single line.
pub fn value_lines(value: &Value) -> Vec<String> {
    if let Value::Array(items) = value {
        let strings = items
            .iter()
            .map(|item| item.as_str().map(escape_line_breaks))
            .collect::<Option<Vec<_>>>();
        if let Some(lines) = strings {
            return lines;
        }
    }
    format!("{value:#}").lines().map(str::to_string).collect()
}

fn escape_line_breaks(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}

#[derive(Debug, Default)]
struct Hunk {
    old_start: usize,
    new_start: usize,
    removed: Vec<String>,
    added: Vec<String>,
}

/// Renders a unified diff with no context lines. Returns an empty string
/// when both sides are equal.
pub fn unified_diff(expected: &[String], actual: &[String], from: &str, to: &str) -> String {
    let hunks = collect_hunks(&line_differences(expected, actual));
    if hunks.is_empty() {
        return String::new();
    }

    let mut lines = vec![format!("--- {from}"), format!("+++ {to}")];
    for hunk in hunks {
        lines.push(format!(
            "@@ -{} +{} @@",
            format_range(hunk.old_start, hunk.removed.len()),
            format_range(hunk.new_start, hunk.added.len())
        ));
        lines.extend(hunk.removed.iter().map(|line| format!("-{line}")));
        lines.extend(hunk.added.iter().map(|line| format!("+{line}")));
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

fn line_differences(expected: &[String], actual: &[String]) -> Vec<Difference> {
    match (expected.is_empty(), actual.is_empty()) {
        (true, true) => Vec::new(),
        (true, false) => vec![Difference::Add(actual.join(LINE_SPLIT))],
        (false, true) => vec![Difference::Rem(expected.join(LINE_SPLIT))],
        (false, false) => {
            Changeset::new(
                &expected.join(LINE_SPLIT),
                &actual.join(LINE_SPLIT),
                LINE_SPLIT,
            )
            .diffs
        }
    }
}

fn collect_hunks(differences: &[Difference]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    let mut old_position = 0;
    let mut new_position = 0;

    for difference in differences {
        match difference {
            Difference::Same(text) => {
                if let Some(hunk) = current.take() {
                    hunks.push(hunk);
                }
                let count = split_lines(text).len();
                old_position += count;
                new_position += count;
            }
            Difference::Rem(text) => {
                let removed = split_lines(text);
                old_position += removed.len();
                current
                    .get_or_insert_with(|| Hunk {
                        old_start: old_position - removed.len(),
                        new_start: new_position,
                        ..Hunk::default()
                    })
                    .removed
                    .extend(removed);
            }
            Difference::Add(text) => {
                let added = split_lines(text);
                new_position += added.len();
                current
                    .get_or_insert_with(|| Hunk {
                        old_start: old_position,
                        new_start: new_position - added.len(),
                        ..Hunk::default()
                    })
                    .added
                    .extend(added);
            }
        }
    }

    if let Some(hunk) = current {
        hunks.push(hunk);
    }
    hunks
}

fn split_lines(text: &str) -> Vec<String> {
    text.split(LINE_SPLIT).map(str::to_string).collect()
}

// 1-based start; the length is omitted when it is 1, and an empty range
// points at the line before it.
fn format_range(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}

#[cfg(test)]
mod tests {
    use super::{unified_diff, value_lines};
    use serde_json::json;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn changed_line_renders_single_hunk() {
        let diff = unified_diff(
            &lines(&["(Doe, 2020)"]),
            &lines(&["(Doe 2020)"]),
            "tests/basic.out.json",
            "actual output from apa",
        );

        assert_eq!(
            diff,
            "--- tests/basic.out.json\n\
             +++ actual output from apa\n\
             @@ -1 +1 @@\n\
             -(Doe, 2020)\n\
             +(Doe 2020)\n"
        );
    }

    #[test]
    fn insertion_uses_empty_range_before_the_line() {
        let diff = unified_diff(&lines(&["a", "b"]), &lines(&["a", "x", "b"]), "e", "a");
        assert_eq!(diff, "--- e\n+++ a\n@@ -1,0 +2 @@\n+x\n");
    }

    #[test]
    fn separate_changes_get_separate_hunks() {
        let diff = unified_diff(
            &lines(&["a", "b", "c", "d", "e"]),
            &lines(&["A", "b", "c", "d", "E"]),
            "e",
            "a",
        );
        assert_eq!(
            diff,
            "--- e\n+++ a\n@@ -1 +1 @@\n-a\n+A\n@@ -5 +5 @@\n-e\n+E\n"
        );
    }

    #[test]
    fn missing_actual_lines_are_removals() {
        let diff = unified_diff(&lines(&["a", "b"]), &[], "e", "a");
        assert_eq!(diff, "--- e\n+++ a\n@@ -1,2 +0,0 @@\n-a\n-b\n");
    }

    #[test]
    fn equal_sides_render_nothing() {
        assert!(unified_diff(&lines(&["a"]), &lines(&["a"]), "e", "a").is_empty());
        assert!(unified_diff(&[], &[], "e", "a").is_empty());
    }

    #[test]
    fn non_string_values_are_pretty_printed() {
        assert_eq!(value_lines(&json!(["x", "y"])), ["x", "y"]);
        assert_eq!(value_lines(&json!(null)), ["null"]);
        assert_eq!(value_lines(&json!([1])), ["[", "  1", "]"]);
    }

    #[test]
    fn multi_line_element_stays_one_diff_line() {
        let expected = value_lines(&json!(["a\nb"]));
        let actual = value_lines(&json!(["a", "b"]));
        assert_eq!(expected, ["a\\nb"]);

        let diff = unified_diff(&expected, &actual, "e", "a");
        assert_eq!(diff, "--- e\n+++ a\n@@ -1 +1,2 @@\n-a\\nb\n+a\n+b\n");
    }
}
