use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z/!][^<>]*>").expect("valid tag pattern"));

/// Cleans text that may still carry markup.
///
/// This function:
/// - Removes anything shaped like a tag
/// - Trims each line and splits it on runs of two or more spaces
/// - Drops empty segments
/// - Joins the segments with single spaces
///
/// The result contains no tags and no whitespace runs, so cleaning it again is a no-op.
pub fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    tidy_text(&strip_tags(text))
}

/// Segment splitting and whitespace collapse for text that holds no markup
pub fn tidy_text(text: &str) -> String {
    normalize_whitespace(&split_into_segments(text).join(" "))
}

/// Removes tag-shaped substrings until none remain.
///
/// A tag starts with `<` directly followed by a letter, `/` or `!`, so a bare
/// comparison such as `5 < 6` is text. Removal can expose a new tag, hence the loop.
pub fn strip_tags(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = TAG.replace_all(&current, " ").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Splits text into non-empty segments on line breaks and double spaces
pub fn split_into_segments(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Collapses every whitespace run into a single space
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
