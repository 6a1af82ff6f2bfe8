//! Text cleanup applied before extraction.
//!
//! OCR and PDF text layers are noisy: stray symbols, uneven spacing,
//! thousands separators inside numbers. Cleanup keeps line structure intact
//! so table detection still sees one row per line.

use std::sync::LazyLock;

use regex::Regex;

/// `11,000` → `11000`. Applied repeatedly for `1,000,000`.
static THOUSANDS_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d{3})\b").expect("Invalid thousands regex"));

/// Characters with no meaning in a lab report line.
static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s\-/:.%μµ²–|()^]").expect("Invalid character filter regex")
});

/// Runs of horizontal whitespace.
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("Invalid whitespace regex"));

/// Clean report text while keeping one report line per output line.
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(clean_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clean a single line.
pub fn clean_line(line: &str) -> String {
    let mut joined = line.to_string();
    loop {
        let next = THOUSANDS_SEPARATOR.replace_all(&joined, "$1$2").into_owned();
        if next == joined {
            break;
        }
        joined = next;
    }

    let filtered = DISALLOWED_CHARS.replace_all(&joined, " ");
    HORIZONTAL_SPACE
        .replace_all(&filtered, " ")
        .trim()
        .to_string()
}
