//! Boundary detection: turning normalized text into primitive units.
//!
//! Boundaries are zero-width cut positions, so units are contiguous
//! substrings of the input and concatenating them reproduces it exactly. The
//! built-in grammars are scan-and-classify passes over characters; a custom
//! pattern cuts at every match start, leaving the matched text at the head of
//! the following unit.

use regex::Regex;

use super::config::BoundaryMode;

/// Splits `text` into primitive units using the selected grammar or a custom
/// pattern.
pub(crate) fn split_units<'a>(
    text: &'a str,
    mode: BoundaryMode,
    custom: Option<&Regex>,
) -> Vec<&'a str> {
    if text.is_empty() {
        return Vec::new();
    }
    if let Some(pattern) = custom {
        let cuts: Vec<usize> = pattern
            .find_iter(text)
            .map(|m| m.start())
            .filter(|&start| start > 0)
            .collect();
        return slice_at(text, &cuts);
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut cuts = Vec::new();
    for p in 1..chars.len() {
        let hit = match mode {
            BoundaryMode::Sentence => sentence_boundary(&chars, p),
            BoundaryMode::Paragraph => paragraph_boundary(&chars, p),
            BoundaryMode::Markdown => markdown_boundary(&chars, p),
        };
        if hit {
            cuts.push(chars[p].0);
        }
    }
    slice_at(text, &cuts)
}

fn slice_at<'a>(text: &'a str, cuts: &[usize]) -> Vec<&'a str> {
    let mut units = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts {
        if cut > start {
            units.push(&text[start..cut]);
            start = cut;
        }
    }
    units.push(&text[start..]);
    units
}

/// Boundary between a sentence terminator and whitespace or a capital.
fn sentence_boundary(chars: &[(usize, char)], p: usize) -> bool {
    let prev = chars[p - 1].1;
    let next = chars[p].1;
    matches!(prev, '.' | '!' | '?') && (next.is_whitespace() || next.is_ascii_uppercase())
}

/// Boundary after a terminator-plus-newline run, before a paragraph opener:
/// an uppercase letter, a digit, a list marker, or an opening quote.
fn paragraph_boundary(chars: &[(usize, char)], p: usize) -> bool {
    let next = chars[p].1;
    let opener = next.is_ascii_uppercase()
        || next.is_ascii_digit() && next != '0'
        || matches!(next, '*' | '-' | '\u{201C}');
    opener && behind_newline_run(chars, p, |c| c == '.' || c.is_whitespace())
}

/// Boundary after closing punctuation and a newline run, before a markdown
/// heading/emphasis marker or a capitalized word.
fn markdown_boundary(chars: &[(usize, char)], p: usize) -> bool {
    if p + 1 >= chars.len() {
        return false;
    }
    let a = chars[p].1;
    let b = chars[p + 1].1;
    let marker = matches!(a, '#' | '*') && matches!(b, '#' | '*');
    let capitalized = a.is_ascii_uppercase() && (b.is_ascii_lowercase() || b.is_whitespace());
    if !(marker || capitalized) {
        return false;
    }
    behind_newline_run(chars, p, |c| {
        matches!(c, '.' | ')' | ']' | '}' | '!' | ';' | '>' | '`') || c.is_whitespace()
    })
}

/// Checks that position `p` is preceded by (optionally one space or tab,
/// then) a run of one or more newlines, itself preceded by a character in
/// `prev_class`. A blank line (two or more newlines) satisfies the preceding
/// class on its own.
fn behind_newline_run(
    chars: &[(usize, char)],
    p: usize,
    prev_class: impl Fn(char) -> bool,
) -> bool {
    let mut i = p;
    if i > 0 && matches!(chars[i - 1].1, ' ' | '\t') {
        i -= 1;
    }
    let mut newlines = 0usize;
    while i > 0 && chars[i - 1].1 == '\n' {
        i -= 1;
        newlines += 1;
    }
    if newlines == 0 {
        return false;
    }
    newlines >= 2 || (i > 0 && prev_class(chars[i - 1].1))
}
