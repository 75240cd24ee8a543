//! Exclusion parser: splits one free-form compose string into the message
//! body and the list of excluded handles.

use regex::Regex;

use crate::domain::Handle;

/// Telegram handle: 5-32 chars, letters/digits/underscores, starts with a letter.
const HANDLE_PATTERN: &str = "@([A-Za-z][A-Za-z0-9_]{4,31})";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing left of the message after stripping trailing handles.
    #[error("empty message body")]
    EmptyBody,

    /// No valid handle token anywhere in the input.
    #[error("no excluded handles given")]
    NoExclusions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCompose {
    pub body: String,
    /// Lowercase, de-duplicated, in first-occurrence order.
    pub excluded: Vec<Handle>,
}

/// Parse a compose request: `"Текст сообщения @user1 @user2"`.
///
/// Handles are collected from anywhere in the input, but only *trailing*
/// occurrences are stripped from the body (scanning from the end backward).
/// A handle embedded mid-sentence stays part of the message text. The
/// asymmetry is deliberate; stripping every occurrence would mangle messages
/// that mention someone without excluding them last.
pub fn parse(raw: &str) -> Result<ParsedCompose, ParseError> {
    let re = Regex::new(HANDLE_PATTERN).expect("valid regex");

    // Raw match list: original casing, duplicates kept. The strip pass below
    // walks this list in reverse, one trailing occurrence per entry.
    let found: Vec<&str> = re
        .captures_iter(raw)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let mut body = raw.trim();
    for handle in found.iter().rev() {
        if let Some(head) = strip_trailing_token(body, handle) {
            body = head;
        }
    }
    let body = body.trim();

    if body.is_empty() {
        return Err(ParseError::EmptyBody);
    }
    if found.is_empty() {
        return Err(ParseError::NoExclusions);
    }

    let mut excluded: Vec<Handle> = Vec::new();
    for handle in &found {
        let h = Handle::new(handle);
        if !excluded.contains(&h) {
            excluded.push(h);
        }
    }

    Ok(ParsedCompose {
        body: body.to_string(),
        excluded,
    })
}

/// If `text` ends with `@handle` (case-insensitive, ignoring trailing
/// whitespace), return the text before the `@`.
fn strip_trailing_token<'a>(text: &'a str, handle: &str) -> Option<&'a str> {
    let trimmed = text.trim_end();
    let bytes = trimmed.as_bytes();
    let n = handle.len() + 1;
    if bytes.len() < n {
        return None;
    }

    let at = bytes.len() - n;
    if bytes[at] != b'@' {
        return None;
    }
    // `@` is ASCII, so `at` and `at + 1` are char boundaries.
    if !trimmed[at + 1..].eq_ignore_ascii_case(handle) {
        return None;
    }
    Some(&trimmed[..at])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles(parsed: &ParsedCompose) -> Vec<&str> {
        parsed.excluded.iter().map(|h| h.as_str()).collect()
    }

    #[test]
    fn strips_trailing_handles_into_excluded_set() {
        let p = parse("Го в кино вечером? @vasya @petya").unwrap();
        assert_eq!(p.body, "Го в кино вечером?");
        assert_eq!(handles(&p), vec!["vasya", "petya"]);
    }

    #[test]
    fn matching_is_case_insensitive_and_lowercased() {
        let p = parse("пойдём гулять @VaSya @PETYA").unwrap();
        assert_eq!(p.body, "пойдём гулять");
        assert_eq!(handles(&p), vec!["vasya", "petya"]);
    }

    #[test]
    fn duplicates_collapse_in_first_occurrence_order() {
        let p = parse("сюрприз @vasya @petya @Vasya").unwrap();
        assert_eq!(p.body, "сюрприз");
        assert_eq!(handles(&p), vec!["vasya", "petya"]);
    }

    #[test]
    fn mid_sentence_handle_stays_in_body() {
        let p = parse("спроси у @vasya про это @petya").unwrap();
        assert_eq!(p.body, "спроси у @vasya про это");
        assert_eq!(handles(&p), vec!["vasya", "petya"]);
    }

    #[test]
    fn empty_input_is_empty_body() {
        assert_eq!(parse(""), Err(ParseError::EmptyBody));
        assert_eq!(parse("   "), Err(ParseError::EmptyBody));
    }

    #[test]
    fn only_handles_is_empty_body() {
        assert_eq!(parse("@alice @bobby"), Err(ParseError::EmptyBody));
    }

    #[test]
    fn short_handle_is_not_recognized() {
        // 4 chars: below the 5-char minimum, so not a handle token at all.
        assert_eq!(parse("   @abcd"), Err(ParseError::NoExclusions));
        assert_eq!(parse("привет всем"), Err(ParseError::NoExclusions));
    }

    #[test]
    fn handle_must_start_with_a_letter() {
        assert_eq!(parse("тест @1vasya"), Err(ParseError::NoExclusions));
    }

    #[test]
    fn five_char_handle_is_the_minimum() {
        let p = parse("тест @abcde").unwrap();
        assert_eq!(p.body, "тест");
        assert_eq!(handles(&p), vec!["abcde"]);
    }

    #[test]
    fn trailing_whitespace_around_handles_is_consumed() {
        let p = parse("  привет   @vasya   @petya  ").unwrap();
        assert_eq!(p.body, "привет");
        assert_eq!(handles(&p), vec!["vasya", "petya"]);
    }

    #[test]
    fn repeated_trailing_occurrences_all_strip() {
        // Raw match list is [vasya, petya, vasya]; the reverse strip pass
        // removes all three trailing tokens.
        let p = parse("кто со мной? @vasya @petya @vasya").unwrap();
        assert_eq!(p.body, "кто со мной?");
        assert_eq!(handles(&p), vec!["vasya", "petya"]);
    }
}
