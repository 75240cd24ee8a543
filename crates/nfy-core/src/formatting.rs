//! Presentation helpers for preview artifacts (Telegram HTML subset).

use crate::domain::Handle;
use crate::utils::truncate_text;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Short title for the inline preview card.
pub fn preview_title(excluded: &[Handle]) -> String {
    match excluded {
        [single] => format!("🔒 Сообщение (без @{single})"),
        _ => format!("🔒 Сообщение (исключены: {} чел.)", excluded.len()),
    }
}

/// Short description for the inline preview card: the first 50 chars of the body.
pub fn preview_description(body: &str) -> String {
    format!("📝 {}", truncate_text(body, 50))
}

/// `@a, @b, @c`
pub fn excluded_display(excluded: &[Handle]) -> String {
    excluded
        .iter()
        .map(|h| format!("@{h}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The placeholder sent into the chat; the real body stays behind the button.
///
/// Handles are `[a-z0-9_]` only, so they need no escaping here.
pub fn placeholder_html(excluded: &[Handle]) -> String {
    format!(
        "🔒 <b>Секретное сообщение</b>\n\n<i>Не для: {}</i>",
        excluded_display(excluded)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> Handle {
        Handle::new(s)
    }

    #[test]
    fn escapes_telegram_html() {
        assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn single_exclusion_names_the_handle() {
        assert_eq!(preview_title(&[h("vasya")]), "🔒 Сообщение (без @vasya)");
    }

    #[test]
    fn multiple_exclusions_show_a_count() {
        assert_eq!(
            preview_title(&[h("vasya"), h("petya")]),
            "🔒 Сообщение (исключены: 2 чел.)"
        );
    }

    #[test]
    fn description_truncates_long_bodies() {
        let body = "x".repeat(60);
        let d = preview_description(&body);
        assert!(d.starts_with("📝 "));
        assert!(d.ends_with("..."));
        // 50 chars of body + ellipsis.
        assert_eq!(d.chars().count(), 2 + 50 + 3);
    }

    #[test]
    fn placeholder_lists_everyone_excluded() {
        assert_eq!(
            placeholder_html(&[h("vasya"), h("petya")]),
            "🔒 <b>Секретное сообщение</b>\n\n<i>Не для: @vasya, @petya</i>"
        );
    }
}
