//! Formatting of reviewer notifications.
//!
//! Messages are sent with Telegram's legacy `Markdown` parse mode, so any
//! user-supplied text has to be escaped before it is embedded.

use crate::core::moderation::{MemoryItem, Slug};

/// How much of a memory is quoted in the notification.
const PREVIEW_CHARS: usize = 200;

/// Escape the characters legacy Markdown treats as formatting.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Cut `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(max_chars).collect();
    preview.push('…');
    preview
}

/// Build the notification sent when a new memory is waiting for review.
///
/// # Example Output
/// ```text
/// 🕊️ New memory for *jane-doe*
/// From: Ana (Granddaughter)
///
/// She loved gardenias.
///
/// 📷 Includes a photo
/// Review: https://example.com/api/review/jane-doe
/// ```
pub fn format_submission_notice(slug: &Slug, item: &MemoryItem, review_url: &str) -> String {
    let author = item.author_name.as_deref().unwrap_or("Anonymous");
    let from = match &item.relationship {
        Some(relationship) => format!(
            "{} ({})",
            escape_markdown(author),
            escape_markdown(relationship)
        ),
        None => escape_markdown(author),
    };

    let mut message = format!(
        "🕊️ New memory for *{}*\nFrom: {}\n\n{}\n",
        escape_markdown(slug.as_str()),
        from,
        escape_markdown(&truncate_preview(&item.text, PREVIEW_CHARS))
    );

    if item.photo_reference.is_some() {
        message.push_str("\n📷 Includes a photo");
    }
    // Base URLs may contain `_`, which would open an unterminated italic.
    message.push_str(&format!("\nReview: {}", escape_markdown(review_url)));
    message
}
