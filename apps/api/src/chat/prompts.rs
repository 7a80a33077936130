//! Prompt text for the document chat panel.

/// System prompt sent with every chat request.
pub const CHAT_SYSTEM: &str = "You are a writing assistant embedded in a document editor. \
    The user's current document is provided for context. \
    Answer the user's message directly and concisely. \
    When suggesting edits, quote the passage you are changing.";

/// Upper bound on document characters included as context.
pub const MAX_CONTEXT_CHARS: usize = 12_000;

/// Builds the user prompt: the document (truncated to `MAX_CONTEXT_CHARS` characters)
/// followed by the user's message.
pub fn build_chat_prompt(document: &str, message: &str) -> String {
    let document = document.trim();
    if document.is_empty() {
        return message.to_string();
    }

    let (context, truncated) = match document.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((cut, _)) => (&document[..cut], true),
        None => (document, false),
    };
    let marker = if truncated {
        "\n[document truncated]"
    } else {
        ""
    };

    format!("<document>\n{context}{marker}\n</document>\n\n{message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_sends_message_only() {
        assert_eq!(build_chat_prompt("   ", "Summarize"), "Summarize");
    }

    #[test]
    fn test_document_wraps_message() {
        let prompt = build_chat_prompt("Page one text", "Fix my grammar");
        assert!(prompt.starts_with("<document>\nPage one text\n</document>"));
        assert!(prompt.ends_with("Fix my grammar"));
        assert!(!prompt.contains("truncated"));
    }

    #[test]
    fn test_long_document_is_truncated_on_char_boundary() {
        let document = "é".repeat(MAX_CONTEXT_CHARS + 10);
        let prompt = build_chat_prompt(&document, "hi");
        assert!(prompt.contains("[document truncated]"));
        assert_eq!(prompt.matches('é').count(), MAX_CONTEXT_CHARS);
    }
}
