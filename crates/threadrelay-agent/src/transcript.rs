use threadrelay_core::ThreadMessage;

/// Render a thread's message history as a single prompt transcript.
///
/// One `"<user>: <text>"` line per message, newline-joined, in input order
/// (chronological order as returned by the platform). No trailing newline.
/// An empty history yields the empty string.
pub fn build_transcript(messages: &[ThreadMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.user, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_empty_string() {
        assert_eq!(build_transcript(&[]), "");
    }

    #[test]
    fn single_message() {
        let history = vec![ThreadMessage::new("U1", "hi")];
        assert_eq!(build_transcript(&history), "U1: hi");
    }

    #[test]
    fn preserves_order_without_trailing_newline() {
        let history = vec![
            ThreadMessage::new("U1", "first"),
            ThreadMessage::new("U2", "second"),
            ThreadMessage::new("U1", "third"),
        ];
        let transcript = build_transcript(&history);
        assert_eq!(transcript, "U1: first\nU2: second\nU1: third");
        assert!(!transcript.ends_with('\n'));
    }

    #[test]
    fn empty_text_renders_as_bare_line() {
        let history = vec![ThreadMessage::new("U2", "")];
        assert_eq!(build_transcript(&history), "U2: ");
    }
}
