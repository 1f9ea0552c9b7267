// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting long replies into Telegram-sized messages.

/// Telegram's limit for a single text message.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Splits `text` into chunks of at most `max_len` bytes.
///
/// Cuts prefer a blank line, then a newline, then a space; a word longer
/// than `max_len` is cut hard on a character boundary.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let (head, tail) = split_once(rest, max_len);
        if !head.is_empty() {
            chunks.push(head);
        }
        rest = tail;
    }
    chunks
}

fn split_once(text: &str, max_len: usize) -> (&str, &str) {
    if text.len() <= max_len {
        return (text, "");
    }
    let mut limit = max_len;
    while !text.is_char_boundary(limit) {
        limit -= 1;
    }
    let window = &text[..limit];

    if let Some(pos) = window.rfind("\n\n").filter(|&p| p > 0) {
        return (window[..pos].trim_end(), text[pos + 2..].trim_start());
    }
    if let Some(pos) = window.rfind('\n').filter(|&p| p > 0) {
        return (window[..pos].trim_end(), text[pos + 1..].trim_start());
    }
    if let Some(pos) = window.rfind(' ').filter(|&p| p > 0) {
        return (&window[..pos], text[pos + 1..].trim_start());
    }
    // A single character wider than max_len still has to make progress.
    if limit == 0 {
        limit = text.chars().next().map_or(text.len(), char::len_utf8);
    }
    (&text[..limit], &text[limit..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hello", MAX_MESSAGE_LEN), vec!["hello"]);
        assert!(split_message("   ", MAX_MESSAGE_LEN).is_empty());
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "aaaa bbbb\n\ncccc\ndddd";
        assert_eq!(split_message(text, 12), vec!["aaaa bbbb", "cccc\ndddd"]);
    }

    #[test]
    fn falls_back_to_newline_then_space() {
        assert_eq!(split_message("aaaa\nbbbb cccc", 10), vec!["aaaa", "bbbb cccc"]);
        assert_eq!(split_message("aaaa bbbb cccc", 10), vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn hard_split_respects_char_boundaries() {
        let text = "é".repeat(10);
        let chunks = split_message(&text, 5);
        assert!(chunks.iter().all(|c| c.len() <= 5));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn reply_over_limit_fits_telegram() {
        let paragraph = "word ".repeat(300);
        let text = vec![paragraph.trim(); 5].join("\n\n");
        let chunks = split_message(&text, MAX_MESSAGE_LEN);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_MESSAGE_LEN));
        let words: usize = chunks.iter().map(|c| c.split_whitespace().count()).sum();
        assert_eq!(words, 1500);
    }
}
