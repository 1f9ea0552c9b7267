// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering of incoming Telegram messages and conversion to [`InboundMessage`].

use teloxide::types::{ChatKind, Message};
use wren_core::InboundMessage;

/// Channel name used for chats and conversations created through Telegram.
pub const CHANNEL_NAME: &str = "telegram";

/// Whether the sender may talk to the bot.
///
/// Entries in `allowed_users` match the numeric user id or the username
/// (case-insensitive, optional leading `@`). An empty list admits nobody.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        *allowed == user_id
            || user.username.as_deref().is_some_and(|username| {
                username.eq_ignore_ascii_case(allowed.strip_prefix('@').unwrap_or(allowed))
            })
    })
}

/// Only private chats are served.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Text messages become inbound messages keyed by the Telegram chat id.
/// Anything without text (stickers, photos, ...) yields `None`.
pub fn to_inbound(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?.trim();
    if text.is_empty() {
        return None;
    }
    let user_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    Some(InboundMessage::new(
        CHANNEL_NAME,
        msg.chat.id.0.to_string(),
        user_id,
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        let mut from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(username) = username {
            from["username"] = username.into();
        }
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {"id": user_id as i64, "type": "private", "first_name": "Test"},
            "from": from,
            "text": text,
        }))
        .unwrap()
    }

    fn group_message(user_id: u64, text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {"id": -100123i64, "type": "supergroup", "title": "Group"},
            "from": {"id": user_id, "is_bot": false, "first_name": "Test"},
            "text": text,
        }))
        .unwrap()
    }

    #[test]
    fn authorized_by_id_or_username() {
        let msg = private_message(12345, Some("Wren_User"), "hi");
        assert!(is_authorized(&msg, &["12345".into()]));
        assert!(is_authorized(&msg, &["wren_user".into()]));
        assert!(is_authorized(&msg, &["@Wren_User".into()]));
        assert!(!is_authorized(&msg, &["999".into(), "someone".into()]));
    }

    #[test]
    fn empty_allow_list_admits_nobody() {
        let msg = private_message(12345, None, "hi");
        assert!(!is_authorized(&msg, &[]));
    }

    #[test]
    fn only_private_chats_are_served() {
        assert!(is_dm(&private_message(1, None, "hi")));
        assert!(!is_dm(&group_message(1, "hi")));
    }

    #[test]
    fn inbound_uses_chat_and_user_ids() {
        let inbound = to_inbound(&private_message(42, None, "  /list all ")).unwrap();
        assert_eq!(inbound.channel, "telegram");
        assert_eq!(inbound.chat_id, "42");
        assert_eq!(inbound.user_id, "42");
        assert_eq!(inbound.text, "/list all");
    }

    #[test]
    fn blank_text_is_ignored() {
        assert!(to_inbound(&private_message(42, None, "   ")).is_none());
    }
}
