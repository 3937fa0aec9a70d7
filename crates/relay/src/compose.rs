//! Display text for inbound events.
//!
//! Quotes, forwards, reactions, contact cards and locations are folded into
//! `conversation` so the relay endpoint can show the message as-is. Group
//! messages get the sender's name in front.

use std::sync::LazyLock;

use {
    regex::Regex,
    wabridge_protocol::{DEFAULT_MAPS_BASE_URL, LocationMessage, Message, MessageEvent},
};

pub const FORWARDED_PREFIX: &str = "→Forwarded←\n";

static VCARD_TEL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("TEL.*?:(.+)").ok());
static VCARD_EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("EMAIL.*?:(.+)").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Decorate group messages with the sender name.
    pub group_handling: bool,
    pub maps_base_url: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            group_handling: true,
            maps_base_url: DEFAULT_MAPS_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composed {
    pub conversation: String,
    pub caption: String,
}

/// Build the display text of `event`.
pub fn compose(event: &MessageEvent, options: &ComposeOptions) -> Composed {
    let message = &event.message;
    let sender = event.info.push_name.as_str();
    let group = event.info.is_group && options.group_handling;

    let mut conversation = message.text().to_string();
    let mut caption = message.media_caption().to_string();
    let mut decorated = false;

    let context = message.context_info();
    let quoted = context.and_then(|c| c.quoted_message.as_deref());

    if let Some(quoted_msg) = quoted {
        let participant = context
            .and_then(|c| c.participant.as_deref())
            .unwrap_or_default();
        let mut quoted_text = format!("{participant}\n{}", quoted_body(quoted_msg));
        if let Some(location) = quoted_msg.location_message.as_ref() {
            quoted_text = format!("{quoted_text} {}\n", maps_url(&options.maps_base_url, location));
        }

        conversation = if group {
            let body = if conversation.is_empty() {
                &caption
            } else {
                &conversation
            };
            format!("{sender}\n[\"{quoted_text}\"]\n{body}")
        } else {
            format!("\n〚{quoted_text}〛{conversation}")
        };
        decorated = true;
    }

    if message.is_forwarded() {
        let prefix = format!("{FORWARDED_PREFIX}{sender}\n");
        if conversation.is_empty() {
            caption.insert_str(0, &prefix);
        } else {
            conversation.insert_str(0, &prefix);
        }
        decorated = true;
    }

    if let Some(text) = message
        .reaction_message
        .as_ref()
        .and_then(|r| r.text.as_deref())
    {
        conversation = text.to_string();
    }

    if let Some(contact) = message.contact_message.as_ref() {
        let vcard = contact.vcard.as_deref().unwrap_or_default();
        let name = contact.display_name.as_deref().unwrap_or_default();
        let phone = capture(VCARD_TEL.as_ref(), vcard).replace([' ', '-'], "");
        let email = capture(VCARD_EMAIL.as_ref(), vcard);
        conversation = format!("*{name}*\n{phone}\n{email}");
        caption = name.to_string();
    }

    if let Some(location) = message.location_message.as_ref() {
        let url = maps_url(&options.maps_base_url, location);
        let replying_to_location = quoted.is_some_and(|q| q.location_message.is_some());
        if replying_to_location {
            conversation = format!("{conversation}\nReply: {url}");
        } else {
            conversation = format!("{conversation}\n{url}");
        }
        caption = url;
    }

    if group && !decorated {
        conversation = decorate_group(event, sender, &conversation, &caption);
    }

    Composed {
        conversation,
        caption,
    }
}

fn decorate_group(event: &MessageEvent, sender: &str, conversation: &str, caption: &str) -> String {
    // A bare location composes as "\n<url>"; the sender line replaces that break.
    let body = match event.message.location_message {
        Some(_) => conversation.strip_prefix('\n').unwrap_or(conversation),
        None => conversation,
    };
    if event.info.media_type.is_empty() {
        let me = if event.info.is_from_me {
            " (Me)"
        } else {
            ""
        };
        return format!("{sender}{me}\n{body}");
    }
    if body.is_empty() && caption.is_empty() {
        return sender.to_string();
    }
    let body = if body.is_empty() {
        caption
    } else {
        body
    };
    format!("{sender}\n{body}")
}

/// Text of a quoted message: conversation, extended text, then media caption.
fn quoted_body(quoted: &Message) -> &str {
    match quoted.text() {
        "" => quoted.media_caption(),
        text => text,
    }
}

/// `<base>/?q=<lat>,<lon>`; a missing coordinate renders empty.
pub fn maps_url(base: &str, location: &LocationMessage) -> String {
    let coord = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    format!(
        "{}/?q={},{}",
        base.trim_end_matches('/'),
        coord(location.degrees_latitude),
        coord(location.degrees_longitude)
    )
}

fn capture(re: Option<&Regex>, haystack: &str) -> String {
    re.and_then(|re| re.captures(haystack))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
