//! Bounded history of consumed inbound events.

use std::{collections::VecDeque, sync::Mutex};

use wabridge_protocol::{DEFAULT_HISTORY_CAPACITY, MessageEvent};

/// FIFO ring buffer; the oldest event is evicted once full.
pub struct EventHistory {
    entries: Mutex<VecDeque<MessageEvent>>,
    capacity: usize,
}

impl EventHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn push(&self, event: MessageEvent) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(event);
    }

    pub fn last(&self) -> Option<MessageEvent> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::Utc,
        wabridge_protocol::{Jid, Message, MessageInfo},
    };

    fn event(id: &str) -> MessageEvent {
        MessageEvent {
            info: MessageInfo {
                id: id.into(),
                chat: Jid::new("1", "s.whatsapp.net"),
                sender: Jid::new("1", "s.whatsapp.net"),
                push_name: String::new(),
                is_from_me: false,
                is_group: false,
                timestamp: Utc::now(),
                media_type: String::new(),
                multicast: false,
            },
            message: Message::default(),
            is_ephemeral: false,
            is_view_once: false,
        }
    }

    #[test]
    fn empty_history_has_no_last() {
        let history = EventHistory::new(3);
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let history = EventHistory::new(2);
        history.push(event("a"));
        history.push(event("b"));
        history.push(event("c"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().info.id, "c");
        let entries = history.entries.lock().unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.info.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let history = EventHistory::new(0);
        history.push(event("a"));
        history.push(event("b"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().info.id, "b");
    }
}
