//! WhatsApp JIDs (`user[.agent][:device]@server`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Server suffix for regular user accounts.
pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";
/// Server suffix for group chats.
pub const GROUP_SERVER: &str = "g.us";
/// Server suffix for broadcast lists and status updates.
pub const BROADCAST_SERVER: &str = "broadcast";

/// A parsed chat address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Jid {
    pub user: String,
    pub agent: u8,
    pub device: u16,
    pub server: String,
}

impl Jid {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            agent: 0,
            device: 0,
            server: server.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.server.is_empty()
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }

    /// The status feed (`status@broadcast`); never relayed.
    pub fn is_status_broadcast(&self) -> bool {
        self.user == "status" && self.server == BROADCAST_SERVER
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user.is_empty() {
            return f.write_str(&self.server);
        }
        f.write_str(&self.user)?;
        if self.agent > 0 {
            write!(f, ".{}", self.agent)?;
        }
        if self.device > 0 {
            write!(f, ":{}", self.device)?;
        }
        write!(f, "@{}", self.server)
    }
}

impl FromStr for Jid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('@').collect();
        let (user_part, server) = match parts.as_slice() {
            [server] => return Ok(Self::new("", *server)),
            [user, server] => (*user, *server),
            _ => return Err(Error::invalid_jid(s, "unexpected number of @s")),
        };

        let (user_agent, device) = match user_part.split_once(':') {
            Some((ua, device)) => {
                let device = device
                    .parse::<u16>()
                    .map_err(|e| Error::invalid_jid(s, format!("bad device id: {e}")))?;
                (ua, device)
            },
            None => (user_part, 0),
        };

        let (user, agent) = match user_agent.split_once('.') {
            Some((user, agent)) if server == DEFAULT_USER_SERVER => {
                let agent = agent
                    .parse::<u8>()
                    .map_err(|e| Error::invalid_jid(s, format!("bad agent id: {e}")))?;
                (user, agent)
            },
            _ => (user_agent, 0),
        };

        Ok(Self {
            user: user.to_string(),
            agent,
            device,
            server: server.to_string(),
        })
    }
}

impl Serialize for Jid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Jid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("15551234567@s.whatsapp.net", "15551234567", 0, 0, DEFAULT_USER_SERVER)]
    #[case("15551234567:12@s.whatsapp.net", "15551234567", 0, 12, DEFAULT_USER_SERVER)]
    #[case("15551234567.1:3@s.whatsapp.net", "15551234567", 1, 3, DEFAULT_USER_SERVER)]
    #[case("120363025246125486@g.us", "120363025246125486", 0, 0, GROUP_SERVER)]
    #[case("status@broadcast", "status", 0, 0, BROADCAST_SERVER)]
    #[case("s.whatsapp.net", "", 0, 0, DEFAULT_USER_SERVER)]
    fn parses(
        #[case] input: &str,
        #[case] user: &str,
        #[case] agent: u8,
        #[case] device: u16,
        #[case] server: &str,
    ) {
        let jid: Jid = input.parse().unwrap();
        assert_eq!(jid.user, user);
        assert_eq!(jid.agent, agent);
        assert_eq!(jid.device, device);
        assert_eq!(jid.server, server);
    }

    #[rstest]
    #[case("a@b@c")]
    #[case("123:notanumber@s.whatsapp.net")]
    #[case("123.x@s.whatsapp.net")]
    fn rejects(#[case] input: &str) {
        assert!(input.parse::<Jid>().is_err());
    }

    #[test]
    fn display_includes_device() {
        let jid: Jid = "15551234567.1:3@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid.to_string(), "15551234567.1:3@s.whatsapp.net");
        assert_eq!(jid.agent, 1);
        assert_eq!(jid.device, 3);
    }

    #[test]
    fn dotted_user_kept_outside_default_server() {
        let jid: Jid = "first.last@example.org".parse().unwrap();
        assert_eq!(jid.user, "first.last");
        assert_eq!(jid.agent, 0);
    }

    #[test]
    fn empty_user_parses_but_is_flagged_by_callers() {
        let jid: Jid = "@domain".parse().unwrap();
        assert!(jid.user.is_empty());
        assert_eq!(jid.server, "domain");
    }

    #[test]
    fn status_broadcast_detection() {
        let jid: Jid = "status@broadcast".parse().unwrap();
        assert!(jid.is_status_broadcast());
        assert!(!jid.is_group());
        let list: Jid = "1234567@broadcast".parse().unwrap();
        assert!(!list.is_status_broadcast());
    }

    #[test]
    fn serde_as_string() {
        let jid = Jid::new("42", GROUP_SERVER);
        let json = serde_json::to_string(&jid).unwrap();
        assert_eq!(json, "\"42@g.us\"");
        let back: Jid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, jid);
    }
}
