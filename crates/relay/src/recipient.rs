//! Receiver strings from the send API to chat addresses.

use {
    tracing::{debug, warn},
    wabridge_protocol::{DEFAULT_USER_SERVER, Jid},
};

use crate::error::{Error, Result};

/// Resolve a send-request receiver into a chat address.
///
/// A bare identifier (no `@`) is taken as a user on the default server
/// without checking that it exists. Anything else must parse as a full JID
/// with a non-empty user part.
pub fn parse_recipient(input: &str) -> Result<Jid> {
    if !input.contains('@') {
        let jid = Jid::new(input, DEFAULT_USER_SERVER);
        debug!(recipient = %jid, bare = true, "recipient ok");
        return Ok(jid);
    }

    let jid: Jid = input.parse().map_err(|e| {
        warn!(recipient = input, error = %e, "invalid recipient");
        Error::invalid_recipient(input, e)
    })?;

    if jid.user.is_empty() {
        warn!(recipient = input, "recipient has no user part");
        return Err(Error::invalid_recipient(input, "no user part"));
    }

    debug!(recipient = %jid, bare = false, "recipient ok");
    Ok(jid)
}
