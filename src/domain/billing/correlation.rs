//! Correlation id carried through the payment provider's order object.
//!
//! The provider echoes this string back in the capture response, which is how
//! a capture is linked to the buyer and content of the original checkout
//! request. Format: `userId:contentId`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ContentId, UserId};

/// A `userId:contentId` pair encoded for the provider's `custom_id` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Encodes a user/content pair.
    ///
    /// Id validation guarantees neither part contains the `':'` delimiter.
    pub fn new(user_id: &UserId, content_id: &ContentId) -> Self {
        Self(format!("{}:{}", user_id, content_id))
    }

    /// Decodes the correlation string echoed back by the provider.
    ///
    /// Returns `None` for anything that is not exactly two non-empty,
    /// delimiter-free parts.
    pub fn decode(raw: &str) -> Option<(UserId, ContentId)> {
        let (user, content) = raw.split_once(':')?;
        let user_id = UserId::new(user).ok()?;
        let content_id = ContentId::new(content).ok()?;
        Some((user_id, content_id))
    }

    /// Parses a stored correlation string, validating its shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let (user_id, content_id) = Self::decode(raw)?;
        Some(Self::new(&user_id, &content_id))
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_user_and_content() {
        let c = CorrelationId::new(
            &UserId::new("U1").unwrap(),
            &ContentId::new("S1").unwrap(),
        );
        assert_eq!(c.as_str(), "U1:S1");
    }

    #[test]
    fn decode_inverts_encode() {
        let user = UserId::new("user-42").unwrap();
        let content = ContentId::new("set-7").unwrap();
        let c = CorrelationId::new(&user, &content);

        let (u, s) = CorrelationId::decode(c.as_str()).unwrap();
        assert_eq!(u, user);
        assert_eq!(s, content);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(CorrelationId::decode("no-delimiter").is_none());
        assert!(CorrelationId::decode(":S1").is_none());
        assert!(CorrelationId::decode("U1:").is_none());
        assert!(CorrelationId::decode("").is_none());
    }

    #[test]
    fn parse_roundtrips_valid_strings() {
        let parsed = CorrelationId::parse("U1:S1").unwrap();
        assert_eq!(parsed.as_str(), "U1:S1");
        assert!(CorrelationId::parse("garbage").is_none());
    }

    #[test]
    fn decode_rejects_extra_segments() {
        // A third segment would mean the content id contains ':'.
        assert!(CorrelationId::decode("U1:S1:extra").is_none());
    }
}
