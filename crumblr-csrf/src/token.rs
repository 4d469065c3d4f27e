use std::fmt;

/// Minimum width of the decimal timestamp prefix of a composite token.
pub const STAMP_WIDTH: usize = 10;

/// Length of a hex SHA-256 digest.
pub const DIGEST_WIDTH: usize = 64;

/// Render a timestamp as a zero-padded decimal stamp.
///
/// Timestamps past 9999999999 need more than [`STAMP_WIDTH`] digits and are
/// rendered in full.
pub fn format_stamp(timestamp: u64) -> String {
    format!("{:0width$}", timestamp, width = STAMP_WIDTH)
}

/// Parse a decimal stamp. Anything but ASCII digits is rejected.
pub fn parse_stamp(stamp: &str) -> Option<u64> {
    if stamp.is_empty() || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stamp.parse().ok()
}

/// A crumb as issued by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Seconds since the epoch at issuance
    pub timestamp: u64,

    /// Lowercase hex digest
    pub digest: String,
}

impl IssuedToken {
    pub fn new(timestamp: u64, digest: impl Into<String>) -> Self {
        Self {
            timestamp,
            digest: digest.into(),
        }
    }

    /// The fixed-width timestamp
    pub fn stamp(&self) -> String {
        format_stamp(self.timestamp)
    }

    /// Timestamp and digest as one opaque string
    pub fn composite(&self) -> String {
        let mut token = self.stamp();
        token.push_str(&self.digest);
        token
    }
}

impl fmt::Display for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stamp())?;
        f.write_str(&self.digest)
    }
}

/// Where a presented crumb was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Form or query parameters
    Parameter,
    /// The alternate header carrier
    Header,
}

/// A crumb as received from a client, not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedToken {
    /// Timestamp text exactly as received
    pub stamp: String,

    /// Digest text exactly as received
    pub digest: String,
}

impl PresentedToken {
    /// Pair a digest with its separately submitted timestamp.
    pub fn from_parts(digest: impl Into<String>, stamp: impl Into<String>) -> Self {
        Self {
            stamp: stamp.into(),
            digest: digest.into(),
        }
    }

    /// Split a composite token into stamp and digest.
    ///
    /// A token long enough to hold a full stamp and digest keeps its last
    /// [`DIGEST_WIDTH`] characters as the digest, so stamps wider than
    /// [`STAMP_WIDTH`] still split correctly. Shorter tokens are split at
    /// [`STAMP_WIDTH`]. Tokens that can't be split on a character boundary
    /// come back with an empty digest so that they fail the digest check
    /// instead of looking absent.
    pub fn from_composite(token: &str) -> Self {
        let at = if token.len() >= STAMP_WIDTH + DIGEST_WIDTH {
            token.len() - DIGEST_WIDTH
        } else {
            STAMP_WIDTH
        };

        match (token.get(..at), token.get(at..)) {
            (Some(stamp), Some(digest)) => Self::from_parts(digest, stamp),
            _ => Self::from_parts("", token),
        }
    }

    /// The received timestamp, if it is well formed
    pub fn timestamp(&self) -> Option<u64> {
        parse_stamp(&self.stamp)
    }
}
