use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Decoding instruction stored with every URL entry.
///
/// The discriminants are part of the wire format and of URL-entry address
/// seeds.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ExpandMode {
    /// Stored text is returned verbatim.
    None = 0,
    /// The owning listing's UUID (lowercase, hyphenated) is appended.
    AppendUuid = 1,
    /// Stored text is percent-encoded UTF-8 and is decoded on read.
    Utf8UriEncoded = 2,
}

impl ExpandMode {
    pub const ALL: [ExpandMode; 3] = [Self::None, Self::AppendUuid, Self::Utf8UriEncoded];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ExpandMode {
    type Error = TypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::AppendUuid),
            2 => Ok(Self::Utf8UriEncoded),
            other => Err(TypeError::UnknownExpandMode(other)),
        }
    }
}

impl From<ExpandMode> for u8 {
    fn from(mode: ExpandMode) -> Self {
        mode as u8
    }
}

impl fmt::Display for ExpandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::AppendUuid => write!(f, "append-uuid"),
            Self::Utf8UriEncoded => write!(f, "utf8-uri-encoded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_roundtrip() {
        for mode in ExpandMode::ALL {
            assert_eq!(ExpandMode::try_from(mode.as_u8()).unwrap(), mode);
        }
    }

    #[test]
    fn unknown_byte_rejected() {
        assert_eq!(ExpandMode::try_from(3), Err(TypeError::UnknownExpandMode(3)));
    }

    #[test]
    fn serde_uses_numeric_form() {
        assert_eq!(serde_json::to_string(&ExpandMode::Utf8UriEncoded).unwrap(), "2");
        let mode: ExpandMode = serde_json::from_str("1").unwrap();
        assert_eq!(mode, ExpandMode::AppendUuid);
        assert!(serde_json::from_str::<ExpandMode>("9").is_err());
    }
}
