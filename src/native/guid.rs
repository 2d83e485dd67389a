//! A platform-independent GUID
//!
//! ETW identifies providers (and activities) with GUIDs. On the wire, a GUID is 16 bytes laid out
//! as a little-endian `u32`, two little-endian `u16`s and 8 verbatim bytes.
use std::fmt;
use std::str::FromStr;

/// A GUID, with the same field layout as the Windows `GUID` structure
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// Errors when parsing a [`Guid`] from its string representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidParseError {
    /// The string (without braces) is not 36 characters long
    InvalidLength(usize),
    /// Hyphens are misplaced or a character is not an hex digit
    InvalidFormat,
}

impl fmt::Display for GuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(l) => write!(f, "invalid guid length {}", l),
            Self::InvalidFormat => write!(f, "invalid guid format"),
        }
    }
}

impl std::error::Error for GuidParseError {}

impl Guid {
    pub const fn from_values(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Build a GUID from its "big-endian" integer form, e.g. `0x22fb2cd6_0e7b_422b_a0c7_2fad1fd0e716`
    pub const fn from_u128(uuid: u128) -> Self {
        Self {
            data1: (uuid >> 96) as u32,
            data2: ((uuid >> 80) & 0xffff) as u16,
            data3: ((uuid >> 64) & 0xffff) as u16,
            data4: (uuid as u64).to_be_bytes(),
        }
    }

    pub const fn to_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | (u64::from_be_bytes(self.data4) as u128)
    }

    /// The 16 bytes of this GUID, as they appear in an event payload
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
        bytes[8..].copy_from_slice(&self.data4);
        bytes
    }

    pub fn is_nil(&self) -> bool {
        self.to_u128() == 0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Guid {
    type Err = GuidParseError;

    /// Accepts `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, optionally surrounded by braces, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(s);

        if s.len() != 36 {
            return Err(GuidParseError::InvalidLength(s.len()));
        }

        let mut hex = String::with_capacity(32);
        for (i, c) in s.chars().enumerate() {
            match i {
                8 | 13 | 18 | 23 => {
                    if c != '-' {
                        return Err(GuidParseError::InvalidFormat);
                    }
                }
                _ if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(GuidParseError::InvalidFormat),
            }
        }

        u128::from_str_radix(&hex, 16)
            .map(Guid::from_u128)
            .map_err(|_| GuidParseError::InvalidFormat)
    }
}

impl From<u128> for Guid {
    fn from(uuid: u128) -> Self {
        Guid::from_u128(uuid)
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        if serializer.is_human_readable() {
            return serializer.collect_str(self);
        }

        serde::ser::Serialize::serialize(
            &(self.data1, self.data2, self.data3, self.data4),
            serializer,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const KERNEL_PROCESS: &str = "22fb2cd6-0e7b-422b-a0c7-2fad1fd0e716";

    #[test]
    fn parse_and_format() {
        let guid: Guid = KERNEL_PROCESS.parse().unwrap();
        assert_eq!(guid.data1, 0x22fb2cd6);
        assert_eq!(guid.data2, 0x0e7b);
        assert_eq!(guid.data3, 0x422b);
        assert_eq!(guid.data4, [0xa0, 0xc7, 0x2f, 0xad, 0x1f, 0xd0, 0xe7, 0x16]);
        assert_eq!(guid.to_string(), KERNEL_PROCESS);
        assert_eq!(guid, Guid::from_u128(0x22fb2cd6_0e7b_422b_a0c7_2fad1fd0e716));
    }

    #[test]
    fn parse_braces_and_uppercase() {
        let guid: Guid = "{22FB2CD6-0E7B-422B-A0C7-2FAD1FD0E716}".parse().unwrap();
        assert_eq!(guid.to_string(), KERNEL_PROCESS);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "22fb2cd6".parse::<Guid>(),
            Err(GuidParseError::InvalidLength(8))
        );
        assert_eq!(
            "22fb2cd6+0e7b-422b-a0c7-2fad1fd0e716".parse::<Guid>(),
            Err(GuidParseError::InvalidFormat)
        );
        assert_eq!(
            "z2fb2cd6-0e7b-422b-a0c7-2fad1fd0e716".parse::<Guid>(),
            Err(GuidParseError::InvalidFormat)
        );
    }

    #[test]
    fn wire_layout() {
        let guid = Guid::from_u128(0x00112233_4455_6677_8899_aabbccddeeff);
        assert_eq!(
            guid.to_bytes_le(),
            [
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc,
                0xdd, 0xee, 0xff
            ]
        );
        assert_eq!(guid.to_u128(), 0x00112233_4455_6677_8899_aabbccddeeff);
        assert!(Guid::default().is_nil());
    }
}
