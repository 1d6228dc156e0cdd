use super::errors::{ErrorKind, Result};
use failchain::{bail, ensure};
use serde::de::{Deserialize, Deserializer, Error as SerdeDeError};
use serde::ser::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::str::{self, FromStr};

/// An 8-byte, upper-case, NUL-padded record name.
///
/// Two names compare equal iff they name the same record regardless of letter case, since every
/// constructor upper-cases its input.
#[derive(Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Default)]
pub struct WadName([u8; 8]);

impl WadName {
    /// Strictly parses a user-supplied name: at most 8 characters from the set record names use.
    pub fn from_bytes(value: &[u8]) -> Result<WadName> {
        let mut name = [0u8; 8];
        let mut nulled = false;
        for (dest, &src) in name.iter_mut().zip(value.iter()) {
            ensure!(
                src.is_ascii(),
                ErrorKind::invalid_byte_in_wad_name(src, value)
            );

            let new_byte = match src.to_ascii_uppercase() {
                b @ b'A'..=b'Z'
                | b @ b'0'..=b'9'
                | b @ b'_'
                | b @ b'-'
                | b @ b'['
                | b @ b']'
                | b @ b'%'
                | b @ b'\\' => b,
                b'\0' => {
                    nulled = true;
                    break;
                }
                b => {
                    bail!(ErrorKind::invalid_byte_in_wad_name(b, value));
                }
            };
            *dest = new_byte;
        }

        ensure!(
            nulled || value.len() <= 8,
            ErrorKind::wad_name_too_long(value)
        );
        Ok(WadName(name))
    }

    /// Leniently normalises a raw on-disk name field.
    ///
    /// Everything after the first NUL is cleared and ASCII letters are upper-cased; other bytes
    /// are kept as they are, so a directory with odd names still opens.
    pub fn from_raw(raw: [u8; 8]) -> WadName {
        let mut name = [0u8; 8];
        for (dest, &src) in name.iter_mut().zip(raw.iter()) {
            if src == 0 {
                break;
            }
            *dest = src.to_ascii_uppercase();
        }
        WadName(name)
    }

    /// The `-` name, meaning "no texture".
    pub fn is_untextured(&self) -> bool {
        self.0[0] == b'-' && self.0[1] == b'\0'
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == b'\0'
    }

    pub fn len(&self) -> usize {
        self.0.iter().position(|&byte| byte == 0).unwrap_or(8)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..self.len()]
    }

    pub fn to_lossy_string(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl FromStr for WadName {
    type Err = super::errors::Error;
    fn from_str(value: &str) -> Result<WadName> {
        WadName::from_bytes(value.as_bytes())
    }
}

impl Display for WadName {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Debug for WadName {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "WadName({:?})",
            String::from_utf8_lossy(self.as_bytes())
        )
    }
}

impl Deref for WadName {
    type Target = [u8; 8];
    fn deref(&self) -> &[u8; 8] {
        &self.0
    }
}

impl PartialEq<[u8; 8]> for WadName {
    fn eq(&self, rhs: &[u8; 8]) -> bool {
        self.deref() == rhs
    }
}

impl Borrow<[u8; 8]> for WadName {
    fn borrow(&self) -> &[u8; 8] {
        self.deref()
    }
}

impl<'de> Deserialize<'de> for WadName {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(WadName::from_raw(<[u8; 8]>::deserialize(deserializer)?))
    }
}

impl Serialize for WadName {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// Deserializes a name from a TOML string, rejecting invalid names.
pub(crate) fn deserialize_name_from_str<'de, D>(deserializer: D) -> StdResult<WadName, D::Error>
where
    D: Deserializer<'de>,
{
    let string = String::deserialize(deserializer)?;
    WadName::from_str(&string).map_err(D::Error::custom)
}

pub trait IntoWadName {
    fn into_wad_name(self) -> Result<WadName>;
}

impl IntoWadName for &[u8] {
    fn into_wad_name(self) -> Result<WadName> {
        WadName::from_bytes(self)
    }
}

impl IntoWadName for &[u8; 8] {
    fn into_wad_name(self) -> Result<WadName> {
        WadName::from_bytes(self)
    }
}

impl IntoWadName for &str {
    fn into_wad_name(self) -> Result<WadName> {
        WadName::from_str(self)
    }
}

impl IntoWadName for &String {
    fn into_wad_name(self) -> Result<WadName> {
        WadName::from_str(self)
    }
}

impl IntoWadName for WadName {
    fn into_wad_name(self) -> Result<WadName> {
        Ok(self)
    }
}

impl IntoWadName for &WadName {
    fn into_wad_name(self) -> Result<WadName> {
        Ok(*self)
    }
}
