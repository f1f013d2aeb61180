//! Link-layer address type with safe parsing and formatting.

use crate::ParseError;
use std::fmt;
use std::str::FromStr;

/// Longest link-layer address the kernel reports (`MAX_ADDR_LEN`).
pub const MAX_ADDR_LEN: usize = 32;

/// A link-layer (hardware) address of any length up to [`MAX_ADDR_LEN`].
///
/// Ethernet and Wi-Fi use 6 octets, IPoIB uses 20. Parsing accepts upper or
/// lower case hex with colon or hyphen separators; display is always
/// lower-case colon-hex, which is what sysfs reports.
///
/// # Examples
///
/// ```
/// use netapply_types::MacAddress;
///
/// let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
/// assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
///
/// let mac2: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
/// assert_eq!(mac, mac2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress {
    len: u8,
    // Octets past `len` are always zero so derived comparisons hold.
    octets: [u8; MAX_ADDR_LEN],
}

impl MacAddress {
    /// Creates an address from raw octets.
    ///
    /// Returns `None` for an empty slice or one longer than
    /// [`MAX_ADDR_LEN`].
    pub fn from_octets(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > MAX_ADDR_LEN {
            return None;
        }
        let mut octets = [0u8; MAX_ADDR_LEN];
        octets[..bytes.len()].copy_from_slice(bytes);
        Some(MacAddress {
            len: bytes.len() as u8,
            octets,
        })
    }

    /// Returns the octets of the address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.octets[..self.len as usize]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());
        let trimmed = s.trim();
        let separator = if trimmed.contains(':') { ':' } else { '-' };

        let mut bytes = Vec::with_capacity(MAX_ADDR_LEN);
        for part in trimmed.split(separator) {
            if part.is_empty() || part.len() > 2 {
                return Err(invalid());
            }
            bytes.push(u8::from_str_radix(part, 16).map_err(|_| invalid())?);
        }
        // A lone octet is not an address anyone declares.
        if bytes.len() < 2 {
            return Err(invalid());
        }

        MacAddress::from_octets(&bytes).ok_or_else(invalid)
    }
}
