//! Operational state of a network device.

use crate::ParseError;
use std::fmt;
use std::str::FromStr;

/// Operational state as reported by `/sys/class/net/<dev>/operstate`.
///
/// Follows the RFC 2863 vocabulary the kernel uses. Parsing is exact and
/// case-sensitive; callers strip the trailing newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperState {
    /// State cannot be determined (common for loopback and tunnels).
    #[default]
    Unknown,
    /// Device is not present (e.g. removed hardware).
    NotPresent,
    /// Device is operationally down.
    Down,
    /// Down because a lower layer device is down.
    LowerLayerDown,
    /// Device is in testing mode.
    Testing,
    /// Device is waiting for an external event (e.g. 802.1X).
    Dormant,
    /// Device is operationally up.
    Up,
}

impl OperState {
    /// Returns true if the device is operationally down.
    ///
    /// This is the only state in which a device may be renamed.
    pub const fn is_down(&self) -> bool {
        matches!(self, OperState::Down)
    }

    /// Returns the kernel spelling of this state.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperState::Unknown => "unknown",
            OperState::NotPresent => "notpresent",
            OperState::Down => "down",
            OperState::LowerLayerDown => "lowerlayerdown",
            OperState::Testing => "testing",
            OperState::Dormant => "dormant",
            OperState::Up => "up",
        }
    }
}

impl fmt::Display for OperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(OperState::Unknown),
            "notpresent" => Ok(OperState::NotPresent),
            "down" => Ok(OperState::Down),
            "lowerlayerdown" => Ok(OperState::LowerLayerDown),
            "testing" => Ok(OperState::Testing),
            "dormant" => Ok(OperState::Dormant),
            "up" => Ok(OperState::Up),
            _ => Err(ParseError::InvalidOperState(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_kernel_values() {
        assert_eq!("down".parse::<OperState>().unwrap(), OperState::Down);
        assert_eq!("up".parse::<OperState>().unwrap(), OperState::Up);
        assert_eq!(
            "lowerlayerdown".parse::<OperState>().unwrap(),
            OperState::LowerLayerDown
        );
        assert_eq!("dormant".parse::<OperState>().unwrap(), OperState::Dormant);
    }

    #[test]
    fn test_parse_is_exact() {
        assert!("DOWN".parse::<OperState>().is_err());
        assert!("Down".parse::<OperState>().is_err());
        assert!("down\n".parse::<OperState>().is_err());
        assert!(" down".parse::<OperState>().is_err());
    }

    #[test]
    fn test_parse_invalid() {
        assert!("sideways".parse::<OperState>().is_err());
        assert!("".parse::<OperState>().is_err());
    }

    #[test]
    fn test_only_down_is_down() {
        assert!(OperState::Down.is_down());
        assert!(!OperState::LowerLayerDown.is_down());
        assert!(!OperState::Unknown.is_down());
        assert!(!OperState::Up.is_down());
    }

    #[test]
    fn test_display_roundtrips_kernel_spelling() {
        assert_eq!(OperState::NotPresent.to_string(), "notpresent");
        assert_eq!(OperState::default(), OperState::Unknown);
    }
}
