use std::fmt;

use serde::Serialize;

/// Brightness percentage, always within `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    pub const MAX: Brightness = Brightness(100);

    /// Clamp any integer into range. Out-of-range input is not an error.
    pub fn clamped(pct: i64) -> Self {
        Self(pct.clamp(0, 100) as u8)
    }

    pub fn pct(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
