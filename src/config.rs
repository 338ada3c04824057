use std::str::FromStr;

use alloy_primitives::Address;

use crate::note::NoteBounds;

/// Environment variable holding the jar address.
pub const JAR_ADDRESS_ENV: &str = "COOKIE_JAR_ADDRESS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Address of the cookie jar contract.
    pub jar: Address,
    pub note_bounds: NoteBounds,
}

impl ClientConfig {
    pub fn new(jar: Address) -> Self {
        Self {
            jar,
            note_bounds: NoteBounds::default(),
        }
    }

    pub fn with_note_bounds(mut self, bounds: NoteBounds) -> Self {
        self.note_bounds = bounds;
        self
    }

    /// Build a config from a hex address string.
    pub fn parse(jar: &str) -> Result<Self, alloy_primitives::hex::FromHexError> {
        Ok(Self::new(Address::from_str(jar.trim())?))
    }
}
