use alloy_primitives::Address;

/// Connection state as reported by the wallet provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Address),
}

impl ConnectionState {
    pub fn account(&self) -> Option<Address> {
        match self {
            ConnectionState::Connected(account) => Some(*account),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}
