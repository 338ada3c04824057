use std::time::Duration;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolInterface;
use thiserror::Error;

use crate::abi::ICookieJar::ICookieJarErrors;
use crate::eligibility::Ineligibility;
use crate::format::format_time_remaining;
use crate::note::NoteError;

/// Failure reported by a read or write collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The call reverted; carries the raw revert data.
    #[error("execution reverted")]
    Reverted(Bytes),

    /// Anything else: transport, signer rejection, provider errors.
    #[error("{0}")]
    Other(String),
}

/// Known custom errors raised by the cookie jar contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractError {
    ContractIsPaused,
    NotAllowedMember,
    NftHoldersCannotUseWhitelist,
    NotNftOwner,
    WithdrawalTooSoon,
    NoteTooShort,
    NoteTooLong,
    InsufficientJarBalance,
}

impl ContractError {
    /// Human-readable text for the error code.
    pub fn message(self) -> &'static str {
        match self {
            ContractError::ContractIsPaused => "The cookie jar is currently paused",
            ContractError::NotAllowedMember => "Your address is not on the whitelist",
            ContractError::NftHoldersCannotUseWhitelist => {
                "NFT holders cannot use whitelist withdrawal"
            }
            ContractError::NotNftOwner => "You do not own the selected NFT",
            ContractError::WithdrawalTooSoon => "You must wait for the cooldown period to end",
            ContractError::NoteTooShort => "Your note is too short",
            ContractError::NoteTooLong => "Your note is too long",
            ContractError::InsufficientJarBalance => "The cookie jar is empty",
        }
    }

    /// Solidity name of the error, as declared by the contract.
    pub fn code(self) -> &'static str {
        match self {
            ContractError::ContractIsPaused => "ContractIsPaused",
            ContractError::NotAllowedMember => "NotAllowedMember",
            ContractError::NftHoldersCannotUseWhitelist => "NFTHoldersCannotUseWhitelist",
            ContractError::NotNftOwner => "NotNFTOwner",
            ContractError::WithdrawalTooSoon => "WithdrawalTooSoon",
            ContractError::NoteTooShort => "NoteTooShort",
            ContractError::NoteTooLong => "NoteTooLong",
            ContractError::InsufficientJarBalance => "InsufficientJarBalance",
        }
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Decode raw revert data into a known contract error.
///
/// Returns `None` for empty data, string reverts and selectors the jar
/// does not declare.
pub fn decode_revert(data: &[u8]) -> Option<ContractError> {
    let decoded = ICookieJarErrors::abi_decode(data, true).ok()?;
    Some(match decoded {
        ICookieJarErrors::ContractIsPaused(_) => ContractError::ContractIsPaused,
        ICookieJarErrors::NotAllowedMember(_) => ContractError::NotAllowedMember,
        ICookieJarErrors::NFTHoldersCannotUseWhitelist(_) => {
            ContractError::NftHoldersCannotUseWhitelist
        }
        ICookieJarErrors::NotNFTOwner(_) => ContractError::NotNftOwner,
        ICookieJarErrors::WithdrawalTooSoon(_) => ContractError::WithdrawalTooSoon,
        ICookieJarErrors::NoteTooShort(_) => ContractError::NoteTooShort,
        ICookieJarErrors::NoteTooLong(_) => ContractError::NoteTooLong,
        ICookieJarErrors::InsufficientJarBalance(_) => ContractError::InsufficientJarBalance,
    })
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Wallet is not connected")]
    NotConnected,

    /// A contract read failed; the message is kept verbatim.
    #[error("{0}")]
    Read(String),

    #[error("{0}")]
    InvalidNote(NoteError),

    #[error("{0}")]
    Ineligible(Ineligibility),

    #[error("Token #{0} is not owned by the connected account")]
    TokenNotOwned(U256),

    #[error("Waiting period active: {}", format_time_remaining(.0.as_secs()))]
    CooldownActive(Duration),

    #[error("Cooldown has not been loaded yet")]
    CooldownUnknown,

    #[error("A transaction is already pending")]
    TransactionPending,

    #[error("{0}")]
    Contract(ContractError),

    /// A write failed with an error the contract does not declare.
    #[error("{0}")]
    Write(String),
}

impl Error {
    /// Map a failed write into either a known contract error or the raw message.
    pub fn from_write(err: CallError) -> Self {
        match &err {
            CallError::Reverted(data) => match decode_revert(data) {
                Some(code) => Error::Contract(code),
                None => Error::Write(err.to_string()),
            },
            CallError::Other(message) => Error::Write(message.clone()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::ICookieJar;
    use alloy_sol_types::SolError;

    #[test]
    fn decodes_declared_errors() {
        let data = ICookieJar::ContractIsPaused {}.abi_encode();
        assert_eq!(decode_revert(&data), Some(ContractError::ContractIsPaused));

        let data = ICookieJar::WithdrawalTooSoon {
            remaining: U256::from(60),
        }
        .abi_encode();
        assert_eq!(decode_revert(&data), Some(ContractError::WithdrawalTooSoon));
    }

    #[test]
    fn unknown_revert_data_is_not_mapped() {
        assert_eq!(decode_revert(&[]), None);
        assert_eq!(decode_revert(&[0xde, 0xad, 0xbe, 0xef]), None);
    }

    #[test]
    fn write_errors_fall_back_to_raw_message() {
        let known = CallError::Reverted(ICookieJar::NotNFTOwner {}.abi_encode().into());
        assert_eq!(
            Error::from_write(known).to_string(),
            "You do not own the selected NFT"
        );

        let unknown = CallError::Reverted(Bytes::new());
        assert_eq!(Error::from_write(unknown).to_string(), "execution reverted");

        let rejected = CallError::Other("User rejected the request.".into());
        assert_eq!(
            Error::from_write(rejected),
            Error::Write("User rejected the request.".into())
        );
    }
}
