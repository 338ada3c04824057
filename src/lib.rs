//! Cookie jar withdrawal client.
//!
//! Decides whether a connected account may claim from the jar, either as a
//! whitelisted member or as a holder of the associated NFT collection, and
//! prepares the matching withdrawal call. Reads go through a
//! [`ContractCaller`], writes through a [`TransactionSender`]; both are
//! supplied by the embedding application.

pub mod abi;
pub mod chain;
pub mod config;
pub mod contract;
pub mod controller;
pub mod eligibility;
pub mod error;
pub mod format;
pub mod note;
pub mod view;
pub mod wallet;

pub use chain::{ChainSnapshot, MemoryChain};
pub use config::ClientConfig;
pub use contract::{ContractCaller, CookieJar, TransactionSender, Withdrawal, WriteRequest};
pub use controller::{RefreshTicket, TransactionState, WithdrawalController};
pub use eligibility::{ClaimPath, EligibilityFlags, Ineligibility, OwnedTokens};
pub use error::{decode_revert, CallError, ContractError, Error, Result};
pub use note::{validate_note, NoteBounds, NoteValidation};
pub use view::View;
pub use wallet::ConnectionState;
