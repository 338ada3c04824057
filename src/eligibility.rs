//! Claim path derivation.
//!
//! An account can claim through the whitelist or through a token of the
//! associated collection, never both: holding any token excludes the
//! account from the whitelist claim.

use std::fmt;

use alloy_primitives::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EligibilityFlags {
    pub is_whitelisted: bool,
    pub is_paused: bool,
}

/// Token ids owned by the connected account, in contract order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OwnedTokens(Vec<U256>);

impl OwnedTokens {
    pub fn new(ids: Vec<U256>) -> Self {
        Self(ids)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: &U256) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &U256> {
        self.0.iter()
    }
}

/// The path a submission would take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPath {
    Whitelist,
    Nft(U256),
}

/// Why an account cannot use a claim path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    NotWhitelisted,
    NftHolderOnWhitelist,
    NoEligibleTokens,
    NoTokenSelected,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ineligibility::NotWhitelisted => "Address is not whitelisted",
            Ineligibility::NftHolderOnWhitelist => "NFT holders cannot use whitelist withdrawal",
            Ineligibility::NoEligibleTokens => "You don't own any eligible NFTs",
            Ineligibility::NoTokenSelected => "Select an NFT to claim with",
        })
    }
}

/// Whether the whitelist path is open for these flags and tokens.
pub fn whitelist_access(flags: &EligibilityFlags, owned: &OwnedTokens) -> Result<(), Ineligibility> {
    if !owned.is_empty() {
        Err(Ineligibility::NftHolderOnWhitelist)
    } else if !flags.is_whitelisted {
        Err(Ineligibility::NotWhitelisted)
    } else {
        Ok(())
    }
}

/// Whether the NFT path is open, independent of a selection.
pub fn nft_access(owned: &OwnedTokens) -> Result<(), Ineligibility> {
    if owned.is_empty() {
        Err(Ineligibility::NoEligibleTokens)
    } else {
        Ok(())
    }
}

/// Resolve the single path a submission would use.
///
/// Token holders always go through the NFT path and must have a selection;
/// everyone else goes through the whitelist.
pub fn active_path(
    flags: &EligibilityFlags,
    owned: &OwnedTokens,
    selected: Option<U256>,
) -> Result<ClaimPath, Ineligibility> {
    if owned.is_empty() {
        whitelist_access(flags, owned).map(|()| ClaimPath::Whitelist)
    } else {
        match selected {
            Some(id) if owned.contains(&id) => Ok(ClaimPath::Nft(id)),
            _ => Err(Ineligibility::NoTokenSelected),
        }
    }
}
