//! In-memory cookie jar that answers ABI-encoded calls from a JSON snapshot.
//!
//! Used by the CLI to inspect a known jar state and by the tests as the
//! read facility.

use std::cell::RefCell;
use std::collections::HashSet;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolError, SolInterface};
use log::trace;
use serde::Deserialize;

use crate::abi::ICollection::{self, ICollectionCalls};
use crate::abi::ICookieJar::{self, ICookieJarCalls};
use crate::contract::ContractCaller;
use crate::error::CallError;

#[derive(Debug, Clone, Deserialize)]
pub struct MemberEntry {
    pub address: Address,
    /// Seconds until this member may claim again.
    #[serde(default)]
    pub remaining_time: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    pub id: u64,
    pub owner: Address,
    #[serde(default)]
    pub remaining_time: u64,
}

/// Jar state as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSnapshot {
    pub jar: Address,
    pub collection: Address,
    #[serde(default)]
    pub paused: bool,
    /// Wei paid out per claim.
    pub withdrawal_amount: u128,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug)]
pub struct MemoryChain {
    snapshot: ChainSnapshot,
    calls: RefCell<Vec<&'static str>>,
    failing: RefCell<HashSet<&'static str>>,
}

impl MemoryChain {
    pub fn new(snapshot: ChainSnapshot) -> Self {
        Self {
            snapshot,
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn snapshot(&self) -> &ChainSnapshot {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut ChainSnapshot {
        &mut self.snapshot
    }

    /// Signatures of every call served so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Make every call to `signature` fail with a transport error.
    pub fn fail_on(&self, signature: &'static str) {
        self.failing.borrow_mut().insert(signature);
    }

    /// Undo [`MemoryChain::fail_on`] for `signature`.
    pub fn recover(&self, signature: &'static str) {
        self.failing.borrow_mut().remove(signature);
    }

    fn record(&self, signature: &'static str) -> Result<(), CallError> {
        trace!("memory chain serving {signature}");
        self.calls.borrow_mut().push(signature);
        if self.failing.borrow().contains(signature) {
            return Err(CallError::Other(format!("{signature} failed: connection refused")));
        }
        Ok(())
    }

    fn owned_by(&self, owner: Address) -> impl Iterator<Item = &TokenEntry> {
        self.snapshot.tokens.iter().filter(move |t| t.owner == owner)
    }

    fn member(&self, address: Address) -> Option<&MemberEntry> {
        self.snapshot.members.iter().find(|m| m.address == address)
    }

    fn jar_call(&self, from: Option<Address>, data: &[u8]) -> Result<Vec<u8>, CallError> {
        let call = ICookieJarCalls::abi_decode(data, true)
            .map_err(|e| CallError::Other(format!("unknown jar call: {e}")))?;

        let output = match call {
            ICookieJarCalls::isAllowedMember(c) => {
                self.record(ICookieJar::isAllowedMemberCall::SIGNATURE)?;
                ICookieJar::isAllowedMemberCall::abi_encode_returns(&(self
                    .member(c.member)
                    .is_some(),))
            }
            ICookieJarCalls::isPaused(_) => {
                self.record(ICookieJar::isPausedCall::SIGNATURE)?;
                ICookieJar::isPausedCall::abi_encode_returns(&(self.snapshot.paused,))
            }
            ICookieJarCalls::WITHDRAWAL_AMOUNT(_) => {
                self.record(ICookieJar::WITHDRAWAL_AMOUNTCall::SIGNATURE)?;
                let amount = U256::from(self.snapshot.withdrawal_amount);
                ICookieJar::WITHDRAWAL_AMOUNTCall::abi_encode_returns(&(amount,))
            }
            ICookieJarCalls::MOONSHOTBOT_CONTRACT(_) => {
                self.record(ICookieJar::MOONSHOTBOT_CONTRACTCall::SIGNATURE)?;
                ICookieJar::MOONSHOTBOT_CONTRACTCall::abi_encode_returns(&(self
                    .snapshot
                    .collection,))
            }
            ICookieJarCalls::getNFTsForAddress(c) => {
                self.record(ICookieJar::getNFTsForAddressCall::SIGNATURE)?;
                let start = index(c.start);
                let end = index(c.end);
                let ids: Vec<U256> = self
                    .owned_by(c.owner)
                    .skip(start)
                    .take(end.saturating_sub(start))
                    .map(|t| U256::from(t.id))
                    .collect();
                ICookieJar::getNFTsForAddressCall::abi_encode_returns(&(ids,))
            }
            ICookieJarCalls::getRemainingTime(_) => {
                self.record(ICookieJar::getRemainingTimeCall::SIGNATURE)?;
                let remaining = from
                    .and_then(|account| self.member(account))
                    .map_or(0, |m| m.remaining_time);
                ICookieJar::getRemainingTimeCall::abi_encode_returns(&(U256::from(remaining),))
            }
            ICookieJarCalls::getRemainingTimeForNFT(c) => {
                self.record(ICookieJar::getRemainingTimeForNFTCall::SIGNATURE)?;
                let remaining = self
                    .snapshot
                    .tokens
                    .iter()
                    .find(|t| U256::from(t.id) == c.tokenId)
                    .map_or(0, |t| t.remaining_time);
                ICookieJar::getRemainingTimeForNFTCall::abi_encode_returns(&(U256::from(
                    remaining,
                ),))
            }
            ICookieJarCalls::withdrawAsWhitelisted(_) | ICookieJarCalls::withdrawWithNFT(_) => {
                // Writes are never served as reads.
                return Err(CallError::Reverted(
                    ICookieJar::NotAllowedMember {}.abi_encode().into(),
                ));
            }
        };
        Ok(output)
    }

    fn collection_call(&self, data: &[u8]) -> Result<Vec<u8>, CallError> {
        let ICollectionCalls::balanceOf(c) = ICollectionCalls::abi_decode(data, true)
            .map_err(|e| CallError::Other(format!("unknown collection call: {e}")))?;
        self.record(ICollection::balanceOfCall::SIGNATURE)?;
        let balance = U256::from(self.owned_by(c.owner).count());
        Ok(ICollection::balanceOfCall::abi_encode_returns(&(balance,)))
    }
}

impl ContractCaller for MemoryChain {
    async fn call(
        &self,
        to: Address,
        from: Option<Address>,
        data: Bytes,
    ) -> Result<Bytes, CallError> {
        let output = if to == self.snapshot.jar {
            self.jar_call(from, &data)?
        } else if to == self.snapshot.collection {
            self.collection_call(&data)?
        } else {
            return Err(CallError::Other(format!("no contract deployed at {to}")));
        };
        Ok(output.into())
    }
}

fn index(value: U256) -> usize {
    usize::try_from(u64::try_from(value).unwrap_or(u64::MAX)).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::CookieJar;
    use alloy_primitives::address;

    const JAR: Address = address!("00000000000000000000000000000000000000aa");
    const COLLECTION: Address = address!("00000000000000000000000000000000000000bb");
    const HOLDER: Address = address!("0000000000000000000000000000000000000001");

    fn chain() -> MemoryChain {
        MemoryChain::from_json(&format!(
            r#"{{
                "jar": "{JAR}",
                "collection": "{COLLECTION}",
                "withdrawal_amount": 100000000000000000,
                "tokens": [
                    {{ "id": 3, "owner": "{HOLDER}" }},
                    {{ "id": 17, "owner": "{HOLDER}", "remaining_time": 60 }}
                ]
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn serves_reads_through_the_abi() {
        let chain = chain();
        let jar = CookieJar::new(JAR, &chain);

        assert!(!jar.is_paused().await.unwrap());
        assert_eq!(jar.collection().await.unwrap(), COLLECTION);
        assert_eq!(jar.balance_of(COLLECTION, HOLDER).await.unwrap(), U256::from(2));
        assert_eq!(
            jar.nfts_for_address(HOLDER, U256::ZERO, U256::from(2)).await.unwrap(),
            vec![U256::from(3), U256::from(17)]
        );
        assert_eq!(
            jar.remaining_time_for_nft(U256::from(17)).await.unwrap().as_secs(),
            60
        );
    }

    #[tokio::test]
    async fn unknown_target_is_an_error() {
        let chain = chain();
        let jar = CookieJar::new(HOLDER, &chain);
        let err = jar.is_paused().await.unwrap_err();
        assert!(err.to_string().starts_with("no contract deployed at"));
    }

    #[tokio::test]
    async fn injected_failures_are_recorded() {
        let chain = chain();
        chain.fail_on("isPaused()");
        let jar = CookieJar::new(JAR, &chain);
        assert_eq!(
            jar.is_paused().await.unwrap_err(),
            CallError::Other("isPaused() failed: connection refused".into())
        );
        assert_eq!(chain.calls(), vec!["isPaused()"]);

        chain.recover("isPaused()");
        assert!(!jar.is_paused().await.unwrap());
    }
}
