//! Typed access to the cookie jar over injected read and write facilities.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::SolCall;
use log::debug;

use crate::abi::{ICollection, ICookieJar};
use crate::error::CallError;

/// Read-only contract calls (`eth_call`).
#[allow(async_fn_in_trait)]
pub trait ContractCaller {
    /// Call `to` with ABI `data`, optionally as `from`, returning raw return data.
    async fn call(&self, to: Address, from: Option<Address>, data: Bytes)
        -> Result<Bytes, CallError>;
}

impl<T: ContractCaller> ContractCaller for &T {
    async fn call(
        &self,
        to: Address,
        from: Option<Address>,
        data: Bytes,
    ) -> Result<Bytes, CallError> {
        (**self).call(to, from, data).await
    }
}

/// Signs and submits transactions; resolves once the transaction settles.
#[allow(async_fn_in_trait)]
pub trait TransactionSender {
    async fn send(&self, request: &WriteRequest) -> Result<TxHash, CallError>;
}

/// A withdrawal call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Withdrawal {
    Whitelisted { note: String },
    WithNft { note: String, token_id: U256 },
}

impl Withdrawal {
    pub fn function_name(&self) -> &'static str {
        match self {
            Withdrawal::Whitelisted { .. } => "withdrawAsWhitelisted",
            Withdrawal::WithNft { .. } => "withdrawWithNFT",
        }
    }

    pub fn note(&self) -> &str {
        match self {
            Withdrawal::Whitelisted { note } | Withdrawal::WithNft { note, .. } => note,
        }
    }

    /// Ordered call arguments, rendered as strings.
    pub fn args(&self) -> Vec<String> {
        match self {
            Withdrawal::Whitelisted { note } => vec![note.clone()],
            Withdrawal::WithNft { note, token_id } => vec![note.clone(), token_id.to_string()],
        }
    }

    pub fn calldata(&self) -> Bytes {
        match self {
            Withdrawal::Whitelisted { note } => ICookieJar::withdrawAsWhitelistedCall {
                note: note.clone(),
            }
            .abi_encode()
            .into(),
            Withdrawal::WithNft { note, token_id } => ICookieJar::withdrawWithNFTCall {
                note: note.clone(),
                tokenId: *token_id,
            }
            .abi_encode()
            .into(),
        }
    }
}

/// A write handed to the [`TransactionSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub to: Address,
    pub from: Address,
    pub call: Withdrawal,
}

impl WriteRequest {
    pub fn function_name(&self) -> &'static str {
        self.call.function_name()
    }

    pub fn calldata(&self) -> Bytes {
        self.call.calldata()
    }
}

/// Cookie jar at `address`, read through `caller`.
#[derive(Debug, Clone)]
pub struct CookieJar<C> {
    address: Address,
    caller: C,
}

impl<C: ContractCaller> CookieJar<C> {
    pub fn new(address: Address, caller: C) -> Self {
        Self { address, caller }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    async fn read<T: SolCall>(
        &self,
        to: Address,
        from: Option<Address>,
        call: T,
    ) -> Result<T::Return, CallError> {
        debug!("eth_call {} on {to}", T::SIGNATURE);
        let output = self.caller.call(to, from, call.abi_encode().into()).await?;
        T::abi_decode_returns(&output, true).map_err(|e| {
            CallError::Other(format!("failed to decode {} output: {e}", T::SIGNATURE))
        })
    }

    pub async fn is_allowed_member(&self, member: Address) -> Result<bool, CallError> {
        let call = ICookieJar::isAllowedMemberCall { member };
        Ok(self.read(self.address, None, call).await?._0)
    }

    pub async fn is_paused(&self) -> Result<bool, CallError> {
        Ok(self.read(self.address, None, ICookieJar::isPausedCall {}).await?._0)
    }

    pub async fn withdrawal_amount(&self) -> Result<U256, CallError> {
        let call = ICookieJar::WITHDRAWAL_AMOUNTCall {};
        Ok(self.read(self.address, None, call).await?._0)
    }

    /// Address of the collection whose holders may claim.
    pub async fn collection(&self) -> Result<Address, CallError> {
        let call = ICookieJar::MOONSHOTBOT_CONTRACTCall {};
        Ok(self.read(self.address, None, call).await?._0)
    }

    pub async fn balance_of(&self, collection: Address, owner: Address) -> Result<U256, CallError> {
        let call = ICollection::balanceOfCall { owner };
        Ok(self.read(collection, None, call).await?._0)
    }

    pub async fn nfts_for_address(
        &self,
        owner: Address,
        start: U256,
        end: U256,
    ) -> Result<Vec<U256>, CallError> {
        let call = ICookieJar::getNFTsForAddressCall { owner, start, end };
        Ok(self.read(self.address, None, call).await?._0)
    }

    /// Whitelist cooldown for `account`; the contract keys it on the caller.
    pub async fn remaining_time(&self, account: Address) -> Result<Duration, CallError> {
        let call = ICookieJar::getRemainingTimeCall {};
        let seconds = self.read(self.address, Some(account), call).await?._0;
        Ok(to_duration(seconds))
    }

    pub async fn remaining_time_for_nft(&self, token_id: U256) -> Result<Duration, CallError> {
        let call = ICookieJar::getRemainingTimeForNFTCall { tokenId: token_id };
        let seconds = self.read(self.address, None, call).await?._0;
        Ok(to_duration(seconds))
    }
}

fn to_duration(seconds: U256) -> Duration {
    Duration::from_secs(u64::try_from(seconds).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_withdrawal_takes_only_the_note() {
        let call = Withdrawal::Whitelisted {
            note: "cookies keep me going every day".into(),
        };
        assert_eq!(call.function_name(), "withdrawAsWhitelisted");
        assert_eq!(call.args(), vec!["cookies keep me going every day".to_string()]);

        let data = call.calldata();
        assert_eq!(data[..4], ICookieJar::withdrawAsWhitelistedCall::SELECTOR);
        let decoded = ICookieJar::withdrawAsWhitelistedCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.note, "cookies keep me going every day");
    }

    #[test]
    fn nft_withdrawal_carries_note_and_token() {
        let call = Withdrawal::WithNft {
            note: "a note that is long enough".into(),
            token_id: U256::from(17),
        };
        assert_eq!(call.function_name(), "withdrawWithNFT");
        assert_eq!(
            call.args(),
            vec!["a note that is long enough".to_string(), "17".to_string()]
        );

        let decoded = ICookieJar::withdrawWithNFTCall::abi_decode(&call.calldata(), true).unwrap();
        assert_eq!(decoded.tokenId, U256::from(17));
    }

    #[test]
    fn oversized_cooldowns_saturate() {
        assert_eq!(to_duration(U256::MAX), Duration::from_secs(u64::MAX));
        assert_eq!(to_duration(U256::from(90)), Duration::from_secs(90));
    }
}
