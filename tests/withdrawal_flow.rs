use std::cell::RefCell;
use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use cookie_jar_client::{
    CallError, ClaimPath, ClientConfig, ConnectionState, ContractError, Error, MemoryChain,
    TransactionSender, TransactionState, View, WithdrawalController, WriteRequest,
};

const SNAPSHOT: &str = include_str!("../artifacts/chain.json");

/// Sender that records requests and settles each with its position as hash.
#[derive(Default)]
struct Wallet {
    sent: RefCell<Vec<WriteRequest>>,
}

impl TransactionSender for Wallet {
    async fn send(&self, request: &WriteRequest) -> Result<TxHash, CallError> {
        let mut sent = self.sent.borrow_mut();
        sent.push(request.clone());
        Ok(TxHash::with_last_byte(sent.len() as u8))
    }
}

fn account(last: u8) -> Address {
    Address::with_last_byte(last)
}

fn setup() -> anyhow::Result<(MemoryChain, ClientConfig)> {
    let chain = MemoryChain::from_json(SNAPSHOT)?;
    let config = ClientConfig::new(chain.snapshot().jar);
    Ok((chain, config))
}

#[tokio::test]
async fn whitelist_claim_end_to_end() -> anyhow::Result<()> {
    let (chain, config) = setup()?;
    let wallet = Wallet::default();
    let mut controller = WithdrawalController::new(&config, &chain);

    controller
        .observe_account(ConnectionState::Connected(account(1)))
        .await;
    assert_eq!(controller.claim_path(), Ok(ClaimPath::Whitelist));

    controller.edit_note("I would like one cookie, please");
    let hash = controller.submit(&wallet).await?;

    assert_eq!(hash, TxHash::with_last_byte(1));
    let sent = wallet.sent.borrow();
    assert_eq!(sent[0].function_name(), "withdrawAsWhitelisted");
    assert_eq!(sent[0].call.args(), vec!["I would like one cookie, please"]);
    Ok(())
}

#[tokio::test]
async fn nft_claim_end_to_end() -> anyhow::Result<()> {
    let (chain, config) = setup()?;
    let wallet = Wallet::default();
    let mut controller = WithdrawalController::new(&config, &chain);

    controller
        .observe_account(ConnectionState::Connected(account(2)))
        .await;
    controller.select_token(U256::from(17)).await?;
    controller.edit_note("thirty characters of cookie love");
    controller.submit(&wallet).await?;

    let sent = wallet.sent.borrow();
    assert_eq!(sent[0].function_name(), "withdrawWithNFT");
    assert_eq!(
        sent[0].call.args(),
        vec!["thirty characters of cookie love", "17"]
    );
    assert!(matches!(
        controller.transaction(),
        TransactionState::Settled(_)
    ));
    Ok(())
}

#[tokio::test]
async fn member_in_cooldown_cannot_submit() -> anyhow::Result<()> {
    let (chain, config) = setup()?;
    let wallet = Wallet::default();
    let mut controller = WithdrawalController::new(&config, &chain);

    controller
        .observe_account(ConnectionState::Connected(account(4)))
        .await;
    controller.edit_note("back again for another cookie");

    assert_eq!(
        controller.submit(&wallet).await,
        Err(Error::CooldownActive(Duration::from_secs(86_400)))
    );
    assert!(wallet.sent.borrow().is_empty());

    let View::Ready(panel) = View::of(&controller) else {
        panic!("expected a ready panel");
    };
    assert_eq!(panel.time_remaining.as_deref(), Some("1d 0h 0m 0s"));
    Ok(())
}

#[tokio::test]
async fn pause_overrides_every_other_condition() -> anyhow::Result<()> {
    let (mut chain, config) = setup()?;
    chain.snapshot_mut().paused = true;
    let wallet = Wallet::default();

    for (who, token) in [(account(1), None), (account(2), Some(17u64))] {
        let mut controller = WithdrawalController::new(&config, &chain);
        controller
            .observe_account(ConnectionState::Connected(who))
            .await;
        if let Some(token) = token {
            controller.select_token(U256::from(token)).await?;
        }
        controller.edit_note("a perfectly valid cookie request");

        assert!(!controller.can_submit());
        assert_eq!(
            controller.submit(&wallet).await,
            Err(Error::Contract(ContractError::ContractIsPaused))
        );
    }
    assert!(wallet.sent.borrow().is_empty());
    Ok(())
}
