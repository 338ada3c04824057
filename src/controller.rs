//! Eligibility and withdrawal controller.
//!
//! Holds the state observed for one connected account and turns user
//! actions into contract reads and a single withdrawal write.
//!
//! Every asynchronous load is split in three steps: a `begin_*` call that
//! hands out a [`RefreshTicket`], the load itself on [`CookieJar`], and an
//! `apply_*` call that commits the result. Tickets carry the account epoch
//! and a generation. Account changes bump the epoch; a new refresh bumps
//! the refresh generation and a token selection the cooldown generation,
//! so a response started before either is dropped on apply. Selecting a
//! token never invalidates an in-flight refresh.
//! The `refresh`, `select_token` and `submit` helpers run all three steps
//! back to back.

use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use log::{debug, info, warn};

use crate::config::ClientConfig;
use crate::contract::{ContractCaller, CookieJar, TransactionSender, Withdrawal, WriteRequest};
use crate::eligibility::{active_path, ClaimPath, EligibilityFlags, Ineligibility, OwnedTokens};
use crate::error::{CallError, ContractError, Error, Result};
use crate::note::{truncate_note, validate_note, NoteBounds, NoteError};
use crate::wallet::ConnectionState;

/// Lifecycle of the outbound withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    Pending,
    Settled(TxHash),
    Failed(String),
}

impl TransactionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TransactionState::Pending)
    }
}

/// Handle for one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    epoch: u64,
    generation: u64,
    account: Address,
    selected: Option<U256>,
}

impl RefreshTicket {
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn selected(&self) -> Option<U256> {
        self.selected
    }
}

/// Everything a full refresh reads for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilitySnapshot {
    pub flags: EligibilityFlags,
    pub withdrawal_amount: U256,
    pub owned: OwnedTokens,
    /// `None` when no timer applies to the account.
    pub cooldown: Option<Duration>,
}

impl<C: ContractCaller> CookieJar<C> {
    /// Read flags, owned tokens and the cooldown of the active path.
    ///
    /// The collection balance is read first; token enumeration only happens
    /// when it is non-zero.
    pub async fn load_eligibility(
        &self,
        ticket: &RefreshTicket,
    ) -> std::result::Result<EligibilitySnapshot, CallError> {
        let account = ticket.account;

        let is_paused = self.is_paused().await?;
        let is_whitelisted = self.is_allowed_member(account).await?;
        let withdrawal_amount = self.withdrawal_amount().await?;

        let collection = self.collection().await?;
        let balance = self.balance_of(collection, account).await?;
        let owned = if balance.is_zero() {
            OwnedTokens::default()
        } else {
            debug!("{account} holds {balance} tokens, enumerating");
            OwnedTokens::new(self.nfts_for_address(account, U256::ZERO, balance).await?)
        };

        let cooldown = if owned.is_empty() {
            if is_whitelisted {
                Some(self.remaining_time(account).await?)
            } else {
                None
            }
        } else {
            match ticket.selected.filter(|id| owned.contains(id)) {
                Some(id) => Some(self.remaining_time_for_nft(id).await?),
                None => None,
            }
        };

        Ok(EligibilitySnapshot {
            flags: EligibilityFlags {
                is_whitelisted,
                is_paused,
            },
            withdrawal_amount,
            owned,
            cooldown,
        })
    }

    /// Read the per-token cooldown for the ticket's selection.
    pub async fn load_cooldown(
        &self,
        ticket: &RefreshTicket,
    ) -> std::result::Result<Option<Duration>, CallError> {
        match ticket.selected {
            Some(id) => Ok(Some(self.remaining_time_for_nft(id).await?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug)]
pub struct WithdrawalController<C> {
    jar: CookieJar<C>,
    bounds: NoteBounds,
    connection: ConnectionState,
    flags: EligibilityFlags,
    withdrawal_amount: Option<U256>,
    owned: OwnedTokens,
    selected: Option<U256>,
    cooldown: Option<Duration>,
    note: String,
    note_error: Option<NoteError>,
    error: Option<Error>,
    loading: bool,
    tx: TransactionState,
    epoch: u64,
    refresh_generation: u64,
    cooldown_generation: u64,
}

impl<C: ContractCaller> WithdrawalController<C> {
    pub fn new(config: &ClientConfig, caller: C) -> Self {
        Self {
            jar: CookieJar::new(config.jar, caller),
            bounds: config.note_bounds,
            connection: ConnectionState::Disconnected,
            flags: EligibilityFlags::default(),
            withdrawal_amount: None,
            owned: OwnedTokens::default(),
            selected: None,
            cooldown: None,
            note: String::new(),
            note_error: None,
            error: None,
            loading: false,
            tx: TransactionState::Idle,
            epoch: 0,
            refresh_generation: 0,
            cooldown_generation: 0,
        }
    }

    pub fn jar(&self) -> &CookieJar<C> {
        &self.jar
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn flags(&self) -> EligibilityFlags {
        self.flags
    }

    pub fn withdrawal_amount(&self) -> Option<U256> {
        self.withdrawal_amount
    }

    pub fn owned_tokens(&self) -> &OwnedTokens {
        &self.owned
    }

    pub fn selected_token(&self) -> Option<U256> {
        self.selected
    }

    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn note_bounds(&self) -> NoteBounds {
        self.bounds
    }

    /// Advisory validation error for the current note.
    pub fn note_error(&self) -> Option<NoteError> {
        self.note_error
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn transaction(&self) -> &TransactionState {
        &self.tx
    }

    /// React to a wallet connection change.
    ///
    /// A new account drops every piece of state derived from the previous
    /// one and, once connected, loads its eligibility.
    pub async fn observe_account(&mut self, state: ConnectionState) {
        if state == self.connection {
            return;
        }
        debug!("connection changed: {:?} -> {:?}", self.connection, state);
        self.reset_account(state);
        if state.is_connected() {
            self.refresh().await;
        }
    }

    fn reset_account(&mut self, state: ConnectionState) {
        self.connection = state;
        self.epoch += 1;
        self.flags = EligibilityFlags::default();
        self.withdrawal_amount = None;
        self.owned = OwnedTokens::default();
        self.selected = None;
        self.cooldown = None;
        self.note.clear();
        self.note_error = None;
        self.error = None;
        self.loading = false;
    }

    /// Start a full eligibility load. `None` while disconnected.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        let account = self.connection.account()?;
        self.refresh_generation += 1;
        self.loading = true;
        Some(RefreshTicket {
            epoch: self.epoch,
            generation: self.refresh_generation,
            account,
            selected: self.selected,
        })
    }

    /// Commit a full load. Returns `false` when the ticket is stale.
    pub fn apply_eligibility(
        &mut self,
        ticket: RefreshTicket,
        result: std::result::Result<EligibilitySnapshot, CallError>,
    ) -> bool {
        if !self.is_current(&ticket, self.refresh_generation) {
            return false;
        }
        self.loading = false;

        match result {
            Ok(snapshot) => {
                debug!(
                    "eligibility for {}: whitelisted={} paused={} tokens={}",
                    ticket.account,
                    snapshot.flags.is_whitelisted,
                    snapshot.flags.is_paused,
                    snapshot.owned.len()
                );
                self.flags = snapshot.flags;
                self.withdrawal_amount = Some(snapshot.withdrawal_amount);
                if self.selected.is_some_and(|id| !snapshot.owned.contains(&id)) {
                    self.selected = None;
                    self.cooldown = None;
                }
                self.owned = snapshot.owned;
                // A selection made after the ticket owns the cooldown.
                if ticket.selected == self.selected {
                    self.cooldown = snapshot.cooldown;
                }
                self.error = None;
            }
            Err(err) => {
                warn!("eligibility read for {} failed: {err}", ticket.account);
                self.error = Some(Error::Read(err.to_string()));
            }
        }
        true
    }

    pub async fn refresh(&mut self) {
        if let Some(ticket) = self.begin_refresh() {
            let result = self.jar.load_eligibility(&ticket).await;
            self.apply_eligibility(ticket, result);
        }
    }

    /// Switch the NFT claim to `token_id` and start loading its cooldown.
    ///
    /// Returns `Ok(None)` without touching state while a transaction is
    /// pending.
    pub fn begin_select_token(&mut self, token_id: U256) -> Result<Option<RefreshTicket>> {
        if self.tx.is_pending() {
            debug!("ignoring selection of #{token_id} while a transaction is pending");
            return Ok(None);
        }
        let account = self.connection.account().ok_or(Error::NotConnected)?;
        if !self.owned.contains(&token_id) {
            let err = Error::TokenNotOwned(token_id);
            self.error = Some(err.clone());
            return Err(err);
        }

        self.selected = Some(token_id);
        self.cooldown = None;
        self.error = None;
        self.cooldown_generation += 1;
        Ok(Some(RefreshTicket {
            epoch: self.epoch,
            generation: self.cooldown_generation,
            account,
            selected: Some(token_id),
        }))
    }

    /// Commit a cooldown load. Returns `false` when the ticket is stale.
    pub fn apply_cooldown(
        &mut self,
        ticket: RefreshTicket,
        result: std::result::Result<Option<Duration>, CallError>,
    ) -> bool {
        if !self.is_current(&ticket, self.cooldown_generation) {
            return false;
        }
        match result {
            Ok(cooldown) => {
                self.cooldown = cooldown;
                self.error = None;
            }
            Err(err) => {
                warn!("cooldown read for {:?} failed: {err}", ticket.selected);
                self.error = Some(Error::Read(err.to_string()));
            }
        }
        true
    }

    pub async fn select_token(&mut self, token_id: U256) -> Result<()> {
        if let Some(ticket) = self.begin_select_token(token_id)? {
            let result = self.jar.load_cooldown(&ticket).await;
            self.apply_cooldown(ticket, result);
        }
        Ok(())
    }

    fn is_current(&self, ticket: &RefreshTicket, generation: u64) -> bool {
        let current = ticket.epoch == self.epoch
            && ticket.generation == generation
            && self.connection.account() == Some(ticket.account);
        if !current {
            warn!(
                "dropping stale response for {} (epoch {}/{}, generation {}/{})",
                ticket.account, ticket.epoch, self.epoch, ticket.generation, generation
            );
        }
        current
    }

    /// Replace the note. Text past the upper bound is cut off; an invalid
    /// note only sets the advisory error. Ignored while a transaction is
    /// pending.
    pub fn edit_note(&mut self, raw: &str) {
        if self.tx.is_pending() {
            debug!("ignoring note edit while a transaction is pending");
            return;
        }
        let note = truncate_note(raw, self.bounds.max);
        self.note_error = validate_note(note, self.bounds).error;
        self.note = note.to_string();
    }

    /// The path a submission would take, if any.
    pub fn claim_path(&self) -> std::result::Result<ClaimPath, Ineligibility> {
        active_path(&self.flags, &self.owned, self.selected)
    }

    /// Check every submission precondition, producing the call to send.
    pub fn check_submission(&self) -> Result<Withdrawal> {
        if !self.connection.is_connected() {
            return Err(Error::NotConnected);
        }
        if self.tx.is_pending() {
            return Err(Error::TransactionPending);
        }
        if self.flags.is_paused {
            return Err(Error::Contract(ContractError::ContractIsPaused));
        }
        if let Some(err) = validate_note(&self.note, self.bounds).error {
            return Err(Error::InvalidNote(err));
        }
        let path = self.claim_path().map_err(Error::Ineligible)?;
        match self.cooldown {
            None => return Err(Error::CooldownUnknown),
            Some(remaining) if !remaining.is_zero() => {
                return Err(Error::CooldownActive(remaining))
            }
            Some(_) => {}
        }

        let note = self.note.clone();
        Ok(match path {
            ClaimPath::Whitelist => Withdrawal::Whitelisted { note },
            ClaimPath::Nft(token_id) => Withdrawal::WithNft { note, token_id },
        })
    }

    pub fn can_submit(&self) -> bool {
        self.check_submission().is_ok()
    }

    /// Validate and mark the withdrawal pending.
    ///
    /// On a failed precondition the error is stored and nothing is sent.
    pub fn begin_submit(&mut self) -> Result<WriteRequest> {
        let call = match self.check_submission() {
            Ok(call) => call,
            Err(err) => {
                self.error = Some(err.clone());
                return Err(err);
            }
        };
        let from = self.connection.account().ok_or(Error::NotConnected)?;

        info!(
            "submitting {} for {from} with args {:?}",
            call.function_name(),
            call.args()
        );
        self.error = None;
        self.tx = TransactionState::Pending;
        Ok(WriteRequest {
            to: self.jar.address(),
            from,
            call,
        })
    }

    pub fn finish_submit(
        &mut self,
        result: std::result::Result<TxHash, CallError>,
    ) -> Result<TxHash> {
        match result {
            Ok(hash) => {
                info!("withdrawal settled in {hash}");
                self.tx = TransactionState::Settled(hash);
                self.note.clear();
                self.note_error = None;
                // The claim restarted the timer; unknown until reloaded.
                self.cooldown = None;
                Ok(hash)
            }
            Err(err) => {
                let err = Error::from_write(err);
                warn!("withdrawal failed: {err}");
                self.tx = TransactionState::Failed(err.to_string());
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn submit<S: TransactionSender>(&mut self, sender: &S) -> Result<TxHash> {
        let request = self.begin_submit()?;
        let result = sender.send(&request).await;
        let hash = self.finish_submit(result)?;
        self.refresh().await;
        Ok(hash)
    }
}
