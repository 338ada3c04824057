//! Presentation snapshot of the controller.

use alloy_primitives::U256;

use crate::contract::ContractCaller;
use crate::controller::WithdrawalController;
use crate::eligibility::{nft_access, whitelist_access, ClaimPath, Ineligibility};
use crate::error::Error;
use crate::format::{format_ether, format_time_remaining};
use crate::note::note_counter;
use crate::wallet::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Whitelist,
    Nft,
}

/// Availability of one claim tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub enabled: bool,
    /// Shown in place of the claim form when the tab is unusable.
    pub advisory: Option<Ineligibility>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub headline: String,
    pub error: Option<String>,
    pub default_tab: Tab,
    pub whitelist: TabView,
    pub nft: TabView,
    pub tokens: Vec<U256>,
    pub selected: Option<U256>,
    /// Countdown for the active path, once known.
    pub time_remaining: Option<String>,
    pub note: String,
    pub note_counter: String,
    pub note_editable: bool,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    NotConnected { connecting: bool },
    Loading,
    Ready(Box<Panel>),
}

impl View {
    pub fn of<C: ContractCaller>(controller: &WithdrawalController<C>) -> Self {
        match controller.connection() {
            ConnectionState::Disconnected => return View::NotConnected { connecting: false },
            ConnectionState::Connecting => return View::NotConnected { connecting: true },
            ConnectionState::Connected(_) => {}
        }
        if controller.is_loading() {
            return View::Loading;
        }

        let flags = controller.flags();
        let owned = controller.owned_tokens();
        let pending = controller.transaction().is_pending();
        let cooldown = controller.cooldown();
        let waiting = cooldown.is_some_and(|c| !c.is_zero());

        let amount = controller.withdrawal_amount().unwrap_or_default();
        let mut headline = format!("Claim {} ETH monthly", format_ether(amount));
        if flags.is_paused {
            headline.push_str(" (Currently Paused)");
        }

        // A note problem takes the error slot over a stale read error.
        let error = controller
            .note_error()
            .map(|e| e.to_string())
            .or_else(|| controller.error().map(Error::to_string));

        let path = controller.claim_path();
        let submit_label = if pending {
            "Processing...".to_string()
        } else if waiting {
            "Waiting Period Active".to_string()
        } else {
            match path {
                Ok(ClaimPath::Nft(_)) => "Claim with NFT".to_string(),
                _ => "GOOOO EEEEEET! 🍪".to_string(),
            }
        };

        View::Ready(Box::new(Panel {
            headline,
            error,
            default_tab: if flags.is_whitelisted {
                Tab::Whitelist
            } else {
                Tab::Nft
            },
            whitelist: tab(whitelist_access(&flags, owned)),
            nft: tab(nft_access(owned)),
            tokens: owned.iter().copied().collect(),
            selected: controller.selected_token(),
            time_remaining: path
                .ok()
                .and(cooldown)
                .map(|c| format_time_remaining(c.as_secs())),
            note: controller.note().to_string(),
            note_counter: note_counter(controller.note(), controller.note_bounds()),
            note_editable: !pending && !waiting,
            submit_label,
            submit_enabled: controller.can_submit(),
            pending,
        }))
    }
}

fn tab(access: Result<(), Ineligibility>) -> TabView {
    TabView {
        enabled: access.is_ok(),
        advisory: access.err(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;
    use crate::config::ClientConfig;
    use alloy_primitives::{address, Address};

    const JAR: Address = address!("00000000000000000000000000000000000000aa");
    const HOLDER: Address = address!("0000000000000000000000000000000000000002");

    fn chain(paused: bool) -> MemoryChain {
        MemoryChain::from_json(&format!(
            r#"{{
                "jar": "{JAR}",
                "collection": "0x00000000000000000000000000000000000000bb",
                "paused": {paused},
                "withdrawal_amount": 100000000000000000,
                "members": [{{ "address": "{HOLDER}" }}],
                "tokens": [{{ "id": 3, "owner": "{HOLDER}", "remaining_time": 90 }}]
            }}"#
        ))
        .unwrap()
    }

    fn panel(view: View) -> Panel {
        match view {
            View::Ready(panel) => *panel,
            other => panic!("expected a ready panel, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnected_wallet_shows_connect_prompt() {
        let chain = chain(false);
        let mut controller = WithdrawalController::new(&ClientConfig::new(JAR), &chain);
        assert_eq!(View::of(&controller), View::NotConnected { connecting: false });

        controller.observe_account(ConnectionState::Connecting).await;
        assert_eq!(View::of(&controller), View::NotConnected { connecting: true });
    }

    #[tokio::test]
    async fn holder_sees_nft_tab_only() {
        let chain = chain(false);
        let mut controller = WithdrawalController::new(&ClientConfig::new(JAR), &chain);
        controller.observe_account(ConnectionState::Connected(HOLDER)).await;

        let panel = panel(View::of(&controller));
        assert_eq!(panel.headline, "Claim 0.1 ETH monthly");
        assert!(!panel.whitelist.enabled);
        assert_eq!(panel.whitelist.advisory, Some(Ineligibility::NftHolderOnWhitelist));
        assert!(panel.nft.enabled);
        assert_eq!(panel.tokens, vec![U256::from(3)]);
        assert_eq!(panel.time_remaining, None);

        controller.select_token(U256::from(3)).await.unwrap();
        let panel = self::panel(View::of(&controller));
        assert_eq!(panel.time_remaining.as_deref(), Some("1m 30s"));
        assert_eq!(panel.submit_label, "Waiting Period Active");
        assert!(!panel.note_editable);
        assert!(!panel.submit_enabled);
    }

    #[tokio::test]
    async fn paused_jar_is_flagged_in_headline() {
        let chain = chain(true);
        let mut controller = WithdrawalController::new(&ClientConfig::new(JAR), &chain);
        controller.observe_account(ConnectionState::Connected(HOLDER)).await;
        controller.edit_note("tiny");

        let panel = panel(View::of(&controller));
        assert!(panel.headline.ends_with("(Currently Paused)"));
        assert_eq!(panel.error.as_deref(), Some("Note must be at least 20 characters"));
        assert_eq!(panel.note_counter, "4/1000 characters");
    }
}
