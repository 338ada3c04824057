//! Solidity bindings for the cookie jar and its NFT collection.

use alloy_sol_types::{sol, SolCall};

sol! {
    interface ICookieJar {
        error ContractIsPaused();
        error NotAllowedMember();
        error NFTHoldersCannotUseWhitelist();
        error NotNFTOwner();
        error WithdrawalTooSoon(uint256 remaining);
        error NoteTooShort();
        error NoteTooLong();
        error InsufficientJarBalance();

        function isAllowedMember(address member) external view returns (bool);
        function isPaused() external view returns (bool);
        function WITHDRAWAL_AMOUNT() external view returns (uint256);
        function MOONSHOTBOT_CONTRACT() external view returns (address);
        function getNFTsForAddress(address owner, uint256 start, uint256 end) external view returns (uint256[]);
        function getRemainingTime() external view returns (uint256);
        function getRemainingTimeForNFT(uint256 tokenId) external view returns (uint256);
        function withdrawAsWhitelisted(string note) external;
        function withdrawWithNFT(string note, uint256 tokenId) external;
    }

    interface ICollection {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Signature and selector of every cookie jar entry point, in declaration order.
pub fn jar_functions() -> Vec<(&'static str, [u8; 4])> {
    use ICookieJar::*;

    vec![
        entry::<isAllowedMemberCall>(),
        entry::<isPausedCall>(),
        entry::<WITHDRAWAL_AMOUNTCall>(),
        entry::<MOONSHOTBOT_CONTRACTCall>(),
        entry::<getNFTsForAddressCall>(),
        entry::<getRemainingTimeCall>(),
        entry::<getRemainingTimeForNFTCall>(),
        entry::<withdrawAsWhitelistedCall>(),
        entry::<withdrawWithNFTCall>(),
    ]
}

fn entry<C: SolCall>() -> (&'static str, [u8; 4]) {
    (C::SIGNATURE, C::SELECTOR)
}

/// Hex form of a selector, `0x`-prefixed.
pub fn selector_hex(selector: [u8; 4]) -> String {
    format!("0x{}", hex::encode(selector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_signatures() {
        assert_eq!(
            ICookieJar::withdrawAsWhitelistedCall::SIGNATURE,
            "withdrawAsWhitelisted(string)"
        );
        assert_eq!(
            ICookieJar::withdrawWithNFTCall::SIGNATURE,
            "withdrawWithNFT(string,uint256)"
        );
    }

    #[test]
    fn balance_of_selector_matches_erc721() {
        assert_eq!(selector_hex(ICollection::balanceOfCall::SELECTOR), "0x70a08231");
    }

    #[test]
    fn lists_every_jar_function() {
        let functions = jar_functions();
        assert_eq!(functions.len(), 9);
        assert_eq!(functions[1].0, "isPaused()");
    }
}
