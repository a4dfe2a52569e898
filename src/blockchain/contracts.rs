//! Contract call encodings used by the rescue bundle.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Merkle airdrop distributor.
    interface IMerkleDistributor {
        function claim(uint256 index, address account, uint256 amount, bytes32[] calldata merkleProof) external;
    }

    /// Minimal ERC-20 surface.
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Calldata for `claim(index, account, amount, proof)`.
pub fn encode_claim(index: U256, account: Address, amount: U256, proof: &[B256]) -> Bytes {
    IMerkleDistributor::claimCall {
        index,
        account,
        amount,
        merkleProof: proof.to_vec(),
    }
    .abi_encode()
    .into()
}

/// Calldata for ERC-20 `transfer(to, amount)`.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Calldata for ERC-20 `balanceOf(account)`.
pub fn encode_balance_of(account: Address) -> Bytes {
    IERC20::balanceOfCall { account }.abi_encode().into()
}

/// Decode a `uint256` return word.
pub fn decode_uint_word(data: &[u8]) -> Option<U256> {
    if data.len() != 32 {
        return None;
    }
    Some(U256::from_be_slice(data))
}
