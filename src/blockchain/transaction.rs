//! Transaction construction and signing.
//!
//! # Responsibilities
//! - Build EIP-1559 transactions with explicit nonce, gas limit and fees
//! - Sign them and produce the raw EIP-2718 encoding a relay accepts
//! - Keep the metadata (hash, signer, nonce) needed to check inclusion later

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};

use crate::blockchain::types::BlockchainResult;
use crate::blockchain::wallet::Wallet;

/// Fields that vary between the bundled transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpec {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_limit: u64,
}

/// Fee fields shared by every transaction in a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeFields {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Build an unsigned EIP-1559 transaction.
pub fn eip1559(chain_id: u64, call: CallSpec, fees: FeeFields) -> TxEip1559 {
    TxEip1559 {
        chain_id,
        nonce: call.nonce,
        gas_limit: call.gas_limit,
        max_fee_per_gas: fees.max_fee_per_gas,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        to: TxKind::Call(call.to),
        value: call.value,
        access_list: Default::default(),
        input: call.input,
    }
}

/// A signed transaction ready for a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// EIP-2718 encoded signed transaction.
    pub raw: Bytes,
    /// Transaction hash.
    pub hash: TxHash,
    /// Signing account.
    pub signer: Address,
    /// Nonce the transaction consumes.
    pub nonce: u64,
}

/// Sign an EIP-1559 transaction with the given wallet.
pub fn sign_eip1559(wallet: &Wallet, mut tx: TxEip1559) -> BlockchainResult<SignedPayload> {
    let signature = wallet.sign_transaction(&mut tx)?;
    let nonce = tx.nonce;
    let signed = tx.into_signed(signature);
    let hash = *signed.hash();
    let envelope = TxEnvelope::from(signed);

    Ok(SignedPayload {
        raw: envelope.encoded_2718().into(),
        hash,
        signer: wallet.address(),
        nonce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::eips::eip2718::Decodable2718;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn call(nonce: u64) -> CallSpec {
        CallSpec {
            to: Address::repeat_byte(0x11),
            value: U256::from(1_000u64),
            input: Bytes::new(),
            nonce,
            gas_limit: 21_000,
        }
    }

    const FEES: FeeFields = FeeFields {
        max_fee_per_gas: 1_100_000_000,
        max_priority_fee_per_gas: 1_100_000_000,
    };

    #[test]
    fn test_eip1559_copies_fields() {
        let tx = eip1559(1, call(9), FEES);
        assert_eq!(tx.nonce, 9);
        assert_eq!(tx.chain_id, 1);
        assert_eq!(tx.gas_limit, 21_000);
        assert_eq!(tx.to, TxKind::Call(Address::repeat_byte(0x11)));
    }

    #[test]
    fn test_signed_payload_round_trips_through_envelope() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let payload = sign_eip1559(&wallet, eip1559(1, call(3), FEES)).unwrap();

        assert_eq!(payload.signer, wallet.address());
        assert_eq!(payload.nonce, 3);
        // type-2 envelope
        assert_eq!(payload.raw[0], 0x02);

        let decoded = TxEnvelope::decode_2718(&mut payload.raw.as_ref()).unwrap();
        assert_eq!(*decoded.tx_hash(), payload.hash);
    }
}
