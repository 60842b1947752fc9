use alloy::primitives::{Address, Signature, U256};

use crate::error::ApiError;

/// Recover the EIP-191 signer of a personal-sign message.
///
/// Accepts the 65-byte r||s||v encoding wallets produce, hex with or
/// without the 0x prefix. Both legacy (27/28) and raw (0/1) recovery
/// ids are accepted.
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<Address, ApiError> {
    let raw = signature_hex.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(raw).map_err(|_| ApiError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(ApiError::InvalidSignature);
    }

    let parity = match bytes[64] {
        0 | 27 => false,
        1 | 28 => true,
        _ => return Err(ApiError::InvalidSignature),
    };
    let r = U256::from_be_slice(&bytes[..32]);
    let s = U256::from_be_slice(&bytes[32..64]);

    Signature::new(r, s, parity)
        .recover_address_from_msg(message)
        .map_err(|_| ApiError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    const MESSAGE: &str =
        "Sign this message to authenticate with the Wallet Risk API: 0xabc:nonce";

    #[test]
    fn test_recovers_the_signing_key() {
        let signer = PrivateKeySigner::random();
        let signature = signer.sign_message_sync(MESSAGE.as_bytes()).unwrap();
        let encoded = format!("0x{}", hex::encode(signature.as_bytes()));

        let recovered = recover_signer(MESSAGE, &encoded).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_accepts_both_recovery_id_forms() {
        let signer = PrivateKeySigner::random();
        let signature = signer.sign_message_sync(MESSAGE.as_bytes()).unwrap();

        // Flip between the legacy 27/28 and raw 0/1 conventions
        let mut bytes = signature.as_bytes();
        bytes[64] = if bytes[64] >= 27 {
            bytes[64] - 27
        } else {
            bytes[64] + 27
        };
        let encoded = hex::encode(bytes);

        let recovered = recover_signer(MESSAGE, &encoded).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_wrong_message_recovers_different_address() {
        let signer = PrivateKeySigner::random();
        let signature = signer.sign_message_sync(MESSAGE.as_bytes()).unwrap();
        let encoded = hex::encode(signature.as_bytes());

        let recovered = recover_signer("a different message", &encoded).unwrap();
        assert_ne!(recovered, signer.address());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(recover_signer(MESSAGE, "0xzz").is_err());
        assert!(recover_signer(MESSAGE, "0x1234").is_err());
        assert!(recover_signer(MESSAGE, "").is_err());
    }
}
