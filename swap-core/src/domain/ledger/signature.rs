use crate::domain::ledger::hash::blake160;
use crate::foundation::{Hash32, Result, SwapError, BLAKE160_SIZE, SIGNATURE_SIZE};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};

/// blake160 of the compressed public key, as carried in lock args.
pub fn pubkey_hash(pubkey: &PublicKey) -> [u8; BLAKE160_SIZE] {
    blake160(&pubkey.serialize())
}

pub fn secret_key_hash(secret: &SecretKey) -> [u8; BLAKE160_SIZE] {
    pubkey_hash(&PublicKey::from_secret_key(SECP256K1, secret))
}

/// Recoverable signature laid out as 64 compact bytes followed by the recovery id.
pub fn sign_recoverable(secret: &SecretKey, message: &Hash32) -> [u8; SIGNATURE_SIZE] {
    let signature = SECP256K1.sign_ecdsa_recoverable(&Message::from_digest(*message), secret);
    let (recovery_id, compact) = signature.serialize_compact();
    let mut out = [0u8; SIGNATURE_SIZE];
    out[..64].copy_from_slice(&compact);
    out[64] = recovery_id.to_i32() as u8;
    out
}

pub fn recover_pubkey(signature: &[u8], message: &Hash32) -> Result<PublicKey> {
    if signature.len() != SIGNATURE_SIZE {
        return Err(SwapError::CryptoError {
            operation: "recover".to_string(),
            details: format!("signature must be {} bytes, got {}", SIGNATURE_SIZE, signature.len()),
        });
    }
    let recovery_id = RecoveryId::from_i32(i32::from(signature[64]))?;
    let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)?;
    Ok(SECP256K1.recover_ecdsa(&Message::from_digest(*message), &recoverable)?)
}

/// True when `signature` over `message` was produced by the key hashing to `expected`.
pub fn verify_pubkey_hash(signature: &[u8], message: &Hash32, expected: &[u8; BLAKE160_SIZE]) -> bool {
    recover_pubkey(signature, message).map(|pubkey| &pubkey_hash(&pubkey) == expected).unwrap_or(false)
}
