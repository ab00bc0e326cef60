//! Stellar signature verification
//!
//! Verifies ed25519 signatures from Stellar wallets. Account IDs arrive in
//! StrKey form (`G...`): base32 of a version byte, the 32-byte key and a
//! CRC16-XModem checksum.

use base32::Alphabet;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

/// StrKey version byte for ed25519 account IDs (renders as `G`)
const ACCOUNT_ID_VERSION_BYTE: u8 = 6 << 3;

/// Length of a canonical account ID: 35 bytes in unpadded base32
const ACCOUNT_ID_LENGTH: usize = 56;

/// Errors that can occur during signature verification
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid Stellar address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address checksum")]
    InvalidChecksum,

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Verifies a raw signature over a message under a ledger account's key
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &str, message: &[u8], signature: &[u8])
        -> Result<(), CryptoError>;
}

/// Ed25519 verifier for Stellar account IDs
#[derive(Debug, Clone, Copy, Default)]
pub struct StellarSignatureVerifier;

impl SignatureVerifier for StellarSignatureVerifier {
    fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        verify_stellar_signature(public_key, message, signature)
    }
}

/// Verify a Stellar wallet signature
///
/// # Arguments
/// * `public_key` - Stellar G-address (e.g., "GABC...")
/// * `message` - The message that was signed
/// * `signature` - Raw 64-byte ed25519 signature
pub fn verify_stellar_signature(
    public_key: &str,
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let public_key_bytes = decode_account_id(public_key)?;

    let signature = Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(&public_key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Decode a Stellar account ID (G-address) into its raw ed25519 key
pub fn decode_account_id(address: &str) -> Result<[u8; 32], CryptoError> {
    if !address.starts_with('G') {
        return Err(CryptoError::InvalidAddressFormat(
            "Stellar public keys must start with 'G'".to_string(),
        ));
    }

    // base32 silently drops trailing bits, so extra characters would
    // otherwise decode to the same key
    if address.len() != ACCOUNT_ID_LENGTH {
        return Err(CryptoError::InvalidAddressFormat(format!(
            "Expected {} characters, got {}",
            ACCOUNT_ID_LENGTH,
            address.len()
        )));
    }

    let decoded = base32::decode(Alphabet::Rfc4648 { padding: false }, address)
        .ok_or_else(|| CryptoError::InvalidAddressFormat("Invalid base32 encoding".to_string()))?;

    // 1 version byte + 32 key bytes + 2 checksum bytes
    if decoded.len() != 35 {
        return Err(CryptoError::InvalidAddressFormat(format!(
            "Expected 35 bytes, got {}",
            decoded.len()
        )));
    }

    if decoded[0] != ACCOUNT_ID_VERSION_BYTE {
        return Err(CryptoError::InvalidAddressFormat(format!(
            "Unexpected version byte {:#04x}",
            decoded[0]
        )));
    }

    let (payload, checksum) = decoded.split_at(33);
    if checksum != crc16_xmodem(payload) {
        return Err(CryptoError::InvalidChecksum);
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&payload[1..]);

    Ok(public_key)
}

/// Encode a raw ed25519 key as a Stellar account ID (G-address)
pub fn encode_account_id(public_key: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(35);
    payload.push(ACCOUNT_ID_VERSION_BYTE);
    payload.extend_from_slice(public_key);
    let checksum = crc16_xmodem(&payload);
    payload.extend_from_slice(&checksum);

    base32::encode(Alphabet::Rfc4648 { padding: false }, &payload)
}

/// Calculate CRC16-XModem checksum (used by Stellar), little-endian
fn crc16_xmodem(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0;

    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }

    crc.to_le_bytes()
}
