//! Algorand key material: mnemonics, secret keys and addresses.
//!
//! A 25-word mnemonic packs the 32-byte ed25519 seed little-endian into 24
//! eleven-bit word indices followed by one checksum word taken from
//! SHA-512/256 of the seed. Addresses and secrets are unpadded base32.

use bip39::Language;
use data_encoding::BASE32_NOPAD;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512_256};

use crate::domain::KeyError;
use crate::domain::algo::AlgoWallet;

const SEED_LENGTH: usize = 32;
const MNEMONIC_WORDS: usize = 25;
const CHECKSUM_LENGTH: usize = 4;

fn to_u11(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len() * 8 / 11 + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &byte in bytes {
        buffer |= u32::from(byte) << bits;
        bits += 8;
        if bits >= 11 {
            out.push((buffer & 0x7ff) as u16);
            buffer >>= 11;
            bits -= 11;
        }
    }
    if bits != 0 {
        out.push((buffer & 0x7ff) as u16);
    }
    out
}

fn to_u8(words: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 11 / 8 + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &word in words {
        buffer |= u32::from(word) << bits;
        bits += 11;
        while bits >= 8 {
            out.push((buffer & 0xff) as u8);
            buffer >>= 8;
            bits -= 8;
        }
    }
    if bits != 0 {
        out.push((buffer & 0xff) as u8);
    }
    out
}

fn checksum_word(seed: &[u8]) -> u16 {
    let hash = Sha512_256::digest(seed);
    to_u11(&hash[..2])[0]
}

/// Encode a seed as a 25-word mnemonic
#[must_use]
pub fn seed_to_mnemonic(seed: &[u8; SEED_LENGTH]) -> String {
    let list = Language::English.word_list();
    let mut words: Vec<&str> = to_u11(seed).iter().map(|&i| list[i as usize]).collect();
    words.push(list[checksum_word(seed) as usize]);
    words.join(" ")
}

/// Decode a 25-word mnemonic back into its seed
pub fn mnemonic_to_seed(mnemonic: &str) -> Result<[u8; SEED_LENGTH], KeyError> {
    let list = Language::English.word_list();
    let words: Vec<&str> = mnemonic.split_whitespace().collect();
    if words.len() != MNEMONIC_WORDS {
        return Err(KeyError::Mnemonic(format!(
            "Mnemonic must have {MNEMONIC_WORDS} words"
        )));
    }

    let indices = words
        .iter()
        .map(|word| {
            let word = word.to_lowercase();
            list.iter()
                .position(|candidate| *candidate == word)
                .map(|i| i as u16)
                .ok_or_else(|| KeyError::Mnemonic(format!("Unknown mnemonic word '{word}'")))
        })
        .collect::<Result<Vec<u16>, _>>()?;

    let (checksum, key_words) = indices
        .split_last()
        .ok_or_else(|| KeyError::Mnemonic("Mnemonic is empty".to_string()))?;
    let bytes = to_u8(key_words);
    // 24 words carry 264 bits; the last byte must be padding
    if bytes.len() != SEED_LENGTH + 1 || bytes[SEED_LENGTH] != 0 {
        return Err(KeyError::Mnemonic(
            "Mnemonic does not encode a valid key".to_string(),
        ));
    }

    let mut seed = [0u8; SEED_LENGTH];
    seed.copy_from_slice(&bytes[..SEED_LENGTH]);
    if checksum_word(&seed) != *checksum {
        return Err(KeyError::Mnemonic("Mnemonic checksum mismatch".to_string()));
    }
    Ok(seed)
}

/// Address of an ed25519 public key
#[must_use]
pub fn encode_address(public_key: &[u8; 32]) -> String {
    let hash = Sha512_256::digest(public_key);
    let mut bytes = Vec::with_capacity(32 + CHECKSUM_LENGTH);
    bytes.extend_from_slice(public_key);
    bytes.extend_from_slice(&hash[hash.len() - CHECKSUM_LENGTH..]);
    BASE32_NOPAD.encode(&bytes)
}

/// Public key of an address, verifying its checksum
pub fn decode_address(address: &str) -> Result<[u8; 32], KeyError> {
    let bytes = BASE32_NOPAD
        .decode(address.as_bytes())
        .map_err(|e| KeyError::Address(e.to_string()))?;
    if bytes.len() != 32 + CHECKSUM_LENGTH {
        return Err(KeyError::Address("Address has an invalid length".to_string()));
    }
    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&bytes[..32]);
    if encode_address(&public_key) != address {
        return Err(KeyError::Address("Address checksum mismatch".to_string()));
    }
    Ok(public_key)
}

fn secret_of(key: &SigningKey) -> SecretString {
    SecretString::from(BASE32_NOPAD.encode(&key.to_keypair_bytes()))
}

fn wallet_of(key: &SigningKey) -> AlgoWallet {
    AlgoWallet {
        address: encode_address(key.verifying_key().as_bytes()),
        secret: secret_of(key).expose_secret().to_string(),
    }
}

/// Wallet from a mnemonic, or from fresh randomness when none is given
pub fn generate_wallet(mnemonic: Option<&str>) -> Result<AlgoWallet, KeyError> {
    let key = match mnemonic {
        Some(mnemonic) => SigningKey::from_bytes(&mnemonic_to_seed(mnemonic)?),
        None => SigningKey::generate(&mut OsRng),
    };
    Ok(wallet_of(&key))
}

/// Signing key of a base32 secret (seed followed by public key)
pub fn signing_key_from_secret(secret: &SecretString) -> Result<SigningKey, KeyError> {
    let bytes = BASE32_NOPAD
        .decode(secret.expose_secret().as_bytes())
        .map_err(|e| KeyError::Secret(e.to_string()))?;
    let keypair: [u8; 64] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::Secret("Secret key must be 64 bytes".to_string()))?;
    SigningKey::from_keypair_bytes(&keypair)
        .map_err(|_| KeyError::Secret("Secret key does not match its public key".to_string()))
}

pub fn address_from_secret(secret: &SecretString) -> Result<String, KeyError> {
    let key = signing_key_from_secret(secret)?;
    Ok(encode_address(key.verifying_key().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(fill: u8) -> [u8; 32] {
        let mut seed = [0u8; 32];
        for (i, b) in seed.iter_mut().enumerate() {
            *b = fill.wrapping_add(i as u8);
        }
        seed
    }

    #[test]
    fn test_mnemonic_round_trip() {
        let seed = seed(7);
        let mnemonic = seed_to_mnemonic(&seed);
        assert_eq!(mnemonic.split(' ').count(), 25);
        assert_eq!(mnemonic_to_seed(&mnemonic).unwrap(), seed);
    }

    #[test]
    fn test_zero_seed_mnemonic() {
        let mnemonic = seed_to_mnemonic(&[0u8; 32]);
        let words: Vec<&str> = mnemonic.split(' ').collect();
        assert!(words[..24].iter().all(|w| *w == "abandon"));
        assert_eq!(mnemonic_to_seed(&mnemonic).unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_mnemonic_checksum_is_verified() {
        let mnemonic = seed_to_mnemonic(&seed(1));
        let mut words: Vec<&str> = mnemonic.split(' ').collect();
        let last = words[24];
        words[24] = if last == "zoo" { "abandon" } else { "zoo" };
        assert!(matches!(
            mnemonic_to_seed(&words.join(" ")),
            Err(KeyError::Mnemonic(message)) if message == "Mnemonic checksum mismatch"
        ));
    }

    #[test]
    fn test_mnemonic_rejects_unknown_words_and_length() {
        assert!(mnemonic_to_seed("abandon abandon").is_err());
        let mnemonic = seed_to_mnemonic(&seed(3));
        let broken = mnemonic.replacen(mnemonic.split(' ').next().unwrap(), "notaword", 1);
        assert!(mnemonic_to_seed(&broken).is_err());
    }

    #[test]
    fn test_address_has_valid_checksum() {
        let key = SigningKey::from_bytes(&seed(9));
        let address = encode_address(key.verifying_key().as_bytes());
        assert_eq!(address.len(), 58);
        assert_eq!(
            decode_address(&address).unwrap(),
            *key.verifying_key().as_bytes()
        );

        let mut tampered = address.into_bytes();
        tampered[0] = if tampered[0] == b'A' { b'B' } else { b'A' };
        assert!(decode_address(&String::from_utf8(tampered).unwrap()).is_err());
    }

    #[test]
    fn test_wallet_secret_rederives_address() {
        let wallet = generate_wallet(None).unwrap();
        assert_eq!(wallet.secret.len(), 103);
        let address = address_from_secret(&SecretString::from(wallet.secret.clone())).unwrap();
        assert_eq!(address, wallet.address);
    }

    #[test]
    fn test_wallet_from_mnemonic_is_deterministic() {
        let mnemonic = seed_to_mnemonic(&seed(42));
        let first = generate_wallet(Some(&mnemonic)).unwrap();
        let second = generate_wallet(Some(&mnemonic)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bad_secret_rejected() {
        assert!(matches!(
            address_from_secret(&SecretString::from("AAAA".to_string())),
            Err(KeyError::Secret(_))
        ));
    }
}
