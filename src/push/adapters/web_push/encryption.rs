//! `aes128gcm` message encryption for Web Push.

use crate::push::ports::TransportError;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use p256::PublicKey;
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

/// Largest plaintext that fits one 4096-byte record after the padding
/// delimiter, the AEAD tag and the `aes128gcm` header.
pub const MAX_PAYLOAD_LEN: usize = 3993;

/// Record size field of the header: 4096, big-endian.
const RECORD_SIZE: [u8; 4] = [0x00, 0x00, 0x10, 0x00];
/// Delimiter marking the last (and only) record.
const LAST_RECORD_DELIMITER: u8 = 0x02;
const KEY_INFO: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

/// Derives the content encryption key and nonce from the ECDH secret.
pub(super) fn derive_key_and_nonce(
    shared_secret: &[u8],
    auth_secret: &[u8],
    client_public: &[u8],
    server_public: &[u8],
    salt: &[u8],
) -> Result<([u8; 16], [u8; 12]), TransportError> {
    let expand_failed = |err: hkdf::InvalidLength| TransportError::Encryption(err.to_string());

    let mut key_info =
        Vec::with_capacity(KEY_INFO.len() + client_public.len() + server_public.len());
    key_info.extend_from_slice(KEY_INFO);
    key_info.extend_from_slice(client_public);
    key_info.extend_from_slice(server_public);
    let mut ikm = [0_u8; 32];
    Hkdf::<Sha256>::new(Some(auth_secret), shared_secret)
        .expand(&key_info, &mut ikm)
        .map_err(expand_failed)?;

    let content = Hkdf::<Sha256>::new(Some(salt), &ikm);
    let mut cek = [0_u8; 16];
    content.expand(CEK_INFO, &mut cek).map_err(expand_failed)?;
    let mut nonce = [0_u8; 12];
    content.expand(NONCE_INFO, &mut nonce).map_err(expand_failed)?;
    Ok((cek, nonce))
}

/// Encrypts `payload` for a client identified by its `p256dh` point and
/// `auth` secret, returning the complete request body.
pub(super) fn encrypt(
    payload: &[u8],
    client_public: &[u8],
    auth_secret: &[u8],
) -> Result<Vec<u8>, TransportError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(TransportError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    let client_key = PublicKey::from_sec1_bytes(client_public)
        .map_err(|err| TransportError::InvalidSubscription(format!("p256dh: {err}")))?;

    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let server_point = ephemeral.public_key().to_encoded_point(false);
    let server_public = server_point.as_bytes();
    let shared = ephemeral.diffie_hellman(&client_key);

    let mut salt = [0_u8; 16];
    OsRng.fill_bytes(&mut salt);
    let (cek, nonce) = derive_key_and_nonce(
        shared.raw_secret_bytes(),
        auth_secret,
        client_public,
        server_public,
        &salt,
    )?;

    let mut plaintext = Vec::with_capacity(payload.len() + 1);
    plaintext.extend_from_slice(payload);
    plaintext.push(LAST_RECORD_DELIMITER);
    let cipher = Aes128Gcm::new_from_slice(&cek)
        .map_err(|err| TransportError::Encryption(err.to_string()))?;
    let ciphertext = cipher
        .encrypt(&Nonce::from(nonce), plaintext.as_slice())
        .map_err(|err| TransportError::Encryption(err.to_string()))?;

    let key_id_len = u8::try_from(server_public.len())
        .map_err(|err| TransportError::Encryption(err.to_string()))?;
    let header_len = salt.len() + RECORD_SIZE.len() + 1 + server_public.len();
    let mut body = Vec::with_capacity(header_len + ciphertext.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE);
    body.push(key_id_len);
    body.extend_from_slice(server_public);
    body.extend_from_slice(&ciphertext);
    Ok(body)
}
