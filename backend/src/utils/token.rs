use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

const SESSION_TOKEN_BYTES: usize = 32;

/// Generates an unguessable session token (256 bits from the OS RNG).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates an identifier for a stored record.
pub fn generate_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// User identifiers are derived from the account email so that a login can
/// find its user with a single key lookup.
pub fn user_id_for_email(email: &str) -> String {
    URL_SAFE_NO_PAD.encode(email.trim().to_lowercase().as_bytes())
}
