//! Compact share-link codes for invitations.
//!
//! An invitation id is a UUID; its 16 raw bytes are encoded as URL-safe
//! base64 without padding, giving a 22-character code for `/sharelink/{code}`.

#[cfg(test)]
#[path = "share_link_test.rs"]
mod share_link_test;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

const SHARE_PATH: &str = "/sharelink/";

#[derive(Debug, thiserror::Error)]
pub enum ShareLinkError {
    #[error("invitation id is not a UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
    #[error("share code is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("share code decodes to {0} bytes, expected 16")]
    WrongLength(usize),
}

/// Encode an invitation UUID as a share code.
///
/// # Errors
///
/// Returns [`ShareLinkError::InvalidUuid`] when `invitation_id` is not a UUID.
pub fn encode_invitation_id(invitation_id: &str) -> Result<String, ShareLinkError> {
    let uuid = Uuid::parse_str(invitation_id.trim())?;
    Ok(URL_SAFE_NO_PAD.encode(uuid.as_bytes()))
}

/// Decode a share code back to a hyphenated lowercase UUID.
///
/// Standard-alphabet characters and trailing padding are tolerated.
///
/// # Errors
///
/// Returns [`ShareLinkError`] when the code is not base64 or not 16 bytes.
pub fn decode_invitation_id(code: &str) -> Result<String, ShareLinkError> {
    let normalized = code.trim().trim_end_matches('=').replace('+', "-").replace('/', "_");
    let bytes = URL_SAFE_NO_PAD.decode(normalized)?;
    let bytes: [u8; 16] = bytes.as_slice().try_into().map_err(|_| ShareLinkError::WrongLength(bytes.len()))?;
    Ok(Uuid::from_bytes(bytes).hyphenated().to_string())
}

/// Full share link for an invitation under the app origin.
///
/// # Errors
///
/// See [`encode_invitation_id`].
pub fn share_link(app_url: &str, invitation_id: &str) -> Result<String, ShareLinkError> {
    let code = encode_invitation_id(invitation_id)?;
    Ok(format!("{}{SHARE_PATH}{code}", app_url.trim_end_matches('/')))
}

/// Invitation id from a full share link or a bare code.
///
/// # Errors
///
/// See [`decode_invitation_id`].
pub fn parse_share_link(link: &str) -> Result<String, ShareLinkError> {
    let link = link.trim().trim_end_matches('/');
    let code = match link.rfind(SHARE_PATH) {
        Some(at) => &link[at + SHARE_PATH.len()..],
        None => link,
    };
    let code = code.split(['?', '#']).next().unwrap_or(code);
    decode_invitation_id(code)
}
