use axum::{
    extract::TypedHeader,
    headers::{authorization::Bearer, Authorization},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;
use sha3::{Digest, Sha3_512};
use subtle::ConstantTimeEq;

use crate::errors::GameError;
use crate::models::game::Role;

/// Issues and checks the per-player access tokens of a match.
///
/// A token is `base64(role ":" hex(sha3_512(game_id ":" role ":" key)))`, so it
/// can be verified without any session storage. Tokens stay valid for as long
/// as the server key does.
#[derive(Clone)]
pub struct TokenCodec {
    server_key: String,
}

impl TokenCodec {
    pub fn new(server_key: impl Into<String>) -> TokenCodec {
        TokenCodec { server_key: server_key.into() }
    }

    fn digest(&self, parts: &[&str]) -> String {
        let mut hasher = Sha3_512::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(b":");
        }
        hasher.update(self.server_key.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn issue(&self, game_id: &str, role: Role) -> String {
        let digest = self.digest(&[game_id, role.as_str()]);
        STANDARD.encode(format!("{}:{}", role, digest))
    }

    /// Returns the role a token was issued for. Every failure is the same
    /// `AuthFailure`.
    pub fn verify(&self, game_id: &str, token: &str) -> Result<Role, GameError> {
        let decoded = STANDARD.decode(token).map_err(|_| GameError::AuthFailure)?;
        let decoded = String::from_utf8(decoded).map_err(|_| GameError::AuthFailure)?;
        let (claimed, digest) = decoded.split_once(':').ok_or(GameError::AuthFailure)?;

        let expected = self.digest(&[game_id, claimed]);
        if !bool::from(expected.as_bytes().ct_eq(digest.as_bytes())) {
            return Err(GameError::AuthFailure);
        }
        claimed.parse::<Role>().map_err(|_| GameError::AuthFailure)
    }

    /// Token for the inspection route: `base64(hex(sha3_512(game_id ":" key)))`.
    /// Never handed out or logged by the server.
    #[cfg(test)]
    pub fn privileged(&self, game_id: &str) -> String {
        STANDARD.encode(self.digest(&[game_id]))
    }

    pub fn verify_privileged(&self, game_id: &str, token: &str) -> Result<(), GameError> {
        let decoded = STANDARD.decode(token).map_err(|_| GameError::AuthFailure)?;
        let expected = self.digest(&[game_id]);
        if bool::from(expected.as_bytes().ct_eq(&decoded)) {
            Ok(())
        } else {
            Err(GameError::AuthFailure)
        }
    }
}

// An absent Authorization header is not rejected by axum, it ends up as AuthFailure
pub type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

// Helper used by every route acting as a player: the bearer token must have
// been issued for this very match.
pub fn check_access(codec: &TokenCodec, game_id: &str, bearer: &BearerHeader) -> Result<Role, GameError> {
    let TypedHeader(bearer) = bearer.as_ref().ok_or_else(|| {
        warn!("Missing bearer token for game {}", game_id);
        GameError::AuthFailure
    })?;
    codec.verify(game_id, bearer.token()).map_err(|err| {
        warn!("Invalid token for game {}", game_id);
        err
    })
}
