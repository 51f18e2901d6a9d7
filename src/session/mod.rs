//! Signed cookie sessions.
//!
//! The whole session (logged in user and pending flash messages) travels in a
//! single HS256 JWT stored in the `session` cookie. Anything that fails to
//! verify is treated as an anonymous, empty session.

use http::{header, HeaderMap, HeaderValue};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "session";

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Session {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub flashes: Vec<String>,
}

impl Session {
    pub fn log_in(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
    }

    pub fn log_out(&mut self) {
        self.user_id = None;
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
    }

    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.flashes.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    uid: Option<i64>,
    #[serde(default)]
    flashes: Vec<String>,
    exp: i64,
}

pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: chrono::Duration,
}

impl SessionSigner {
    pub fn new(secret_key: &str, lifetime: chrono::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            lifetime,
        }
    }

    pub fn sign(&self, session: &Session) -> Result<String, anyhow::Error> {
        let claims = SessionClaims {
            uid: session.user_id,
            flashes: session.flashes.clone(),
            exp: (chrono::Utc::now() + self.lifetime).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Option<Session> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(Session {
                user_id: data.claims.uid,
                flashes: data.claims.flashes,
            }),
            Err(e) => {
                log::warn!("Discarding session cookie: {}", e);
                None
            }
        }
    }

    /// Reads the session out of the request cookies, anonymous if absent or invalid
    pub fn load(&self, headers: &HeaderMap) -> Session {
        find_cookie(headers, SESSION_COOKIE)
            .and_then(|token| self.verify(token))
            .unwrap_or_default()
    }

    /// Builds the `Set-Cookie` value persisting `session`. Empty sessions expire the cookie.
    pub fn cookie_header(&self, session: &Session) -> Result<HeaderValue, anyhow::Error> {
        let cookie = if session.is_empty() {
            format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
        } else {
            format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE,
                self.sign(session)?
            )
        };
        Ok(HeaderValue::from_str(&cookie)?)
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
