//! Signed cookie sessions, flash messages and CSRF tokens.
//!
//! Session data lives entirely in the client's `session` cookie as
//! `base64url(json) "." base64url(hmac_sha256(secret, base64url(json)))`.
//! A cookie whose signature does not verify is ignored.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::{Cookie, Middleware, Next, Req, Res};

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

const FLASHES_KEY: &str = "_flashes";
const CSRF_KEY: &str = "csrf_token";

#[derive(Debug, Default)]
struct SessionState {
    data: Map<String, Value>,
    modified: bool,
}

/// Handle to the current request's session.
///
/// Clones share the same data, so middleware can observe what the
/// handler changed after the response is produced.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Session pre-filled with `data`.
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                data,
                modified: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read and deserialize a value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.lock();
        state
            .data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Store a value. Values that fail to serialize are ignored.
    pub fn insert<T: Serialize>(&self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                let mut state = self.lock();
                state.data.insert(key.to_string(), value);
                state.modified = true;
            }
            Err(e) => tracing::warn!(key, error = %e, "session value not serializable"),
        }
    }

    /// Remove a key, returning its raw value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut state = self.lock();
        let removed = state.data.remove(key);
        if removed.is_some() {
            state.modified = true;
        }
        removed
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Drop all data.
    pub fn clear(&self) {
        let mut state = self.lock();
        if !state.data.is_empty() {
            state.data.clear();
            state.modified = true;
        }
    }

    /// Queue a message for the next rendered page.
    pub fn flash(&self, message: impl Into<String>) {
        let mut state = self.lock();
        let entry = state
            .data
            .entry(FLASHES_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.into()));
        } else {
            *entry = Value::Array(vec![Value::String(message.into())]);
        }
        state.modified = true;
    }

    /// Take all queued flash messages.
    pub fn take_flashes(&self) -> Vec<String> {
        let mut state = self.lock();
        match state.data.remove(FLASHES_KEY) {
            Some(Value::Array(messages)) => {
                state.modified = true;
                messages
                    .into_iter()
                    .filter_map(|m| m.as_str().map(str::to_owned))
                    .collect()
            }
            Some(_) => {
                state.modified = true;
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// The session's CSRF token, created on first use.
    pub fn csrf_token(&self) -> String {
        let mut state = self.lock();
        if let Some(Value::String(token)) = state.data.get(CSRF_KEY) {
            return token.clone();
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        state
            .data
            .insert(CSRF_KEY.to_string(), Value::String(token.clone()));
        state.modified = true;
        token
    }

    /// Stored CSRF token without creating one.
    pub(crate) fn existing_csrf_token(&self) -> Option<String> {
        self.get(CSRF_KEY)
    }

    fn snapshot(&self) -> Option<Map<String, Value>> {
        let state = self.lock();
        state.modified.then(|| state.data.clone())
    }
}

/// Signs and verifies session cookie payloads.
#[derive(Clone)]
pub struct SessionSigner {
    key: Arc<[u8]>,
}

impl SessionSigner {
    /// Signer keyed by the app's secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Arc::from(secret.as_ref()),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
        }
    }

    /// Encode and sign session data.
    pub fn encode(&self, data: &Map<String, Value>) -> String {
        let json = serde_json::to_vec(data).unwrap_or_else(|_| b"{}".to_vec());
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Verify and decode a cookie value. `None` when tampered or malformed.
    pub fn decode(&self, cookie: &str) -> Option<Map<String, Value>> {
        let (payload, signature) = cookie.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;
        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner").finish_non_exhaustive()
    }
}

/// Middleware that loads the session from its cookie and writes it back
/// when the handler changed it.
#[derive(Debug, Clone)]
pub struct SessionLayer {
    signer: SessionSigner,
}

impl SessionLayer {
    /// Layer signing cookies with `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            signer: SessionSigner::new(secret),
        }
    }
}

#[async_trait]
impl<S: Send + Sync + 'static> Middleware<S> for SessionLayer {
    async fn handle(&self, mut req: Req, _state: Arc<S>, next: Next<S>) -> Res {
        let cookie = req.cookie(SESSION_COOKIE);
        let had_cookie = cookie.is_some();
        let data = match cookie.as_deref().map(|c| self.signer.decode(c)) {
            Some(Some(data)) => data,
            Some(None) => {
                tracing::debug!("discarding session cookie with bad signature");
                Map::new()
            }
            None => Map::new(),
        };

        let session = Session::from_map(data);
        req.extensions_mut().insert(session.clone());

        let mut res = next.run(req).await;

        if let Some(data) = session.snapshot() {
            let cookie = if data.is_empty() {
                had_cookie.then(|| Cookie::removal(SESSION_COOKIE).http_only(true))
            } else {
                Some(
                    Cookie::new(SESSION_COOKIE, self.signer.encode(&data))
                        .http_only(true)
                        .same_site("Lax"),
                )
            };
            if let Some(cookie) = cookie {
                res.add_cookie(&cookie);
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_round_trip() {
        let signer = SessionSigner::new("secret string");
        let mut data = Map::new();
        data.insert("logged_in".into(), Value::Bool(true));
        let cookie = signer.encode(&data);
        assert_eq!(signer.decode(&cookie), Some(data));
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let signer = SessionSigner::new("secret string");
        let mut data = Map::new();
        data.insert("logged_in".into(), Value::Bool(false));
        let cookie = signer.encode(&data);

        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"logged_in":true}"#);
        let (_, signature) = cookie.rsplit_once('.').unwrap();
        assert_eq!(signer.decode(&format!("{forged_payload}.{signature}")), None);

        let other = SessionSigner::new("another secret");
        assert_eq!(other.decode(&cookie), None);
        assert_eq!(signer.decode("not-a-cookie"), None);
    }

    #[test]
    fn test_flashes_are_taken_once() {
        let session = Session::default();
        session.flash("Upload success.");
        session.flash("Bingo!");
        assert_eq!(session.take_flashes(), vec!["Upload success.", "Bingo!"]);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_csrf_token_is_stable() {
        let session = Session::default();
        assert!(session.existing_csrf_token().is_none());
        let token = session.csrf_token();
        assert_eq!(token.len(), 32);
        assert_eq!(session.csrf_token(), token);
        assert_eq!(session.existing_csrf_token(), Some(token));
    }

    #[test]
    fn test_modification_tracking() {
        let session = Session::default();
        assert!(session.snapshot().is_none());
        assert!(session.remove("missing").is_none());
        assert!(session.snapshot().is_none());
        session.insert("filenames", vec!["a.png"]);
        assert_eq!(session.get::<Vec<String>>("filenames").unwrap(), vec!["a.png"]);
        assert!(session.snapshot().is_some());
    }
}
