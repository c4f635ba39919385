//! Action tokens.
//!
//! A token is an authenticated reference to an invocation target. Two
//! payload shapes exist:
//!
//! ```text
//! { component, id, action, panel }   re-looked-up on a registered component
//! { action_id, panel }               handler stored in the session
//! ```
//!
//! Payloads are sealed by an [`Encrypter`]. The default [`HmacEncrypter`]
//! signs base64url JSON with HMAC-SHA256: tampering fails verification,
//! but the payload itself is readable.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use actionkit_core::{ConfigError, RecordKey};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while decoding a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("The action token is missing")]
    MissingToken,

    #[error("The action token is malformed")]
    Malformed,

    #[error("The action token signature is invalid")]
    InvalidSignature,

    #[error("The action token payload is invalid: {0}")]
    Payload(#[from] serde_json::Error),
}

// =============================================================================
// Encrypter
// =============================================================================

/// Authenticated sealing of JSON values.
///
/// Implementations must be non-malleable and must reject any token that
/// was not produced by `encrypt` with the same key.
pub trait Encrypter: Send + Sync {
    fn encrypt(&self, value: &Value) -> String;

    fn decrypt(&self, token: &str) -> Result<Value, TokenError>;
}

/// HMAC-SHA256 signer over base64url JSON.
#[derive(Clone)]
pub struct HmacEncrypter {
    mac: HmacSha256,
}

impl HmacEncrypter {
    /// Create a signer from a secret key.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let mac = HmacSha256::new_from_slice(key.as_ref())
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }
}

impl Encrypter for HmacEncrypter {
    fn encrypt(&self, value: &Value) -> String {
        let payload = URL_SAFE_NO_PAD.encode(value.to_string());
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    fn decrypt(&self, token: &str) -> Result<Value, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Reference to a handler stored in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandalonePayload {
    pub action_id: String,
    #[serde(default)]
    pub panel: Option<String>,
}

/// Reference to a named action on a registered component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentPayload {
    pub component: String,
    #[serde(default)]
    pub id: Option<RecordKey>,
    pub action: String,
    #[serde(default)]
    pub panel: Option<String>,
}

/// A decoded action token.
///
/// Standalone payloads are tried first, so a payload carrying an
/// `action_id` always takes the standalone path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionToken {
    Standalone(StandalonePayload),
    Component(ComponentPayload),
}

impl ActionToken {
    pub fn standalone(action_id: impl Into<String>, panel: Option<String>) -> Self {
        ActionToken::Standalone(StandalonePayload {
            action_id: action_id.into(),
            panel,
        })
    }

    pub fn component(
        component: impl Into<String>,
        id: Option<RecordKey>,
        action: impl Into<String>,
        panel: Option<String>,
    ) -> Self {
        ActionToken::Component(ComponentPayload {
            component: component.into(),
            id,
            action: action.into(),
            panel,
        })
    }

    pub fn panel(&self) -> Option<&str> {
        match self {
            ActionToken::Standalone(payload) => payload.panel.as_deref(),
            ActionToken::Component(payload) => payload.panel.as_deref(),
        }
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Encodes and decodes typed payloads through an [`Encrypter`].
pub struct TokenCodec {
    encrypter: Box<dyn Encrypter>,
}

impl TokenCodec {
    pub fn new(encrypter: impl Encrypter + 'static) -> Self {
        Self {
            encrypter: Box::new(encrypter),
        }
    }

    /// Create a codec using [`HmacEncrypter`] with the given key.
    pub fn hmac(key: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        Ok(Self::new(HmacEncrypter::new(key)?))
    }

    /// Seal any serializable payload.
    pub fn seal<T: Serialize>(&self, payload: &T) -> Result<String, TokenError> {
        let value = serde_json::to_value(payload)?;
        Ok(self.encrypter.encrypt(&value))
    }

    /// Open a sealed payload into the expected shape.
    pub fn open<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        if token.is_empty() {
            return Err(TokenError::MissingToken);
        }
        let value = self.encrypter.decrypt(token)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Encode an action token.
    pub fn encode(&self, token: &ActionToken) -> Result<String, TokenError> {
        self.seal(token)
    }

    /// Decode an action token.
    pub fn decode(&self, token: &str) -> Result<ActionToken, TokenError> {
        self.open(token)
    }
}
