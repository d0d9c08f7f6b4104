//! Open claim sets and validation of the registered claims this server requires.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TokenError, TokenResult};

pub const SUBJECT: &str = "sub";
pub const ISSUED_AT: &str = "iat";
pub const EXPIRATION: &str = "exp";
pub const ISSUER: &str = "iss";
pub const AUDIENCE: &str = "aud";
pub const AUTHORIZED_PARTY: &str = "azp";
pub const SCOPE: &str = "scope";
pub const GRANT_TYPE: &str = "gty";

/// Claim set of a token: claim name to arbitrary JSON value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, Value>);

/// The registered claims every signed token must carry, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredClaims {
    pub subject: Option<String>,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl Claims {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Claims from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map.into_iter().collect())),
            _ => None,
        }
    }

    /// Decode `sub`, `iat` and `exp`.
    ///
    /// Absent or `null` timestamps decode as 0 (the epoch); present values of
    /// the wrong type are rejected.
    pub fn required(&self) -> TokenResult<RequiredClaims> {
        let subject = match self.get(SUBJECT) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(TokenError::invalid_claim(SUBJECT, "expected a string")),
        };

        Ok(RequiredClaims {
            subject,
            issued_at: self.numeric_date(ISSUED_AT)?,
            expires_at: self.numeric_date(EXPIRATION)?,
        })
    }

    fn numeric_date(&self, name: &str) -> TokenResult<i64> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .ok_or_else(|| TokenError::invalid_claim(name, "number out of range")),
            Some(_) => Err(TokenError::invalid_claim(name, "expected a NumericDate")),
        }
    }

    /// Check the required claims against the current time.
    pub fn validate(&self) -> TokenResult<()> {
        self.validate_at(Utc::now())
    }

    /// Check the required claims against `now`.
    ///
    /// Rejects, in order: `now` strictly after `exp`, `now` strictly before
    /// `iat`, then an absent or empty `sub`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> TokenResult<()> {
        let required = self.required()?;
        let now = now.timestamp();

        if now > required.expires_at {
            return Err(TokenError::ExpiredToken);
        }

        if now < required.issued_at {
            return Err(TokenError::IssuedInFuture);
        }

        if required.subject.as_deref().is_none_or(str::is_empty) {
            return Err(TokenError::MissingRequiredClaim);
        }

        Ok(())
    }
}

impl FromIterator<(String, Value)> for Claims {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Claims {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
