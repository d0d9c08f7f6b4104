//! Request body decoding.
//!
//! Bodies arrive as raw bytes and the content type is not checked. Every
//! decoding failure is a [`RequestError`].

use serde_json::{Map, Value};

use crate::error::RequestError;
use crate::registry::{ClientRegistration, ClientTokenRequest};
use crate::token::Claims;

/// A JSON object of arbitrary claims.
pub fn claims(body: &[u8]) -> Result<Claims, RequestError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| RequestError::InvalidBody(e.to_string()))?;

    Claims::from_value(value)
        .ok_or_else(|| RequestError::InvalidBody("claims must be a JSON object".to_string()))
}

/// A JSON `{client_id, client_secret, scope}` object.
pub fn registration(body: &[u8]) -> Result<ClientRegistration, RequestError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| RequestError::InvalidBody(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(RequestError::InvalidBody("registration must be a JSON object".to_string()));
    };

    Ok(ClientRegistration {
        id: json_string(&object, "client_id")?,
        secret: json_string(&object, "client_secret")?,
        scope: json_string(&object, "scope")?,
    })
}

/// A form-url-encoded client-credentials request.
///
/// Repeated keys resolve to their first value.
pub fn token_request(body: &[u8]) -> Result<ClientTokenRequest, RequestError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|e| RequestError::InvalidBody(e.to_string()))?;

    Ok(ClientTokenRequest {
        client_id: form_value(&pairs, "client_id")?,
        client_secret: form_value(&pairs, "client_secret")?,
        grant_type: form_value(&pairs, "grant_type")?,
        audience: form_value(&pairs, "audience")?,
    })
}

fn json_string(object: &Map<String, Value>, field: &'static str) -> Result<String, RequestError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(RequestError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RequestError::InvalidField { field, expected: "a string" }),
    }
}

fn form_value(pairs: &[(String, String)], field: &'static str) -> Result<String, RequestError> {
    pairs
        .iter()
        .find(|(k, _)| k == field)
        .map(|(_, v)| v.clone())
        .ok_or(RequestError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_object() {
        let claims = claims(br#"{"sub":"olg387f","roles":["admin"],"iat":1}"#).unwrap();
        assert_eq!(claims.len(), 3);
        assert_eq!(claims.get("sub"), Some(&Value::from("olg387f")));
    }

    #[test]
    fn test_claims_rejects_non_object() {
        assert!(matches!(claims(b"[1,2]"), Err(RequestError::InvalidBody(_))));
        assert!(matches!(claims(b"not json"), Err(RequestError::InvalidBody(_))));
        assert!(matches!(claims(b""), Err(RequestError::InvalidBody(_))));
    }

    #[test]
    fn test_registration() {
        let reg = registration(br#"{"client_id":"svc1","client_secret":"s3cr3t","scope":"read"}"#)
            .unwrap();
        assert_eq!(reg, ClientRegistration::new("svc1", "s3cr3t", "read"));
    }

    #[test]
    fn test_registration_field_errors() {
        let err = registration(br#"{"client_id":"svc1","scope":"read"}"#).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("client_secret")));

        let err = registration(br#"{"client_id":7,"client_secret":"x","scope":"read"}"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidField { field: "client_id", .. }));

        let err = registration(br#""svc1""#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidBody(_)));
    }

    #[test]
    fn test_token_request() {
        let req = token_request(
            b"client_id=svc1&client_secret=s3%26cr3t&grant_type=client_credentials&audience=api",
        )
        .unwrap();

        assert_eq!(req.client_id, "svc1");
        assert_eq!(req.client_secret, "s3&cr3t");
        assert_eq!(req.grant_type, "client_credentials");
        assert_eq!(req.audience, "api");
    }

    #[test]
    fn test_token_request_first_value_wins() {
        let req = token_request(
            b"client_id=a&client_id=b&client_secret=s&grant_type=client_credentials&audience=api",
        )
        .unwrap();
        assert_eq!(req.client_id, "a");
    }

    #[test]
    fn test_token_request_missing_field() {
        let err = token_request(b"client_id=svc1&client_secret=s3cr3t&audience=api").unwrap_err();
        assert!(matches!(err, RequestError::MissingField("grant_type")));
        assert_eq!(err.to_string(), "missing field 'grant_type'");
    }
}
