// ABOUTME: JSON wire messages exchanged with the phone enclave.
// ABOUTME: Requests and responses are tagged unions keyed by me/sign/list, correlated by request_id.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tether_ssh::serde_bytes::{b64, b64_option};
use tether_ssh::{PublicKey, SshError};

/// Current Unix timestamp in seconds (0 if the clock is before the epoch).
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// A request to the enclave.
///
/// Wire shape: `{"request_id": "...", "unix_seconds": 0, "sign_request": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub request_id: String,
    pub unix_seconds: i64,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl Request {
    /// Build a request with a fresh random ID.
    pub fn new(body: RequestBody) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            unix_seconds: current_timestamp(),
            body,
        }
    }
}

/// Request payloads. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestBody {
    #[serde(rename = "me_request")]
    Me(MeRequest),
    #[serde(rename = "sign_request")]
    Sign(SignRequest),
    #[serde(rename = "list_request")]
    List(ListRequest),
}

/// Ask the enclave who it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeRequest {}

/// Ask the enclave to sign `data` with the key whose wire-format SHA256 is
/// `public_key_fingerprint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    #[serde(with = "b64")]
    pub public_key_fingerprint: Vec<u8>,
    #[serde(with = "b64")]
    pub data: Vec<u8>,
}

/// Ask for the profiles the enclave holds, optionally filtered by email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A response from the enclave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub request_id: String,
    #[serde(flatten)]
    pub body: ResponseBody,
    /// Push endpoint the enclave wants future requests announced on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sns_endpoint_arn: Option<String>,
}

/// Response payloads, mirroring [`RequestBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBody {
    #[serde(rename = "me_response")]
    Me(MeResponse),
    #[serde(rename = "sign_response")]
    Sign(SignResponse),
    #[serde(rename = "list_response")]
    List(ListResponse),
}

impl ResponseBody {
    /// Wire name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Me(_) => "me_response",
            ResponseBody::Sign(_) => "sign_response",
            ResponseBody::List(_) => "list_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub me: Profile,
}

/// Either a signature or the reason there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    #[serde(default, with = "b64_option", skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// An identity held by the enclave: one SSH public key and its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(with = "b64")]
    pub ssh_wire_public_key: Vec<u8>,
    pub email: String,
}

impl Profile {
    /// SHA256 of the SSH wire-format public key; how sign requests name the key.
    pub fn public_key_fingerprint(&self) -> Vec<u8> {
        tether_ssh::wire_key_digest(&self.ssh_wire_public_key)
    }

    /// Parse the public key.
    pub fn ssh_public_key(&self) -> tether_ssh::Result<PublicKey> {
        PublicKey::from_bytes(&self.ssh_wire_public_key).map_err(SshError::ParseKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> Profile {
        Profile {
            ssh_wire_public_key: b"wire key".to_vec(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = Request::new(RequestBody::Me(MeRequest {}));
        let b = Request::new(RequestBody::Me(MeRequest {}));
        assert_ne!(a.request_id, b.request_id);
        assert!(a.unix_seconds > 0);
    }

    #[test]
    fn test_sign_request_wire_shape() {
        let request = Request {
            request_id: "r1".to_string(),
            unix_seconds: 10,
            body: RequestBody::Sign(SignRequest {
                public_key_fingerprint: vec![1, 2, 3],
                data: b"hi".to_vec(),
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "request_id": "r1",
                "unix_seconds": 10,
                "sign_request": {"public_key_fingerprint": "AQID", "data": "aGk="}
            })
        );
    }

    #[test]
    fn test_me_request_wire_shape() {
        let request = Request {
            request_id: "r2".to_string(),
            unix_seconds: 1,
            body: RequestBody::Me(MeRequest {}),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["me_request"], json!({}));
        assert!(value.get("sign_request").is_none());
    }

    #[test]
    fn test_response_parses_with_endpoint() {
        let raw = json!({
            "request_id": "r3",
            "me_response": {"me": {"ssh_wire_public_key": "d2lyZSBrZXk=", "email": "alice@example.com"}},
            "sns_endpoint_arn": "arn:aws:sns:endpoint"
        });
        let response: Response = serde_json::from_value(raw).unwrap();
        assert_eq!(response.request_id, "r3");
        assert_eq!(
            response.body,
            ResponseBody::Me(MeResponse { me: profile() })
        );
        assert_eq!(
            response.sns_endpoint_arn.as_deref(),
            Some("arn:aws:sns:endpoint")
        );
    }

    #[test]
    fn test_sign_response_with_error_only() {
        let raw = json!({"request_id": "r4", "sign_response": {"error": "rejected"}});
        let response: Response = serde_json::from_value(raw).unwrap();
        match response.body {
            ResponseBody::Sign(sign) => {
                assert_eq!(sign.signature, None);
                assert_eq!(sign.error.as_deref(), Some("rejected"));
            }
            other => panic!("expected sign response, got {}", other.kind()),
        }
        assert_eq!(response.sns_endpoint_arn, None);
    }

    #[test]
    fn test_response_without_body_is_rejected() {
        let raw = json!({"request_id": "r5"});
        assert!(serde_json::from_value::<Response>(raw).is_err());
        assert!(serde_json::from_slice::<Response>(b"garbage").is_err());
    }

    #[test]
    fn test_profile_fingerprint_is_digest_of_wire_key() {
        let p = profile();
        assert_eq!(
            p.public_key_fingerprint(),
            tether_ssh::wire_key_digest(b"wire key")
        );
        assert!(p.ssh_public_key().is_err());
    }
}
