//! The request envelope accepted by the relay endpoint.
//!
//! Every call is a POST carrying `{operation, path, payload?}`. Checks
//! run in a fixed order so clients get stable error codes:
//! 1. body parses as JSON, else 400 "Invalid JSON body"
//! 2. `operation` is a string and `path` a non-empty array of strings,
//!    else 400 "Missing required fields: operation, path"
//! 3. `operation` names a known operation, else 400 "Unsupported
//!    operation: …"
//!
//! Path segment content is not validated here. A segment the backing
//! store cannot address surfaces as a store error, not a 400.

use serde_json::Value;

use crate::errors::RelayError;
use crate::store::{DocPath, Fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetDoc,
    GetCollection,
    AddDoc,
    SetDoc,
    UpdateDoc,
    DeleteDoc,
}

impl Operation {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "getDoc" => Some(Self::GetDoc),
            "getCollection" => Some(Self::GetCollection),
            "addDoc" => Some(Self::AddDoc),
            "setDoc" => Some(Self::SetDoc),
            "updateDoc" => Some(Self::UpdateDoc),
            "deleteDoc" => Some(Self::DeleteDoc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetDoc => "getDoc",
            Self::GetCollection => "getCollection",
            Self::AddDoc => "addDoc",
            Self::SetDoc => "setDoc",
            Self::UpdateDoc => "updateDoc",
            Self::DeleteDoc => "deleteDoc",
        }
    }
}

#[derive(Debug)]
pub struct ProxyRequest {
    pub operation: Operation,
    pub path: DocPath,
    payload: Value,
}

impl ProxyRequest {
    pub fn parse(body: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| RelayError::MalformedBody)?;

        let name = value
            .get("operation")
            .and_then(Value::as_str)
            .ok_or(RelayError::MissingOperationFields)?;
        let raw_path = value
            .get("path")
            .and_then(Value::as_array)
            .ok_or(RelayError::MissingOperationFields)?;
        if raw_path.is_empty() {
            return Err(RelayError::MissingOperationFields);
        }
        let segments = raw_path
            .iter()
            .map(|s| s.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(RelayError::MissingOperationFields)?;

        let operation =
            Operation::parse(name).ok_or_else(|| RelayError::UnsupportedOperation(name.to_string()))?;

        let path = DocPath::new(segments)?;
        let payload = value.get("payload").cloned().unwrap_or(Value::Null);

        Ok(Self {
            operation,
            path,
            payload,
        })
    }

    /// Payload for write operations. Absent means an empty document;
    /// anything present must be a JSON object.
    pub fn payload_object(&self) -> Result<Fields, RelayError> {
        match &self.payload {
            Value::Null => Ok(Fields::new()),
            Value::Object(map) => Ok(map.clone()),
            _ => Err(RelayError::Internal(anyhow::anyhow!(
                "payload must be a JSON object"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<ProxyRequest, RelayError> {
        ProxyRequest::parse(body.as_bytes())
    }

    #[test]
    fn well_formed_requests_parse() {
        let req = parse(r#"{"operation":"getDoc","path":["scores","abc"]}"#).unwrap();
        assert_eq!(req.operation, Operation::GetDoc);
        assert_eq!(req.path.join(), "scores/abc");
        assert!(req.payload_object().unwrap().is_empty());
    }

    #[test]
    fn garbage_bodies_are_malformed() {
        assert!(matches!(parse("{not json"), Err(RelayError::MalformedBody)));
    }

    #[test]
    fn missing_operation_or_path_is_a_field_error() {
        for body in [
            r#"{"path":["scores"]}"#,
            r#"{"operation":"getDoc"}"#,
            r#"{"operation":"getDoc","path":[]}"#,
            r#"{"operation":"getDoc","path":"scores"}"#,
            r#"{"operation":"getDoc","path":["scores",7]}"#,
            r#"{"operation":42,"path":["scores"]}"#,
        ] {
            assert!(
                matches!(parse(body), Err(RelayError::MissingOperationFields)),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn field_errors_win_over_unknown_operations() {
        assert!(matches!(
            parse(r#"{"operation":"burnDoc","path":[]}"#),
            Err(RelayError::MissingOperationFields)
        ));
    }

    #[test]
    fn unknown_operations_are_reported_by_name() {
        match parse(r#"{"operation":"burnDoc","path":["scores"]}"#) {
            Err(RelayError::UnsupportedOperation(name)) => assert_eq!(name, "burnDoc"),
            other => panic!("unexpected: {:?}", other.map(|r| r.operation)),
        }
    }

    #[test]
    fn non_object_payloads_are_rejected_lazily() {
        let req = parse(r#"{"operation":"setDoc","path":["scores","a"],"payload":[1,2]}"#).unwrap();
        assert!(req.payload_object().is_err());
    }
}
