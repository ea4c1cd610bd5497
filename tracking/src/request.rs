use crate::errors::ValidationError;
use serde_json::Value;

/// A validated batch: at least one identifier and a non-empty token. Order and
/// duplicates of the identifiers are preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupRequest {
    identifiers: Vec<String>,
    auth_token: String,
}

impl LookupRequest {
    pub fn new(identifiers: Vec<String>, auth_token: String) -> Result<Self, ValidationError> {
        if auth_token.is_empty() {
            return Err(ValidationError::MissingAuthToken);
        }
        if identifiers.is_empty() {
            return Err(ValidationError::MissingOrderIds);
        }
        Ok(LookupRequest {
            identifiers,
            auth_token,
        })
    }

    /// Validates a `{"orderIds": [...], "authToken": "..."}` body. The token is
    /// checked first. Numeric identifiers are accepted as their decimal text.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let auth_token = match body.get("authToken") {
            Some(Value::String(token)) if !token.is_empty() => token.clone(),
            _ => return Err(ValidationError::MissingAuthToken),
        };

        let identifiers = match body.get("orderIds") {
            Some(Value::Array(ids)) if !ids.is_empty() => ids
                .iter()
                .map(|id| match id {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(ValidationError::MissingOrderIds),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(ValidationError::MissingOrderIds),
        };

        LookupRequest::new(identifiers, auth_token)
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request() {
        let request = LookupRequest::from_json(&json!({
            "orderIds": ["855001", 855002, "855001"],
            "authToken": "abc",
        }))
        .unwrap();

        assert_eq!(request.identifiers(), ["855001", "855002", "855001"]);
        assert_eq!(request.auth_token(), "abc");
    }

    #[test]
    fn test_missing_token() {
        for body in [
            json!({"orderIds": ["1"]}),
            json!({"orderIds": ["1"], "authToken": ""}),
            json!({"orderIds": ["1"], "authToken": null}),
            json!({"orderIds": ["1"], "authToken": 42}),
            json!("not an object"),
        ] {
            assert_eq!(
                LookupRequest::from_json(&body),
                Err(ValidationError::MissingAuthToken)
            );
        }
    }

    #[test]
    fn test_missing_order_ids() {
        for body in [
            json!({"authToken": "x"}),
            json!({"orderIds": [], "authToken": "x"}),
            json!({"orderIds": "855001", "authToken": "x"}),
            json!({"orderIds": ["855001", {"id": 1}], "authToken": "x"}),
            json!({"orderIds": [null], "authToken": "x"}),
        ] {
            assert_eq!(
                LookupRequest::from_json(&body),
                Err(ValidationError::MissingOrderIds)
            );
        }
    }

    #[test]
    fn test_token_checked_before_ids() {
        assert_eq!(
            LookupRequest::from_json(&json!({"orderIds": [], "authToken": ""})),
            Err(ValidationError::MissingAuthToken)
        );
        assert_eq!(
            LookupRequest::new(vec![], String::new()),
            Err(ValidationError::MissingAuthToken)
        );
    }
}
