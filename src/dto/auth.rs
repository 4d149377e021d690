use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Reply of `/t-login` and `/t-signup`. `success` is "1" on success and
/// "-1" on a rejected credential.
#[derive(Debug, Default, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub success: Option<Value>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthReply {
    pub fn success_flag(&self) -> Option<String> {
        match self.success.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success_flag().as_deref() == Some("1")
    }

    pub fn is_rejected(&self) -> bool {
        self.success_flag().as_deref() == Some("-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flag_accepts_string_or_number() {
        let s: AuthReply = serde_json::from_str(r#"{"success":"1","token":"t"}"#).unwrap();
        assert!(s.is_success());

        let n: AuthReply = serde_json::from_str(r#"{"success":-1}"#).unwrap();
        assert!(n.is_rejected());

        let empty: AuthReply = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_success() && !empty.is_rejected());
    }
}
