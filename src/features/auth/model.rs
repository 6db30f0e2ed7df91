use serde::{Deserialize, Serialize};

/// Bearer credential for the upstream service.
///
/// Acquired at the start of every poll cycle and never cached across cycles.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Sign-in request body
#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `data` payload of a successful sign-in
#[derive(Debug, Deserialize)]
pub struct SignInData {
    pub jwt: String,
}
