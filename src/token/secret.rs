use super::Claims;

/// Returns the signing secret for a site (the token's `aud`).
pub trait SecretReader: Send + Sync {
    fn get(&self, aud: &str) -> Result<String, String>;
}

/// Adapter turning a closure into a `SecretReader`.
pub struct SecretFunc<F>(pub F);

impl<F> SecretFunc<F>
where
    F: Fn(&str) -> Result<String, String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        SecretFunc(f)
    }
}

impl<F> SecretReader for SecretFunc<F>
where
    F: Fn(&str) -> Result<String, String> + Send + Sync,
{
    fn get(&self, aud: &str) -> Result<String, String> {
        (self.0)(aud)
    }
}

/// Hook to add or modify values stored in the token before it is signed.
pub trait ClaimsUpdater: Send + Sync {
    fn update(&self, claims: Claims) -> Claims;
}

/// Adapter turning a closure into a `ClaimsUpdater`.
pub struct ClaimsUpdFunc<F>(pub F);

impl<F> ClaimsUpdFunc<F>
where
    F: Fn(Claims) -> Claims + Send + Sync,
{
    pub fn new(f: F) -> Self {
        ClaimsUpdFunc(f)
    }
}

impl<F> ClaimsUpdater for ClaimsUpdFunc<F>
where
    F: Fn(Claims) -> Claims + Send + Sync,
{
    fn update(&self, claims: Claims) -> Claims {
        (self.0)(claims)
    }
}
