use crate::token::Claims;

/// Lets the application reject otherwise valid tokens.
pub trait Validator: Send + Sync {
    fn validate(&self, token: &str, claims: &Claims) -> bool;
}

/// Adapter turning a closure into a `Validator`.
pub struct ValidatorFunc<F>(pub F);

impl<F> ValidatorFunc<F>
where
    F: Fn(&str, &Claims) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        ValidatorFunc(f)
    }
}

impl<F> Validator for ValidatorFunc<F>
where
    F: Fn(&str, &Claims) -> bool + Send + Sync,
{
    fn validate(&self, token: &str, claims: &Claims) -> bool {
        (self.0)(token, claims)
    }
}
