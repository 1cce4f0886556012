use std::fmt::Debug;

use derive_more::{AsRef, Display, From};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[derive(Debug, TypedBuilder)]
pub struct Credentials {
    pub merchant_id: MerchantId,
    pub login: Login,
    pub password: Password,
}

/// The `mID` the portal uses to tell schools (merchants) apart.
#[derive(Clone, Debug, From, AsRef, Display, Serialize, Deserialize)]
#[as_ref(forward)]
pub struct MerchantId(String);

/// Guardian's login e-mail address.
#[derive(Clone, Debug, From, AsRef, Display, Serialize, Deserialize)]
#[as_ref(forward)]
pub struct Login(String);

#[derive(Clone, From, AsRef, Serialize, Deserialize)]
#[as_ref(forward)]
pub struct Password(String);
impl Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("The merchant id is empty.")]
    EmptyMerchantId,
    #[error("The login is empty.")]
    EmptyLogin,
    #[error("The password is empty.")]
    EmptyPassword,
}

impl Credentials {
    /// Rejects credentials with a blank field; the portal answers those with
    /// an ordinary login page, which would otherwise look like a parse error.
    pub fn validate(self) -> Result<Self, CredentialsError> {
        if self.merchant_id.0.trim().is_empty() {
            return Err(CredentialsError::EmptyMerchantId);
        }
        if self.login.0.trim().is_empty() {
            return Err(CredentialsError::EmptyLogin);
        }
        if self.password.0.is_empty() {
            return Err(CredentialsError::EmptyPassword);
        }
        Ok(self)
    }
}
