//! Sesión de la cuenta
//!
//! Token, identificador y tipo de cuenta. Se pasa explícitamente a cada
//! operación del motor en lugar de leerse de un estado global.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::errors::AppError;

/// Tipo de cuenta en el marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Client,
    Trucker,
    ServiceProvider,
    Admin,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub account_id: String,
    pub account_type: AccountType,
}

impl Session {
    pub fn new(token: impl Into<String>, account_id: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            token: token.into(),
            account_id: account_id.into(),
            account_type,
        }
    }

    /// Token bearer; sin token no se intenta ninguna llamada
    pub fn bearer(&self) -> Result<&str, AppError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthenticated("Session has no token".to_string()));
        }
        Ok(token)
    }

    /// Exige un tipo de cuenta; los administradores pasan siempre
    pub fn require(&self, expected: AccountType) -> Result<(), AppError> {
        self.bearer()?;
        if self.account_type == expected || self.account_type == AccountType::Admin {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "Operation requires a {:?} account",
                expected
            )))
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.account_id)
            .field("account_type", &self.account_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_short_circuits() {
        let session = Session::new("  ", "T-1", AccountType::Trucker);
        assert!(matches!(session.bearer(), Err(AppError::Unauthenticated(_))));
        assert!(matches!(session.require(AccountType::Trucker), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_require_account_type() {
        let trucker = Session::new("tok", "T-1", AccountType::Trucker);
        assert!(trucker.require(AccountType::Trucker).is_ok());
        assert!(matches!(trucker.require(AccountType::Client), Err(AppError::Unauthorized(_))));

        let admin = Session::new("tok", "A-1", AccountType::Admin);
        assert!(admin.require(AccountType::Client).is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let session = Session::new("secret-token", "C-1", AccountType::Client);
        assert!(!format!("{:?}", session).contains("secret-token"));
    }
}
