//! Safe identifier validation for per-user/per-symbol table names.
//!
//! Table names (`trades_<user>`, `<symbol>_price_log`) can't be bound as
//! query parameters, so every caller-supplied fragment is validated against
//! this allowlist before being interpolated into SQL text.

use crate::error::{Result, StoreError};

fn is_safe_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

pub fn validate_user_id(user: &str) -> Result<()> {
    if is_safe_ident(user) {
        Ok(())
    } else {
        Err(StoreError::InvalidUserId(user.to_string()))
    }
}

pub fn validate_symbol(symbol: &str) -> Result<String> {
    let lower = symbol.to_ascii_lowercase();
    if is_safe_ident(&lower) {
        Ok(lower)
    } else {
        Err(StoreError::InvalidSymbol(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_user_id_accepted() {
        assert!(validate_user_id("dan").is_ok());
        assert!(validate_user_id("user_1").is_ok());
    }

    #[test]
    fn test_sql_injection_attempt_rejected() {
        assert!(validate_user_id("dan; DROP TABLE trades_dan;--").is_err());
        assert!(validate_user_id("dan'").is_err());
        assert!(validate_user_id("").is_err());
    }

    #[test]
    fn test_symbol_is_lowercased() {
        assert_eq!(validate_symbol("BTC").unwrap(), "btc");
    }
}
