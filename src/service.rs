//! Transaction Processor
//!
//! Domain layer between the HTTP handlers and the balance ledger. Owns the
//! conversion between wire-format decimal strings and the integer
//! minor-unit balances the ledger stores, applies the sign implied by the
//! transaction outcome, and translates ledger errors into domain errors.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{Ledger, LedgerError, TransactionRecord};

/// Minor units per major currency unit (cents per dollar).
const MINOR_UNIT_SCALE: i64 = 100;

/// Decimal places in the rendered balance string.
const BALANCE_DECIMAL_PLACES: u32 = 2;

/// Transaction outcome. Decides the sign of the applied delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
        }
    }
}

impl FromStr for Outcome {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(Outcome::Win),
            "lose" => Ok(Outcome::Lose),
            _ => Err(()),
        }
    }
}

/// A user's balance as presented on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Fixed two-decimal-place string, e.g. "15.00".
    pub balance: String,
}

/// Processor error types
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("user not found")]
    UserNotFound,

    #[error("transaction already exists")]
    DuplicateTransaction,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("invalid amount format: {0}")]
    InvalidAmount(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Domain service for balance reads and mutations.
#[derive(Debug, Clone)]
pub struct UserService {
    ledger: Ledger,
}

impl UserService {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Fetch a user's balance rendered as a decimal string.
    pub async fn get_balance(&self, user_id: i64) -> Result<BalanceView, ServiceError> {
        let user = self.ledger.get_user(user_id).await.map_err(|e| match e {
            LedgerError::UserNotFound => ServiceError::UserNotFound,
            other => ServiceError::Internal(format!("get_user failed: {}", other)),
        })?;

        Ok(BalanceView {
            user_id: user.id,
            balance: format_minor_units(user.balance),
        })
    }

    /// Parse the amount, apply the outcome's sign and delegate the atomic
    /// balance update to the ledger.
    ///
    /// Duplicate submission is a permanent outcome; this layer never
    /// retries.
    pub async fn update_balance(
        &self,
        user_id: i64,
        outcome: Outcome,
        amount: &str,
        transaction_id: &str,
        source_type: &str,
    ) -> Result<(), ServiceError> {
        let delta = parse_amount_minor_units(amount, outcome)?;

        self.ledger
            .apply_transaction(TransactionRecord {
                user_id,
                amount: delta,
                state: outcome.as_str().to_string(),
                source_type: source_type.to_string(),
                transaction_id: transaction_id.to_string(),
            })
            .await
            .map_err(|e| match e {
                LedgerError::UserNotFound => ServiceError::UserNotFound,
                LedgerError::DuplicateTransaction => ServiceError::DuplicateTransaction,
                LedgerError::InsufficientFunds => ServiceError::InsufficientFunds,
                other => ServiceError::Internal(format!("apply_transaction failed: {}", other)),
            })
    }
}

/// Render a minor-unit balance as "major.minor" with exactly two decimal
/// places. The stored balance is an integer number of cents, so the
/// representation is always exact; the sign lands on the major component
/// only (-1000 renders as "-10.00").
fn format_minor_units(balance: i64) -> String {
    Decimal::new(balance, BALANCE_DECIMAL_PLACES).to_string()
}

/// Parse an unsigned decimal amount string and convert it to a signed
/// minor-unit delta. Fractional minor units are truncated, not rounded:
/// "10.999" becomes 1099 cents. Sub-cent input precision is silently
/// dropped, kept for compatibility with the existing API contract.
fn parse_amount_minor_units(amount: &str, outcome: Outcome) -> Result<i64, ServiceError> {
    let parsed = Decimal::from_str(amount)
        .map_err(|_| ServiceError::InvalidAmount(amount.to_string()))?;

    if parsed.is_sign_negative() {
        return Err(ServiceError::InvalidAmount(amount.to_string()));
    }

    let signed = match outcome {
        Outcome::Win => parsed,
        Outcome::Lose => -parsed,
    };

    (signed * Decimal::from(MINOR_UNIT_SCALE))
        .trunc()
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidAmount(amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_minor_units(0), "0.00");
    }

    #[test]
    fn test_format_single_cent() {
        assert_eq!(format_minor_units(1), "0.01");
    }

    #[test]
    fn test_format_regular() {
        assert_eq!(format_minor_units(1050), "10.50");
        assert_eq!(format_minor_units(1500), "15.00");
        assert_eq!(format_minor_units(5), "0.05");
    }

    #[test]
    fn test_format_large() {
        assert_eq!(format_minor_units(123456789), "1234567.89");
    }

    #[test]
    fn test_format_negative_sign_on_major_only() {
        assert_eq!(format_minor_units(-1000), "-10.00");
        assert_eq!(format_minor_units(-5), "-0.05");
    }

    #[test]
    fn test_parse_win_is_positive() {
        assert_eq!(parse_amount_minor_units("10.15", Outcome::Win).unwrap(), 1015);
    }

    #[test]
    fn test_parse_lose_is_negative() {
        assert_eq!(parse_amount_minor_units("10.15", Outcome::Lose).unwrap(), -1015);
    }

    #[test]
    fn test_parse_truncates_sub_cent_precision() {
        assert_eq!(parse_amount_minor_units("10.999", Outcome::Win).unwrap(), 1099);
        assert_eq!(parse_amount_minor_units("12.345", Outcome::Win).unwrap(), 1234);
        assert_eq!(parse_amount_minor_units("10.999", Outcome::Lose).unwrap(), -1099);
    }

    #[test]
    fn test_parse_integer_amount() {
        assert_eq!(parse_amount_minor_units("7", Outcome::Win).unwrap(), 700);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            parse_amount_minor_units("abc", Outcome::Win),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount_minor_units("", Outcome::Win),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount_minor_units("10.5.5", Outcome::Win),
            Err(ServiceError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_input() {
        assert!(matches!(
            parse_amount_minor_units("-5.00", Outcome::Win),
            Err(ServiceError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("win".parse::<Outcome>(), Ok(Outcome::Win));
        assert_eq!("lose".parse::<Outcome>(), Ok(Outcome::Lose));
        assert!("draw".parse::<Outcome>().is_err());
        assert!("WIN".parse::<Outcome>().is_err());
    }
}
