//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, SuccessResponse};
use crate::service::{BalanceView, Outcome, UserService};

use super::middleware::{source_type_middleware, SourceType};

// =========================================================================
// Request/Response types
// =========================================================================

/// Raw transaction request body. Fields are optional so that missing ones
/// surface as 400 with a field-level message instead of a deserialization
/// rejection.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default, rename = "transactionId")]
    pub transaction_id: Option<String>,
}

/// A transaction request with all fields present and the state validated.
#[derive(Debug)]
pub struct ValidatedTransaction {
    pub outcome: Outcome,
    pub amount: String,
    pub transaction_id: String,
}

impl TransactionRequest {
    pub fn validate(self) -> Result<ValidatedTransaction, AppError> {
        let state = self
            .state
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("state is required".to_string()))?;

        let outcome: Outcome = state
            .parse()
            .map_err(|_| AppError::InvalidRequest("state must be one of [win lose]".to_string()))?;

        let amount = self
            .amount
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("amount is required".to_string()))?;

        let transaction_id = self
            .transaction_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("transactionId is required".to_string()))?;

        Ok(ValidatedTransaction {
            outcome,
            amount,
            transaction_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionStatus {
    pub status: &'static str,
    pub message: &'static str,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<UserService> {
    let transaction_routes = Router::new()
        .route("/user/:user_id/transaction", post(update_balance))
        .route_layer(middleware::from_fn(source_type_middleware));

    Router::new()
        .route("/ping", get(ping))
        .route("/user/:user_id/balance", get(get_balance))
        .merge(transaction_routes)
}

/// Liveness probe
async fn ping() -> &'static str {
    "pong"
}

// =========================================================================
// GET /user/:user_id/balance
// =========================================================================

async fn get_balance(
    State(service): State<UserService>,
    Path(user_id): Path<String>,
) -> Result<Json<SuccessResponse<BalanceView>>, AppError> {
    let user_id = parse_user_id(&user_id)?;

    let view = service.get_balance(user_id).await?;

    Ok(Json(SuccessResponse::new(view)))
}

// =========================================================================
// POST /user/:user_id/transaction
// =========================================================================

async fn update_balance(
    State(service): State<UserService>,
    Path(user_id): Path<String>,
    Extension(source_type): Extension<SourceType>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<SuccessResponse<TransactionStatus>>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let request = request.validate()?;

    service
        .update_balance(
            user_id,
            request.outcome,
            &request.amount,
            &request.transaction_id,
            source_type.as_str(),
        )
        .await?;

    Ok(Json(SuccessResponse::new(TransactionStatus {
        status: "success",
        message: "Transaction processed successfully",
    })))
}

/// Parse a path user id, rejecting anything that is not a positive integer.
fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    let user_id: i64 = raw
        .parse()
        .map_err(|_| AppError::InvalidRequest("invalid user ID format".to_string()))?;

    if user_id < 1 {
        return Err(AppError::InvalidRequest(
            "user ID must be positive".to_string(),
        ));
    }

    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id_valid() {
        assert_eq!(parse_user_id("1").unwrap(), 1);
        assert_eq!(parse_user_id("123").unwrap(), 123);
    }

    #[test]
    fn test_parse_user_id_rejects_non_numeric() {
        assert!(parse_user_id("abc").is_err());
        assert!(parse_user_id("12.5").is_err());
        assert!(parse_user_id("").is_err());
    }

    #[test]
    fn test_parse_user_id_rejects_non_positive() {
        assert!(parse_user_id("0").is_err());
        assert!(parse_user_id("-7").is_err());
    }

    #[test]
    fn test_transaction_request_deserialize() {
        let json = r#"{
            "state": "win",
            "amount": "10.15",
            "transactionId": "txn-001"
        }"#;

        let request: TransactionRequest = serde_json::from_str(json).unwrap();
        let validated = request.validate().unwrap();
        assert_eq!(validated.outcome, Outcome::Win);
        assert_eq!(validated.amount, "10.15");
        assert_eq!(validated.transaction_id, "txn-001");
    }

    #[test]
    fn test_transaction_request_missing_fields() {
        let request: TransactionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_err());

        let request: TransactionRequest =
            serde_json::from_str(r#"{"state":"win","amount":"1.00"}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_transaction_request_invalid_state() {
        let request: TransactionRequest =
            serde_json::from_str(r#"{"state":"draw","amount":"1.00","transactionId":"t1"}"#)
                .unwrap();
        assert!(request.validate().is_err());
    }
}
