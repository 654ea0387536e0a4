//! API Middleware
//!
//! Request classification via the `Source-Type` header.

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

/// Validated `Source-Type` header value, inserted into request extensions
/// and threaded through to the transaction processor as an explicit
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Game,
    Server,
    Payment,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Game => "game",
            SourceType::Server => "server",
            SourceType::Payment => "payment",
        }
    }

    /// Parse a raw header value, trimming whitespace and ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "game" => Some(SourceType::Game),
            "server" => Some(SourceType::Server),
            "payment" => Some(SourceType::Payment),
            _ => None,
        }
    }
}

/// Reject requests without a valid `Source-Type` header before they reach
/// the handler.
pub async fn source_type_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let raw = request
        .headers()
        .get("Source-Type")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::MissingHeader("Source-Type".to_string()))?;

    let source_type = SourceType::parse(raw).ok_or_else(|| {
        AppError::InvalidRequest("Source-Type must be one of: game, server, payment".to_string())
    })?;

    request.extensions_mut().insert(source_type);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source_types() {
        assert_eq!(SourceType::parse("game"), Some(SourceType::Game));
        assert_eq!(SourceType::parse("server"), Some(SourceType::Server));
        assert_eq!(SourceType::parse("payment"), Some(SourceType::Payment));
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trimmed() {
        assert_eq!(SourceType::parse("  GAME  "), Some(SourceType::Game));
        assert_eq!(SourceType::parse("Payment"), Some(SourceType::Payment));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(SourceType::parse("mobile"), None);
        assert_eq!(SourceType::parse(""), None);
        assert_eq!(SourceType::parse("game server"), None);
    }

    #[test]
    fn test_as_str_round_trip() {
        for source in [SourceType::Game, SourceType::Server, SourceType::Payment] {
            assert_eq!(SourceType::parse(source.as_str()), Some(source));
        }
    }
}
