use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use partyhub_core::{DomainError, PartyId, StoreId};
use partyhub_infra::ServiceError;
use partyhub_parties::PartyType;

pub const MISSING_PARAMETERS: &str = "Missing required parameters";
pub const INVALID_PARTY_TYPE: &str = "Please provide correct party type";
pub const INVALID_STORE_ID: &str = "Please pass valid storeId";
pub const INVALID_PARTY_ID: &str = "Please pass valid partyId";
pub const PARTY_NOT_FOUND: &str = "Party with the given id not found in the store";

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "duplicate_party", msg),
        ServiceError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        ServiceError::NoRecords(msg) => json_error(StatusCode::NOT_FOUND, "no_records", msg),
        ServiceError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::MissingParameters(fields) => json_error(
            StatusCode::BAD_REQUEST,
            "missing_parameters",
            format!("{MISSING_PARAMETERS}: {fields}"),
        ),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::InvalidEnum { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_value", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 listing the absent request fields.
pub fn missing_parameters(fields: &[&str]) -> axum::response::Response {
    domain_error_to_response(DomainError::missing(fields))
}

/// Lookups that match nothing still answer 200, with a message instead of a record.
pub fn party_not_found() -> axum::response::Response {
    (
        StatusCode::OK,
        axum::Json(json!({ "message": PARTY_NOT_FOUND })),
    )
        .into_response()
}

pub fn parse_party_type(s: &str) -> Result<PartyType, axum::response::Response> {
    s.trim()
        .parse::<PartyType>()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_party_type", INVALID_PARTY_TYPE))
}

pub fn parse_store_id(s: &str) -> Result<StoreId, axum::response::Response> {
    s.parse::<StoreId>()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_store_id", INVALID_STORE_ID))
}

pub fn parse_party_id(s: &str) -> Result<PartyId, axum::response::Response> {
    s.parse::<PartyId>()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_party_id", INVALID_PARTY_ID))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_service_errors_to_statuses() {
        let cases = [
            (ServiceError::Duplicate("x".into()), StatusCode::CONFLICT),
            (ServiceError::InvalidId("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NoRecords("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ServiceError::Domain(DomainError::missing(&["name"])),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn parse_helpers_reject_garbage() {
        assert!(parse_party_type("customer").is_ok());
        assert_eq!(
            parse_party_type("vendor").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(parse_store_id("not-a-uuid").is_err());
        assert!(parse_party_id(&PartyId::new().to_string()).is_ok());
    }

    #[test]
    fn not_found_is_a_success_status() {
        assert_eq!(party_not_found().status(), StatusCode::OK);
    }
}
