use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use partyhub_parties::{ListQuery, RawListParams, GST_TYPES};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/create", post(create_party))
        .route("/update", put(update_party))
        .route("/delete", post(delete_parties))
        .route("/gst-types", get(gst_types))
        .route("/balance/:store_id/:party_type", get(total_balance))
        .route("/:store_id/:party_type", get(list_parties))
        .route("/:store_id/:party_type/:party_id", get(get_party))
}

/// An unreadable body is reported the same way as an empty one.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "request body rejected");
            T::default()
        }
    }
}

pub async fn create_party(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreatePartyRequest>, JsonRejection>,
) -> axum::response::Response {
    let cmd = match body_or_default(body).into_command() {
        Ok(cmd) => cmd,
        Err(resp) => return resp,
    };

    match services.parties.create(cmd).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_party(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::UpdatePartyRequest>, JsonRejection>,
) -> axum::response::Response {
    let update = match body_or_default(body).into_update() {
        Ok(update) => update,
        Err(resp) => return resp,
    };

    match services
        .parties
        .update(update.party_id, update.party_type, &update.patch)
        .await
    {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => errors::party_not_found(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_parties(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::DeletePartiesRequest>, JsonRejection>,
) -> axum::response::Response {
    let cmd = match body_or_default(body).into_command() {
        Ok(cmd) => cmd,
        Err(resp) => return resp,
    };

    match services.parties.soft_delete(cmd).await {
        Ok(deleted) => (StatusCode::OK, Json(dto::SoftDeleteResponse { deleted })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn gst_types() -> axum::response::Response {
    (StatusCode::OK, Json(GST_TYPES)).into_response()
}

pub async fn total_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path((store_id, party_type)): Path<(String, String)>,
) -> axum::response::Response {
    let party_type = match errors::parse_party_type(&party_type) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let store_id = match errors::parse_store_id(&store_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.parties.total_balance(store_id, party_type).await {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_parties(
    Extension(services): Extension<Arc<AppServices>>,
    Path((store_id, party_type)): Path<(String, String)>,
    Query(params): Query<RawListParams>,
) -> axum::response::Response {
    let party_type = match errors::parse_party_type(&party_type) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let store_id = match errors::parse_store_id(&store_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let query = ListQuery::from_raw(&params);

    match services.parties.list(store_id, party_type, &query).await {
        Ok(page) => (StatusCode::OK, Json(dto::PartyListResponse::new(page, &query))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_party(
    Extension(services): Extension<Arc<AppServices>>,
    Path((store_id, party_type, party_id)): Path<(String, String, String)>,
) -> axum::response::Response {
    let party_type = match errors::parse_party_type(&party_type) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let store_id = match errors::parse_store_id(&store_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let party_id = match errors::parse_party_id(&party_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.parties.get_by_id(store_id, party_id, party_type).await {
        Ok(Some(details)) => (StatusCode::OK, Json(details)).into_response(),
        Ok(None) => errors::party_not_found(),
        Err(e) => errors::service_error_to_response(e),
    }
}
