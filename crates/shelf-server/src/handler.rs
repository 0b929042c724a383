use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_sdk::{
    BookDetail, BookId, BookSummary, CollectionDetail, CollectionId, CollectionSummary, CoverId,
    Genre, LibraryError, LibraryResult, Page, ReviewEntry, ReviewId, ToggleResponse, UserId,
};

use crate::auth::Credentials;
use crate::error::{classify, ServerError, ServerResult};
use crate::state::{AppState, Caller};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub book_id: i64,
}

/// Toggle-style answer: the status follows the outcome, the body always
/// has the `{success, message}` shape.
fn toggle<T>(outcome: LibraryResult<T>, message: &str) -> (StatusCode, Json<ToggleResponse>) {
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::debug!(error = %e, "toggle rejected");
            classify(e).0
        }
    };
    (status, Json(ToggleResponse::from_outcome(&outcome, message)))
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "shelf-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ServerResult<Json<LoginResponse>> {
    let principal = state
        .with_library(move |lib| lib.authenticate(&req.login, &req.password))
        .await??
        .ok_or_else(|| ServerError::AuthFailed("invalid login or password".into()))?;
    let response = LoginResponse {
        user_id: principal.user_id,
        role: principal.role.clone(),
        token: state.sessions.issue(principal),
    };
    tracing::info!(user = response.user_id.get(), "signed in");
    Ok(Json(response))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<StatusCode> {
    match Credentials::from_headers(&headers)? {
        Credentials::Bearer(token) if state.sessions.revoke(&token) => Ok(StatusCode::NO_CONTENT),
        _ => Err(ServerError::AuthFailed("no session to end".into())),
    }
}

/// Delete an account and end every session it holds.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ServerResult<StatusCode> {
    let user_id = UserId::new(id);
    state
        .with_library(move |lib| lib.delete_user(caller.principal(), user_id))
        .await??;
    state.sessions.revoke_user(user_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_books_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ServerResult<Json<Page<BookSummary>>> {
    let page = state
        .with_library(move |lib| {
            let per_page = query.per_page.unwrap_or(lib.config().books_per_page);
            lib.list_books(query.page.unwrap_or(1), per_page)
        })
        .await??;
    Ok(Json(page))
}

pub async fn get_book_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ServerResult<Json<BookDetail>> {
    let detail = state
        .with_library(move |lib| lib.get_book(caller.principal(), BookId::new(id)))
        .await??;
    Ok(Json(detail))
}

pub async fn list_genres_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<Genre>>> {
    Ok(Json(state.with_library(|lib| lib.list_genres()).await??))
}

pub async fn post_review_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> ServerResult<(StatusCode, Json<serde_json::Value>)> {
    let review = state
        .with_library(move |lib| {
            lib.add_review(caller.principal(), BookId::new(id), req.rating, &req.text)
        })
        .await??;
    Ok((StatusCode::CREATED, Json(json!({ "id": review }))))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ServerResult<Json<serde_json::Value>> {
    let book = state
        .with_library(move |lib| lib.delete_review(caller.principal(), ReviewId::new(id)))
        .await??;
    Ok(Json(json!({ "book_id": book })))
}

pub async fn moderation_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> ServerResult<Json<Page<ReviewEntry>>> {
    let page = state
        .with_library(move |lib| {
            let per_page = query.per_page.unwrap_or(lib.config().reviews_per_page);
            lib.moderation_queue(caller.principal(), query.page.unwrap_or(1), per_page)
        })
        .await??;
    Ok(Json(page))
}

/// Collections of `?user_id=`, or of the caller when omitted.
pub async fn list_collections_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<OwnerQuery>,
) -> ServerResult<Json<Vec<CollectionSummary>>> {
    let owner = query
        .user_id
        .map(UserId::new)
        .or_else(|| caller.principal().map(|p| p.user_id))
        .ok_or_else(|| LibraryError::Unauthenticated("view collections".into()))?;
    let collections = state
        .with_library(move |lib| lib.list_collections(caller.principal(), owner))
        .await??;
    Ok(Json(collections))
}

pub async fn create_collection_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CollectionRequest>,
) -> ServerResult<(StatusCode, Json<ToggleResponse>)> {
    let outcome = state
        .with_library(move |lib| lib.create_collection(caller.principal(), &req.name))
        .await?;
    Ok(toggle(outcome, "Collection created."))
}

pub async fn get_collection_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ServerResult<Json<CollectionDetail>> {
    let detail = state
        .with_library(move |lib| lib.get_collection(caller.principal(), CollectionId::new(id)))
        .await??;
    Ok(Json(detail))
}

pub async fn add_to_collection_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(req): Json<MembershipRequest>,
) -> ServerResult<(StatusCode, Json<ToggleResponse>)> {
    let outcome = state
        .with_library(move |lib| {
            lib.add_book(
                caller.principal(),
                CollectionId::new(id),
                BookId::new(req.book_id),
            )
        })
        .await?;
    Ok(toggle(outcome, "The book was added to the collection."))
}

pub async fn remove_from_collection_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, book_id)): Path<(i64, i64)>,
) -> ServerResult<(StatusCode, Json<ToggleResponse>)> {
    let outcome = state
        .with_library(move |lib| {
            lib.remove_book(caller.principal(), CollectionId::new(id), BookId::new(book_id))
        })
        .await?;
    Ok(toggle(outcome, "The book was removed from the collection."))
}

/// Raw cover image with the content type recorded at upload.
pub async fn cover_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Response> {
    let (cover, bytes) = state
        .with_library(move |lib| lib.read_cover(CoverId::new(id)))
        .await??;
    Ok(([(CONTENT_TYPE, cover.mime_type)], bytes).into_response())
}
