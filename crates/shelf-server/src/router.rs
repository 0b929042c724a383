use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all catalog endpoints.
pub fn build_router(state: AppState, permissive_cors: bool) -> Router {
    let router = Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/login", post(handler::login_handler))
        .route("/v1/logout", post(handler::logout_handler))
        .route("/v1/users/:id", delete(handler::delete_user_handler))
        .route("/v1/books", get(handler::list_books_handler))
        .route("/v1/books/:id", get(handler::get_book_handler))
        .route("/v1/books/:id/reviews", post(handler::post_review_handler))
        .route("/v1/genres", get(handler::list_genres_handler))
        .route("/v1/covers/:id", get(handler::cover_handler))
        .route("/v1/reviews/:id", delete(handler::delete_review_handler))
        .route("/v1/moderation/reviews", get(handler::moderation_handler))
        .route(
            "/v1/collections",
            get(handler::list_collections_handler).post(handler::create_collection_handler),
        )
        .route("/v1/collections/:id", get(handler::get_collection_handler))
        .route(
            "/v1/collections/:id/books",
            post(handler::add_to_collection_handler),
        )
        .route(
            "/v1/collections/:id/books/:book_id",
            delete(handler::remove_from_collection_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
