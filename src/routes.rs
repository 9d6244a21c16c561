use axum::http::Method;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::assets::serve_embedded;
use crate::handler::{
    AppState, add_book, book_status, books_fragment, borrow, healthcheck, list_books, list_overdue,
    lookup_book, overdue_fragment, reset_scan, return_book, scan, scanner_settings, switch_view,
};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(healthcheck))
        .route("/scanner/settings", get(scanner_settings))
        .route("/scan", post(scan))
        .route("/scan/reset", post(reset_scan))
        .route("/lookup/:isbn", get(lookup_book))
        .route("/library/books", get(list_books).post(add_book))
        .route("/library/books.html", get(books_fragment))
        .route("/library/books/:isbn", get(book_status))
        .route("/library/borrow", post(borrow))
        .route("/library/return", post(return_book))
        .route("/library/overdue", get(list_overdue))
        .route("/library/overdue.html", get(overdue_fragment))
        .route("/views/:view", get(switch_view))
        .fallback(serve_embedded)
        .layer(cors)
        .with_state(state)
}
