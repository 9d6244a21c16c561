use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::info;

use crate::api::{
    APIResponse, AddBookRequest, BorrowRequest, ReturnRequest, ScanRequest, SearchParams,
    SessionRequest,
};
use crate::config::Config;
use crate::error::{HandlerError, LibraryError};
use crate::isbn::Isbn;
use crate::library::LibraryClient;
use crate::lookup::BookLookup;
use crate::model::{LibraryBook, LibraryStatus, NewBook, NewLoan, ScanResult};
use crate::render::{filter_books, render_books, render_overdue};
use crate::scanner::{ScanOutcome, ScanSessions, ScannerSettings};
use crate::view::{PanelLoad, View};

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<LibraryClient>,
    pub lookup: Arc<BookLookup>,
    pub scans: Arc<ScanSessions>,
    /// Last inventory fetched, used for search-as-you-type without a round trip.
    pub books: Arc<RwLock<Option<Vec<LibraryBook>>>>,
    pub settings: Arc<ScannerSettings>,
    pub covers_url: String,
    pub library_name: String,
}

impl AppState {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.app.request_timeout())
            .user_agent(concat!("shelfmark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(AppState {
            library: Arc::new(LibraryClient::new(client.clone(), cfg.library.api_url.clone())),
            lookup: Arc::new(BookLookup::new(client, cfg.providers.clone())),
            scans: Arc::new(ScanSessions::new(cfg.app.scan_debounce())),
            books: Arc::new(RwLock::new(None)),
            settings: Arc::new(ScannerSettings::default()),
            covers_url: cfg.providers.covers_url.clone(),
            library_name: cfg.library.name.clone(),
        })
    }

    async fn refresh_books(&self) -> Result<Vec<LibraryBook>, LibraryError> {
        let books = self.library.get_books().await?;
        *self.books.write().await = Some(books.clone());
        Ok(books)
    }

    async fn cached_books(&self) -> Result<Vec<LibraryBook>, LibraryError> {
        if let Some(books) = self.books.read().await.as_ref() {
            return Ok(books.clone());
        }
        self.refresh_books().await
    }

    async fn invalidate_books(&self) {
        *self.books.write().await = None;
    }
}

type HandlerResult = Result<Response, HandlerError>;

const LOAD_FAILED_BOOKS: &str = r#"<p class="empty-state">Failed to load books</p>"#;
const LOAD_FAILED: &str = r#"<p class="empty-state">Failed to load</p>"#;

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new_from_msg("ok"))
}

pub async fn scanner_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(APIResponse::ok("ok", state.settings.as_ref().clone()))
}

pub async fn scan(State(state): State<AppState>, Json(req): Json<ScanRequest>) -> HandlerResult {
    if req.session.trim().is_empty() {
        return Err(HandlerError::Validation("session is required".to_string()));
    }

    let isbn = match state.scans.offer(&req.session, &req.text) {
        ScanOutcome::Accepted(isbn) => isbn,
        ScanOutcome::Ignored => {
            return Ok(Json(APIResponse::new_from_msg("ignored")).into_response());
        }
        ScanOutcome::Rejected(reason) => {
            tracing::debug!(session = %req.session, raw = %req.text, reason = %reason, "read is not an isbn");
            let body = APIResponse::<()> {
                status: "rejected".to_string(),
                data: None,
                error: Some(reason.to_string()),
            };
            return Ok(Json(body).into_response());
        }
    };

    info!(session = %req.session, isbn = %isbn, checksum_ok = isbn.has_valid_checksum(), "isbn scanned");

    let book = state.lookup.lookup(&isbn).await;
    let status = state.library.get_book(&isbn).await;
    let result = ScanResult::new(isbn, book, status);

    Ok(Json(APIResponse::ok("accepted", result)).into_response())
}

pub async fn reset_scan(State(state): State<AppState>, Json(req): Json<SessionRequest>) -> HandlerResult {
    state.scans.reset(&req.session);
    Ok(Json(APIResponse::new_from_msg("ready")).into_response())
}

pub async fn lookup_book(State(state): State<AppState>, Path(isbn): Path<String>) -> HandlerResult {
    let isbn = Isbn::from_scan(&isbn)?;
    let book = state.lookup.lookup(&isbn).await;
    Ok(Json(APIResponse::ok("ok", book)).into_response())
}

pub async fn book_status(State(state): State<AppState>, Path(isbn): Path<String>) -> HandlerResult {
    let isbn = Isbn::from_scan(&isbn)?;
    let status: LibraryStatus = state.library.get_book(&isbn).await;
    Ok(Json(APIResponse::ok(&status.label(), status)).into_response())
}

pub async fn list_books(State(state): State<AppState>) -> HandlerResult {
    let books = state.refresh_books().await?;
    info!(count = books.len(), "got books");
    Ok(Json(APIResponse::ok("got books", books)).into_response())
}

/// Without a query the inventory is refetched; with one, the cached copy is filtered.
pub async fn books_fragment(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.unwrap_or_default();
    let books = if query.is_empty() {
        state.refresh_books().await
    } else {
        state.cached_books().await
    };

    match books {
        Ok(books) => {
            let matches = filter_books(&books, &query);
            Html(render_books(&matches, &state.covers_url)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load books");
            (StatusCode::BAD_GATEWAY, Html(LOAD_FAILED_BOOKS)).into_response()
        }
    }
}

pub async fn add_book(State(state): State<AppState>, Json(req): Json<AddBookRequest>) -> HandlerResult {
    let isbn = Isbn::from_scan(&req.isbn)?;
    let book = NewBook::validate(isbn, &req.title, &req.author, &req.donor)?;

    state.library.add_book(&book).await?;
    state.invalidate_books().await;
    info!(isbn = %book.isbn, title = %book.title, "book added");

    let status = ScanStatus::after_write(LibraryStatus::Available, false);
    Ok(Json(APIResponse::ok("Book added to library!", status)).into_response())
}

pub async fn borrow(State(state): State<AppState>, Json(req): Json<BorrowRequest>) -> HandlerResult {
    let isbn = Isbn::from_scan(&req.isbn)?;
    let loan = NewLoan::validate(isbn, &req.title, &req.author, &req.borrower_name, &req.whatsapp)?;

    state.library.borrow(&loan).await?;
    state.invalidate_books().await;
    if let Some(session) = req.session.as_deref() {
        state.scans.reset(session);
    }
    info!(isbn = %loan.isbn, "book borrowed");

    let status = LibraryStatus::Borrowed {
        borrower: Some(loan.borrower_name),
    };
    Ok(Json(APIResponse::ok("Book borrowed successfully!", ScanStatus::after_write(status, true))).into_response())
}

pub async fn return_book(State(state): State<AppState>, Json(req): Json<ReturnRequest>) -> HandlerResult {
    let isbn = Isbn::from_scan(&req.isbn)?;

    state.library.return_book(&isbn).await?;
    state.invalidate_books().await;
    if let Some(session) = req.session.as_deref() {
        state.scans.reset(session);
    }
    info!(isbn = %isbn, "book returned");

    Ok(Json(APIResponse::ok(
        "Book returned successfully!",
        ScanStatus::after_write(LibraryStatus::Available, true),
    ))
    .into_response())
}

pub async fn list_overdue(State(state): State<AppState>) -> HandlerResult {
    let overdue = state.library.get_overdue().await?;
    Ok(Json(APIResponse::ok("got overdue", overdue)).into_response())
}

pub async fn overdue_fragment(State(state): State<AppState>) -> Response {
    match state.library.get_overdue().await {
        Ok(loans) => Html(render_overdue(&loans, &state.covers_url, &state.library_name)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to load overdue loans");
            (StatusCode::BAD_GATEWAY, Html(LOAD_FAILED)).into_response()
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ViewParams {
    pub session: Option<String>,
}

pub async fn switch_view(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ViewParams>,
) -> HandlerResult {
    let view: View = name.parse().map_err(HandlerError::NotFound)?;
    let effects = view.on_enter();

    if effects.stop_scanner {
        if let Some(session) = params.session.as_deref() {
            state.scans.reset(session);
        }
    }

    let response = match effects.load {
        PanelLoad::ResetScan => {
            if let Some(session) = params.session.as_deref() {
                state.scans.reset(session);
            }
            Html(r#"<div class="scan-start"><p>Scan a book's ISBN barcode to begin</p></div>"#)
                .into_response()
        }
        PanelLoad::Books => books_fragment(State(state), Query(SearchParams { q: None })).await,
        PanelLoad::Overdue => overdue_fragment(State(state)).await,
    };

    Ok(response)
}

/// Status after a write, in the same shape the scan result uses. When
/// `restart_scan` is set the desk is done with this book and goes back to the
/// scan start panel.
#[derive(Debug, serde::Serialize)]
pub struct ScanStatus {
    pub status: LibraryStatus,
    pub status_label: String,
    pub action: crate::model::LoanAction,
    pub restart_scan: bool,
}

impl ScanStatus {
    pub fn after_write(status: LibraryStatus, restart_scan: bool) -> Self {
        ScanStatus {
            status_label: status.label(),
            action: status.next_action(),
            status,
            restart_scan,
        }
    }
}
