// Expense Tracker - Web Server
// JSON API over the same store the terminal UI uses

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use expense_tracker::config::SETTINGS_FILE;
use expense_tracker::{
    logging, summarize, Expense, ExpenseForm, ExpenseStats, ExpenseStore, Settings, Storage,
    ValidInput,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

type SharedStore = Arc<Mutex<ExpenseStore<Box<dyn Storage + Send>>>>;

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: SharedStore,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn respond<T: Serialize>(status: StatusCode, body: ApiResponse<T>) -> Response {
    (status, Json(body)).into_response()
}

fn storage_error(e: anyhow::Error) -> Response {
    error!(error = %format!("{:#}", e), "Failed to persist expenses");
    respond(
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiResponse::<()>::err("Failed to save expenses"),
    )
}

/// Body for POST /api/expenses and PUT /api/expenses/:id
#[derive(Deserialize)]
struct ExpenseRequest {
    description: String,
    amount: String,
    category: String,
}

impl ExpenseRequest {
    /// Same rules as the form: all fields present, amount a non-negative number
    fn validate(self) -> Option<ValidInput> {
        let mut form = ExpenseForm::new();
        form.description = self.description;
        form.amount = self.amount;
        form.category = self.category.parse().ok();
        form.validate()
    }
}

/// Expense as rendered in the list
#[derive(Serialize)]
struct ExpenseResponse {
    id: i64,
    description: String,
    amount: String,
    display_amount: String,
    category: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            display_amount: expense.display_amount(),
            id: expense.id,
            description: expense.description,
            amount: expense.amount,
            category: expense.category.to_string(),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses - All expenses in insertion order
async fn list_expenses(State(state): State<AppState>) -> Response {
    let store = state.store.lock().unwrap_or_else(|e| e.into_inner());
    let response: Vec<ExpenseResponse> = store.list().iter().cloned().map(Into::into).collect();
    respond(StatusCode::OK, ApiResponse::ok(response))
}

/// POST /api/expenses - Add an expense
async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<ExpenseRequest>,
) -> Response {
    let Some(input) = request.validate() else {
        return respond(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiResponse::<()>::err("description, amount and category are required"),
        );
    };

    let mut store = state.store.lock().unwrap_or_else(|e| e.into_inner());
    match store.add(&input.description, &input.amount, input.category) {
        Ok(expense) => {
            info!(id = expense.id, "Expense added");
            respond(StatusCode::CREATED, ApiResponse::ok(ExpenseResponse::from(expense)))
        }
        Err(e) => storage_error(e),
    }
}

/// PUT /api/expenses/:id - Replace an expense's fields
async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ExpenseRequest>,
) -> Response {
    let Some(input) = request.validate() else {
        return respond(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiResponse::<()>::err("description, amount and category are required"),
        );
    };

    let mut store = state.store.lock().unwrap_or_else(|e| e.into_inner());
    match store.update(id, &input.description, &input.amount, input.category) {
        Ok(true) => {
            info!(id, "Expense updated");
            let expense = store.get(id).cloned().map(ExpenseResponse::from);
            respond(StatusCode::OK, ApiResponse::ok(expense))
        }
        Ok(false) => respond(
            StatusCode::NOT_FOUND,
            ApiResponse::<()>::err(format!("No expense with id {}", id)),
        ),
        Err(e) => storage_error(e),
    }
}

/// DELETE /api/expenses/:id - Remove an expense (missing ids are fine)
async fn delete_expense(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().unwrap_or_else(|e| e.into_inner());
    match store.remove(id) {
        Ok(removed) => {
            info!(id, removed, "Expense deleted");
            respond(StatusCode::OK, ApiResponse::ok(removed))
        }
        Err(e) => storage_error(e),
    }
}

/// GET /api/stats - Totals overall and per category
async fn get_stats(State(state): State<AppState>) -> Response {
    let store = state.store.lock().unwrap_or_else(|e| e.into_inner());
    let stats: ExpenseStats = summarize(store.list());
    respond(StatusCode::OK, ApiResponse::ok(stats))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stderr();

    let settings_file = std::env::var("EXPENSE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(SETTINGS_FILE));
    let settings = Settings::load(&settings_file)?;

    let store = ExpenseStore::load(settings.open_storage()?)?;
    info!(
        backend = ?settings.backend,
        path = %settings.data_path.display(),
        count = store.len(),
        "Storage opened"
    );

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_bind).await?;
    info!(addr = %settings.server_bind, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
