use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        borrowings::{BorrowingList, CreateBorrowingRequest, SweepResult, UpdateBorrowingStatusRequest},
        stats::BorrowingStats,
    },
    error::AppResult,
    middleware::{auth::AuthUser, extract::{AppJson, AppPath, AppQuery}},
    models::Borrowing,
    response::ApiResponse,
    routes::params::BorrowingQuery,
    services::{borrowing_service, stats_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_borrowings).post(create_borrowing))
        .route("/me", get(my_borrowings))
        .route("/my", get(my_borrowings))
        .route("/check-overdue", post(check_overdue))
        .route("/stats", get(borrowing_stats))
        .route("/{id}", get(get_borrowing).put(update_status))
        .route("/{id}/status", put(update_status))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
        .route("/{id}/return", post(return_borrowing))
}

#[utoipa::path(
    post,
    path = "/api/borrowings",
    request_body = CreateBorrowingRequest,
    responses(
        (status = 201, description = "Borrowing request created", body = ApiResponse<Borrowing>),
        (status = 400, description = "Item unavailable, not enough stock or past return date"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn create_borrowing(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateBorrowingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Borrowing>>)> {
    let resp = borrowing_service::create_borrowing(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/borrowings/me",
    params(BorrowingQuery),
    responses(
        (status = 200, description = "Caller's borrowings", body = ApiResponse<BorrowingList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn my_borrowings(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<BorrowingQuery>,
) -> AppResult<Json<ApiResponse<BorrowingList>>> {
    let resp = borrowing_service::list_my_borrowings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/borrowings",
    params(BorrowingQuery),
    responses(
        (status = 200, description = "All borrowings with borrower details", body = ApiResponse<BorrowingList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn list_all_borrowings(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<BorrowingQuery>,
) -> AppResult<Json<ApiResponse<BorrowingList>>> {
    let resp = borrowing_service::list_all_borrowings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/borrowings/{id}",
    params(
        ("id" = Uuid, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Get borrowing", body = ApiResponse<Borrowing>),
        (status = 404, description = "Borrowing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn get_borrowing(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Borrowing>>> {
    let resp = borrowing_service::get_borrowing(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/borrowings/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Borrowing ID")
    ),
    request_body = UpdateBorrowingStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Borrowing>),
        (status = 400, description = "Transition not allowed or not enough stock"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Borrowing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateBorrowingStatusRequest>,
) -> AppResult<Json<ApiResponse<Borrowing>>> {
    let resp = borrowing_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/borrowings/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Approved", body = ApiResponse<Borrowing>),
        (status = 400, description = "Not pending or not enough stock"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Borrowing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Borrowing>>> {
    let resp = borrowing_service::approve(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/borrowings/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Rejected", body = ApiResponse<Borrowing>),
        (status = 400, description = "Not pending"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Borrowing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Borrowing>>> {
    let resp = borrowing_service::reject(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/borrowings/{id}/return",
    params(
        ("id" = Uuid, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Returned and restocked", body = ApiResponse<Borrowing>),
        (status = 400, description = "Not on loan"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Borrowing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn return_borrowing(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Borrowing>>> {
    let resp = borrowing_service::return_borrowing(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/borrowings/check-overdue",
    responses(
        (status = 200, description = "Approved borrowings past their return date marked overdue", body = ApiResponse<SweepResult>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn check_overdue(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SweepResult>>> {
    let resp = borrowing_service::check_overdue(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/borrowings/stats",
    responses(
        (status = 200, description = "Borrowing counts by status", body = ApiResponse<BorrowingStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn borrowing_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BorrowingStats>>> {
    let resp = stats_service::borrowing_stats(&state, &user).await?;
    Ok(Json(resp))
}
