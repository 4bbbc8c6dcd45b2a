use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::stats::{ActivityList, AdminDashboardStats, UserDashboardStats},
    error::AppResult,
    middleware::{auth::AuthUser, extract::AppQuery},
    response::ApiResponse,
    routes::params::ActivityQuery,
    services::stats_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user_dashboard))
        .route("/dashboard/user", get(user_dashboard))
        .route("/user/me", get(user_dashboard))
        .route("/dashboard/admin", get(admin_dashboard))
        .route("/activities", get(recent_activities))
        .route("/activities/recent", get(recent_activities))
}

#[utoipa::path(
    get,
    path = "/api/stats/dashboard/user",
    responses(
        (status = 200, description = "Catalogue totals and the caller's borrowing counts", body = ApiResponse<UserDashboardStats>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn user_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserDashboardStats>>> {
    let resp = stats_service::user_dashboard(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stats/dashboard/admin",
    responses(
        (status = 200, description = "Stock and borrowing totals", body = ApiResponse<AdminDashboardStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AdminDashboardStats>>> {
    let resp = stats_service::admin_dashboard(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stats/activities",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Most recently updated borrowings as activity entries", body = ApiResponse<ActivityList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn recent_activities(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ActivityQuery>,
) -> AppResult<Json<ApiResponse<ActivityList>>> {
    let resp = stats_service::recent_activities(&state, &user, query).await?;
    Ok(Json(resp))
}
