use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthPayload, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
        borrowings::{BorrowingList, CreateBorrowingRequest, SweepResult, UpdateBorrowingStatusRequest},
        categories::{CategoryList, CreateCategoryRequest},
        items::{CreateItemRequest, ItemList, UpdateItemRequest},
        stats::{Activity, ActivityKind, ActivityList, AdminDashboardStats, BorrowingStats, UserDashboardStats},
    },
    entity::sea_orm_active_enums::{BorrowingStatus, ItemCondition, ItemStatus, Role},
    models::{Borrowing, Category, Deleted, Item, ItemSummary, User, UserSummary},
    response::{ApiResponse, ErrorBody, Meta},
    routes::{auth, borrowings, categories, health, items, params, stats},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::index,
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::change_password,
        items::list_items,
        items::popular_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        categories::list_categories,
        categories::create_category,
        categories::delete_category,
        borrowings::create_borrowing,
        borrowings::my_borrowings,
        borrowings::list_all_borrowings,
        borrowings::get_borrowing,
        borrowings::update_status,
        borrowings::approve,
        borrowings::reject,
        borrowings::return_borrowing,
        borrowings::check_overdue,
        borrowings::borrowing_stats,
        stats::user_dashboard,
        stats::admin_dashboard,
        stats::recent_activities
    ),
    components(
        schemas(
            User,
            Item,
            ItemSummary,
            UserSummary,
            Category,
            Borrowing,
            Deleted,
            Role,
            ItemCondition,
            ItemStatus,
            BorrowingStatus,
            RegisterRequest,
            LoginRequest,
            AuthPayload,
            UpdateProfileRequest,
            ChangePasswordRequest,
            CreateItemRequest,
            UpdateItemRequest,
            ItemList,
            CreateCategoryRequest,
            CategoryList,
            CreateBorrowingRequest,
            UpdateBorrowingStatusRequest,
            BorrowingList,
            SweepResult,
            UserDashboardStats,
            AdminDashboardStats,
            BorrowingStats,
            Activity,
            ActivityKind,
            ActivityList,
            params::SortOrder,
            params::ItemSortBy,
            params::BorrowingStatusFilter,
            Meta,
            ErrorBody,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<Borrowing>,
            ApiResponse<BorrowingList>,
            ApiResponse<AuthPayload>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness endpoints"),
        (name = "Auth", description = "Registration, login and profile endpoints"),
        (name = "Items", description = "Equipment catalogue endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Borrowings", description = "Borrowing workflow endpoints"),
        (name = "Stats", description = "Dashboard and activity endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
