use chrono::{Days, Utc};
use inventa_api::{
    config::AuthSettings,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
        borrowings::CreateBorrowingRequest,
        categories::CreateCategoryRequest,
        items::{CreateItemRequest, UpdateItemRequest},
    },
    entity::{
        sea_orm_active_enums::{ItemStatus, Role},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    routes::params::{ActivityQuery, ItemQuery},
    services::{auth_service, borrowing_service, category_service, item_service, stats_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Integration flow: register and log in, manage categories and items, then read the dashboards.
#[tokio::test]
async fn accounts_catalogue_and_dashboards() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let tag = Uuid::new_v4().simple().to_string();
    let nim = tag[..12].to_string();
    let email = format!("{}@student.ac.id", &tag[..12]);

    // Registration always yields a regular user.
    let registered = auth_service::register_user(&state, register(&nim, &email)).await?;
    let payload = registered.data.expect("auth payload");
    assert_eq!(payload.user.role, Role::User);
    assert_eq!(payload.user.total_borrowings, 0);
    let student = decode_token(&payload.token, &state.auth.jwt_secret)?;
    assert_eq!(student.user_id, payload.user.id);

    let err = auth_service::register_user(&state, register(&nim, "other@student.ac.id"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Login works with either the e-mail address or the NIM.
    for identifier in [email.to_uppercase(), nim.clone()] {
        let login = auth_service::login_user(
            &state,
            LoginRequest {
                email: identifier,
                password: "secret123".into(),
            },
        )
        .await?;
        assert_eq!(login.data.expect("login").user.id, student.user_id);
    }
    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let profile = auth_service::update_profile(
        &state,
        &student,
        UpdateProfileRequest {
            name: Some("Siti Rahma".into()),
            phone: Some("08123456789".into()),
            faculty: None,
            program: None,
            avatar_url: None,
        },
    )
    .await?
    .data
    .expect("profile");
    assert_eq!(profile.name, "Siti Rahma");
    assert_eq!(profile.faculty.as_deref(), Some("Teknik"));

    let err = auth_service::change_password(
        &state,
        &student,
        ChangePasswordRequest {
            current_password: "not-it".into(),
            new_password: "newsecret".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    auth_service::change_password(
        &state,
        &student,
        ChangePasswordRequest {
            current_password: "secret123".into(),
            new_password: "newsecret".into(),
        },
    )
    .await?;
    auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "newsecret".into(),
        },
    )
    .await?;

    // Only admins curate the catalogue.
    let admin = AuthUser {
        user_id: create_admin(&state, &tag).await?,
        role: Role::Admin,
    };
    let category_name = format!("Kategori {}", &tag[..8]);
    let err = category_service::create_category(&state, &student, category(&category_name))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let created = category_service::create_category(&state, &admin, category(&category_name))
        .await?
        .data
        .expect("category");
    let err = category_service::create_category(&state, &admin, category(&category_name))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Stock invariants hold on create and update.
    let err = item_service::create_item(&state, &admin, item(&category_name, 2, Some(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let camera = item_service::create_item(&state, &admin, item(&category_name, 4, None))
        .await?
        .data
        .expect("item");
    assert_eq!(camera.available, 4);

    let err = item_service::update_item(
        &state,
        &admin,
        camera.id,
        UpdateItemRequest {
            total: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The category cannot go while an item still names it.
    let err = category_service::delete_category(&state, &admin, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Search matches name case-insensitively and filters by category.
    let found = item_service::list_items(
        &state,
        ItemQuery {
            q: Some(tag[..8].to_uppercase()),
            category: Some(category_name.clone()),
            ..Default::default()
        },
    )
    .await?;
    let listed = found.data.expect("items").items;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, camera.id);
    assert_eq!(found.meta.and_then(|m| m.total), Some(1));

    // Items under maintenance cannot be requested.
    item_service::update_item(
        &state,
        &admin,
        camera.id,
        UpdateItemRequest {
            status: Some(ItemStatus::Maintenance),
            ..Default::default()
        },
    )
    .await?;
    let err = borrowing_service::create_borrowing(
        &state,
        &student,
        CreateBorrowingRequest {
            item_id: camera.id,
            quantity: 1,
            return_date: Utc::now().date_naive() + Days::new(3),
            purpose: None,
            notes: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    item_service::update_item(
        &state,
        &admin,
        camera.id,
        UpdateItemRequest {
            status: Some(ItemStatus::Available),
            ..Default::default()
        },
    )
    .await?;
    let request = borrowing_service::create_borrowing(
        &state,
        &student,
        CreateBorrowingRequest {
            item_id: camera.id,
            quantity: 1,
            return_date: Utc::now().date_naive() + Days::new(3),
            purpose: Some("Dokumentasi".into()),
            notes: None,
        },
    )
    .await?
    .data
    .expect("borrowing");

    // Dashboards reflect the caller's borrowings and the catalogue.
    let mine = stats_service::user_dashboard(&state, &student)
        .await?
        .data
        .expect("user stats");
    assert_eq!(mine.total_borrowings, 1);
    assert_eq!(mine.pending_borrowings, 1);
    assert!(mine.total_items >= 1);

    let err = stats_service::admin_dashboard(&state, &student)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let overview = stats_service::admin_dashboard(&state, &admin)
        .await?
        .data
        .expect("admin stats");
    assert!(overview.total_users >= 1);
    assert!(overview.pending_borrowings >= 1);

    let activities = stats_service::recent_activities(
        &state,
        &admin,
        ActivityQuery { limit: Some(50) },
    )
    .await?
    .data
    .expect("activities")
    .items;
    assert!(activities.iter().any(|a| a.id == request.id));

    // Clean up so the category can be removed.
    item_service::delete_item(&state, &admin, camera.id).await?;
    category_service::delete_category(&state, &admin, created.id).await?;
    let err = category_service::delete_category(&state, &admin, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

fn register(nim: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Siti".into(),
        nim: nim.into(),
        email: email.into(),
        password: "secret123".into(),
        phone: None,
        faculty: Some("Teknik".into()),
        program: Some("Informatika".into()),
    }
}

fn category(name: &str) -> CreateCategoryRequest {
    CreateCategoryRequest {
        name: name.into(),
        icon: Some("📷".into()),
    }
}

fn item(category: &str, total: i32, available: Option<i32>) -> CreateItemRequest {
    CreateItemRequest {
        name: format!("Kamera {category}"),
        category: category.into(),
        description: Some("Kamera mirrorless".into()),
        image: None,
        total,
        available,
        condition: None,
        status: None,
        location: "Studio Media".into(),
    }
}

async fn create_admin(state: &AppState, tag: &str) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let admin = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Admin Lab".into()),
        nim: Set(format!("ADM{}", &tag[12..24])),
        email: Set(format!("admin-{}@inventa.test", &tag[12..24])),
        password_hash: Set(
            auth_service::hash_password("admin123").map_err(|e| anyhow::anyhow!(e.to_string()))?,
        ),
        phone: Set(None),
        faculty: Set(None),
        program: Set(None),
        avatar_url: Set(None),
        role: Set(Role::Admin),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(admin.id)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url, 5).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(
        orm,
        AuthSettings {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        },
    ))
}
