use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthSettings,
    dto::auth::{
        AuthPayload, ChangePasswordRequest, Claims, LoginRequest, RegisterRequest,
        UpdateProfileRequest,
    },
    entity::{
        borrowings::{Column as BorrowCol, Entity as Borrowings},
        sea_orm_active_enums::{BorrowingStatus, Role},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BorrowingCounters, User},
    response::ApiResponse,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email/NIM or password";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(settings: &AuthSettings, user: &UserModel) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Counts a user's borrowings. `active` covers everything still holding stock.
pub async fn borrowing_counters<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<BorrowingCounters> {
    let total = Borrowings::find()
        .filter(BorrowCol::UserId.eq(user_id))
        .count(conn)
        .await? as i64;
    let active = Borrowings::find()
        .filter(BorrowCol::UserId.eq(user_id))
        .filter(BorrowCol::Status.is_in(BorrowingStatus::holding_stock()))
        .count(conn)
        .await? as i64;
    Ok(BorrowingCounters { total, active })
}

async fn user_view<C: ConnectionTrait>(conn: &C, model: UserModel) -> AppResult<User> {
    let counters = borrowing_counters(conn, model.id).await?;
    Ok(User::from_entity(model, counters))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    payload.validate()?;
    let RegisterRequest {
        name,
        nim,
        email,
        password,
        phone,
        faculty,
        program,
    } = payload;
    let email = email.trim().to_lowercase();
    let nim = nim.trim().to_string();

    let exist = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Email.eq(email.as_str()))
                .add(UserCol::Nim.eq(nim.as_str())),
        )
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email or NIM is already registered".into()));
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        nim: Set(nim),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        phone: Set(non_blank(phone)),
        faculty: Set(non_blank(faculty)),
        program: Set(non_blank(program)),
        avatar_url: Set(None),
        role: Set(Role::User),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");

    let token = issue_token(&state.auth, &user)?;
    let user = User::from_entity(user, BorrowingCounters::default());
    Ok(ApiResponse::success(
        "Registration successful",
        AuthPayload { user, token },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    payload.validate()?;
    let LoginRequest { email, password } = payload;
    let identifier = email.trim();

    let user = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Email.eq(identifier.to_lowercase()))
                .add(UserCol::Nim.eq(identifier)),
        )
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = issue_token(&state.auth, &user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    let user = user_view(&state.orm, user).await?;
    Ok(ApiResponse::success(
        "Login successful",
        AuthPayload { user, token },
        None,
    ))
}

async fn find_user(state: &AppState, user_id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = find_user(state, user.user_id).await?;
    let profile = user_view(&state.orm, model).await?;
    Ok(ApiResponse::success("Profile", profile, None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let existing = find_user(state, user.user_id).await?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        active.name = Set(name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(non_blank(Some(phone)));
    }
    if let Some(faculty) = payload.faculty {
        active.faculty = Set(non_blank(Some(faculty)));
    }
    if let Some(program) = payload.program {
        active.program = Set(non_blank(Some(program)));
    }
    if let Some(avatar_url) = payload.avatar_url {
        active.avatar_url = Set(non_blank(Some(avatar_url)));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    let profile = user_view(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "Profile updated",
        profile,
        None,
    ))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let existing = find_user(state, user.user_id).await?;

    if !verify_password(&payload.current_password, &existing.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    tracing::info!(user_id = %user.user_id, "password changed");
    Ok(ApiResponse::success(
        "Password changed",
        serde_json::json!({}),
        None,
    ))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;
    use chrono::FixedOffset;

    fn sample_user(role: Role) -> UserModel {
        let now = Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap());
        UserModel {
            id: Uuid::new_v4(),
            name: "Ahmad".into(),
            nim: "2021010001".into(),
            email: "ahmad@inventa.test".into(),
            password_hash: String::new(),
            phone: None,
            faculty: None,
            program: None,
            avatar_url: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn issued_token_decodes_to_same_user() {
        let settings = AuthSettings {
            jwt_secret: "unit-test-secret".into(),
            token_ttl_hours: 1,
        };
        let user = sample_user(Role::Admin);
        let token = issue_token(&settings, &user).unwrap();

        let decoded = decode_token(&token, "unit-test-secret").unwrap();
        assert_eq!(decoded.user_id, user.id);
        assert!(decoded.is_admin());

        let err = decode_token(&token, "another-secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Teknik ".into())), Some("Teknik".into()));
    }
}
