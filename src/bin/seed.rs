use chrono::Utc;
use inventa_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        categories, items,
        sea_orm_active_enums::{ItemCondition, ItemStatus, Role},
        users,
    },
    services::auth_service::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin Inventa", "ADMIN001", "admin@inventa.ac.id", "admin123", Role::Admin).await?;
    let user_id = ensure_user(&orm, "Ahmad Fauzi", "2021010001", "ahmad@student.ac.id", "user123", Role::User).await?;
    seed_categories(&orm).await?;
    seed_items(&orm, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    name: &str,
    nim: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already exists");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        nim: Set(nim.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        phone: Set(None),
        faculty: Set(None),
        program: Set(None),
        avatar_url: Set(None),
        role: Set(role),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role={role:?})");
    Ok(user.id)
}

async fn seed_categories(orm: &OrmConn) -> anyhow::Result<()> {
    let defaults = [
        ("Elektronik", "💻"),
        ("Olahraga", "⚽"),
        ("Laboratorium", "🔬"),
        ("Multimedia", "🎥"),
        ("Furniture", "🪑"),
        ("Alat Tulis", "✏️"),
    ];

    for (name, icon) in defaults {
        let exists = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            icon: Set(Some(icon.to_string())),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_items(orm: &OrmConn, admin_id: Uuid) -> anyhow::Result<()> {
    let catalogue = [
        ("Laptop Dell Latitude", "Elektronik", "Laptop untuk presentasi dan praktikum", "💻", 10, "Lab Komputer 1"),
        ("Proyektor Epson", "Multimedia", "Proyektor ruang kelas 3000 lumen", "📽️", 5, "Gedung B"),
        ("Kamera Canon EOS", "Multimedia", "Kamera DSLR untuk dokumentasi kegiatan", "📷", 3, "Studio Media"),
        ("Bola Basket", "Olahraga", "Bola basket ukuran 7", "🏀", 12, "Gudang Olahraga"),
        ("Mikroskop Binokuler", "Laboratorium", "Mikroskop untuk praktikum biologi", "🔬", 6, "Lab Biologi"),
        ("Kursi Lipat", "Furniture", "Kursi lipat untuk acara", "🪑", 40, "Gudang Umum"),
    ];

    for (name, category, description, image, total, location) in catalogue {
        let exists = items::Entity::find()
            .filter(items::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let now = Utc::now();
        items::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            category: Set(category.to_string()),
            description: Set(Some(description.to_string())),
            image: Set(Some(image.to_string())),
            total: Set(total),
            available: Set(total),
            condition: Set(ItemCondition::Good),
            status: Set(ItemStatus::Available),
            location: Set(location.to_string()),
            created_by_id: Set(Some(admin_id)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded items");
    Ok(())
}
