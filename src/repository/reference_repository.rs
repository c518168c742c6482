use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{slugify, Category, School},
    error::{is_unique_violation, AppError, Result},
    repository::util::{parse_id, utc},
};

/// Schools and mission categories. Read-mostly reference data.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn create_school(&self, name: &str, city: Option<&str>) -> Result<School>;
    async fn find_school(&self, id: Uuid) -> Result<Option<School>>;
    async fn create_category(&self, name: &str) -> Result<Category>;
}

#[derive(FromRow)]
struct SchoolRow {
    id: String,
    name: String,
    city: Option<String>,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    created_at: NaiveDateTime,
}

pub struct SqliteReferenceRepository {
    pool: SqlitePool,
}

impl SqliteReferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for SqliteReferenceRepository {
    async fn create_school(&self, name: &str, city: Option<&str>) -> Result<School> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO schools (id, name, city, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(city)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        self.find_school(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created school".to_string())
        })
    }

    async fn find_school(&self, id: Uuid) -> Result<Option<School>> {
        let row = sqlx::query_as::<_, SchoolRow>(
            "SELECT id, name, city, created_at FROM schools WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(School {
                id: parse_id(&r.id)?,
                name: r.name,
                city: r.city,
                created_at: utc(r.created_at),
            })
        })
        .transpose()
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let id = Uuid::new_v4();
        let slug = slugify(name);

        sqlx::query("INSERT INTO categories (id, name, slug, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(&slug)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Category '{}' already exists", slug))
                } else {
                    AppError::Database(e.to_string())
                }
            })?;

        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at FROM categories WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(Category {
            id: parse_id(&row.id)?,
            name: row.name,
            slug: row.slug,
            created_at: utc(row.created_at),
        })
    }
}
