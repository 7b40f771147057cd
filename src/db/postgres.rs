use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    db::store::{ActivityStore, TipStore, UserStore},
    error::{AppError, AppResult},
    models::{
        ActivityMetadata, ActivityRecord, Category, CategoryCounts, CategoryTotals, Counter,
        NewActivity, NewTip, NewUser, Tip, TipQuery, TipUpdate, TipWithAuthor, User,
    },
};

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

const TIP_COLUMNS: &str = "id, title, content, category, tags, author_id, likes_count, \
     shares_count, views_count, source_url, difficulty_level, is_featured, created_at, updated_at";

const JOINED_TIP_COLUMNS: &str = "t.id, t.title, t.content, t.category, t.tags, t.author_id, \
     t.likes_count, t.shares_count, t.views_count, t.source_url, t.difficulty_level, \
     t.is_featured, t.created_at, t.updated_at, \
     u.username AS author_username, u.full_name AS author_full_name";

const ACTIVITY_COLUMNS: &str =
    "id, user_id, activity_type, category, content_id, metadata, session_id, created_at";

const USER_COLUMNS: &str =
    "id, username, email, full_name, interests, wellness_goals, experience_level, created_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Substring pattern for `ILIKE ... ESCAPE '\'` matching `term` literally
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, FromRow)]
struct TipRow {
    id: i64,
    title: String,
    content: String,
    category: String,
    tags: Vec<String>,
    author_id: i64,
    likes_count: i64,
    shares_count: i64,
    views_count: i64,
    source_url: Option<String>,
    difficulty_level: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TipRow> for Tip {
    type Error = AppError;

    fn try_from(row: TipRow) -> Result<Self, Self::Error> {
        Ok(Tip {
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category.parse()?,
            tags: row.tags,
            author_id: row.author_id,
            likes_count: row.likes_count,
            shares_count: row.shares_count,
            views_count: row.views_count,
            source_url: row.source_url,
            difficulty_level: row.difficulty_level.parse()?,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TipWithAuthorRow {
    #[sqlx(flatten)]
    tip: TipRow,
    author_username: String,
    author_full_name: Option<String>,
}

impl TryFrom<TipWithAuthorRow> for TipWithAuthor {
    type Error = AppError;

    fn try_from(row: TipWithAuthorRow) -> Result<Self, Self::Error> {
        Ok(TipWithAuthor {
            tip: row.tip.try_into()?,
            author_username: row.author_username,
            author_full_name: row.author_full_name,
        })
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: i64,
    user_id: i64,
    activity_type: String,
    category: Option<String>,
    content_id: Option<String>,
    metadata: Json<ActivityMetadata>,
    session_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityRecord {
            id: row.id,
            user_id: row.user_id,
            kind: row.activity_type.parse()?,
            category: row
                .category
                .as_deref()
                .map(str::parse::<Category>)
                .transpose()?,
            content_id: row.content_id,
            metadata: row.metadata.0,
            session_id: row.session_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    full_name: Option<String>,
    interests: Vec<String>,
    wellness_goals: Vec<String>,
    experience_level: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            interests: row.interests,
            wellness_goals: row.wellness_goals,
            experience_level: row.experience_level.parse()?,
            created_at: row.created_at,
        })
    }
}

fn has_error_code(err: &sqlx::Error, code: &str) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|c| c == code)
}

// ============================================================================
// Store
// ============================================================================

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TipStore for PgStore {
    async fn list_tips(&self, query: &TipQuery) -> AppResult<Vec<TipWithAuthor>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM wellness_tips t JOIN users u ON u.id = t.author_id WHERE TRUE",
            JOINED_TIP_COLUMNS
        ));

        if let Some(category) = query.category {
            builder.push(" AND t.category = ").push_bind(category.as_str());
        }

        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            builder
                .push(" AND (t.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR t.content ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        // Column and direction come from closed enums, never from raw input
        builder.push(format!(
            " ORDER BY t.{} {}, t.id {}",
            query.sort_by.column(),
            query.order.keyword(),
            query.order.keyword()
        ));
        builder
            .push(" OFFSET ")
            .push_bind(query.skip)
            .push(" LIMIT ")
            .push_bind(query.limit);

        let rows: Vec<TipWithAuthorRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        tracing::debug!(rows = rows.len(), "Listed tips");

        rows.into_iter().map(TipWithAuthor::try_from).collect()
    }

    async fn get_tip(&self, id: i64) -> AppResult<Option<TipWithAuthor>> {
        let sql = format!(
            "SELECT {} FROM wellness_tips t JOIN users u ON u.id = t.author_id WHERE t.id = $1",
            JOINED_TIP_COLUMNS
        );

        let row: Option<TipWithAuthorRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TipWithAuthor::try_from).transpose()
    }

    async fn insert_tip(&self, author_id: i64, tip: &NewTip) -> AppResult<Tip> {
        let sql = format!(
            r#"
            INSERT INTO wellness_tips
                (title, content, category, tags, author_id, source_url, difficulty_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TIP_COLUMNS
        );

        let row: TipRow = sqlx::query_as(&sql)
            .bind(&tip.title)
            .bind(&tip.content)
            .bind(tip.category.as_str())
            .bind(&tip.tags)
            .bind(author_id)
            .bind(&tip.source_url)
            .bind(tip.difficulty_level.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if has_error_code(&e, FOREIGN_KEY_VIOLATION) {
                    AppError::NotFound(format!("User {} not found", author_id))
                } else {
                    AppError::Database(e)
                }
            })?;

        row.try_into()
    }

    async fn update_tip(&self, id: i64, update: &TipUpdate) -> AppResult<Option<Tip>> {
        let sql = format!(
            r#"
            UPDATE wellness_tips SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                tags = COALESCE($4, tags),
                source_url = COALESCE($5, source_url),
                difficulty_level = COALESCE($6, difficulty_level),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TIP_COLUMNS
        );

        let row: Option<TipRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&update.title)
            .bind(&update.content)
            .bind(&update.tags)
            .bind(&update.source_url)
            .bind(update.difficulty_level.map(|d| d.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        row.map(Tip::try_from).transpose()
    }

    async fn delete_tip(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM wellness_tips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_counter(&self, id: i64, counter: Counter) -> AppResult<Option<Tip>> {
        // Single UPDATE so concurrent increments never lose a write
        let sql = format!(
            "UPDATE wellness_tips SET {col} = {col} + 1 WHERE id = $1 RETURNING {cols}",
            col = counter.column(),
            cols = TIP_COLUMNS
        );

        let row: Option<TipRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Tip::try_from).transpose()
    }

    async fn top_tips_by_engagement(
        &self,
        category: Option<Category>,
        limit: i64,
    ) -> AppResult<Vec<Tip>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM wellness_tips", TIP_COLUMNS));

        if let Some(category) = category {
            builder.push(" WHERE category = ").push_bind(category.as_str());
        }

        builder
            .push(" ORDER BY (likes_count + views_count) DESC LIMIT ")
            .push_bind(limit);

        let rows: Vec<TipRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Tip::try_from).collect()
    }

    async fn category_totals(&self, category: Category) -> AppResult<CategoryTotals> {
        let (total_tips, total_views, total_likes, avg_engagement): (i64, i64, i64, f64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*)::BIGINT,
                    COALESCE(SUM(views_count), 0)::BIGINT,
                    COALESCE(SUM(likes_count), 0)::BIGINT,
                    COALESCE(AVG(likes_count + views_count), 0)::FLOAT8
                FROM wellness_tips
                WHERE category = $1
                "#,
            )
            .bind(category.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(CategoryTotals {
            total_tips,
            total_views,
            total_likes,
            avg_engagement,
        })
    }
}

#[async_trait::async_trait]
impl ActivityStore for PgStore {
    async fn insert_activity(
        &self,
        activity: &NewActivity,
        at: DateTime<Utc>,
    ) -> AppResult<ActivityRecord> {
        let sql = format!(
            r#"
            INSERT INTO user_activities
                (user_id, activity_type, category, content_id, metadata, session_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        );

        let row: ActivityRow = sqlx::query_as(&sql)
            .bind(activity.user_id)
            .bind(activity.kind.as_str())
            .bind(activity.category.map(|c| c.as_str()))
            .bind(&activity.content_id)
            .bind(Json(&activity.metadata))
            .bind(&activity.session_id)
            .bind(at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if has_error_code(&e, FOREIGN_KEY_VIOLATION) {
                    AppError::NotFound(format!("User {} not found", activity.user_id))
                } else {
                    AppError::Database(e)
                }
            })?;

        row.try_into()
    }

    async fn category_counts_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> AppResult<CategoryCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT category, COUNT(*)::BIGINT
            FROM user_activities
            WHERE user_id = $1 AND created_at >= $2 AND category IS NOT NULL
            GROUP BY category
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CategoryCounts::new();
        for (category, count) in rows {
            counts.insert(category.parse()?, count);
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users
                (username, email, full_name, interests, wellness_goals, experience_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row: UserRow = sqlx::query_as(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.interests)
            .bind(&user.wellness_goals)
            .bind(user.experience_level.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if has_error_code(&e, UNIQUE_VIOLATION) {
                    AppError::InvalidInput("Username or email already registered".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        row.try_into()
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }
}
