//! SQLite 저장소
//!
//! 코어의 저장소 trait(사용자, 계획, 멤버십, Refresh 세션)을 하나의 풀로 구현합니다.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use tm_core::account::{AccountStatus, User};
use tm_core::auth::{RemoveOutcome, SessionStore};
use tm_core::directory::{MembershipDirectory, PlanDirectory, UserDirectory};
use tm_core::membership::{MembershipRecord, MembershipStatus};
use tm_core::plan::Plan;
use tm_core::{Error, Result};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                login_id TEXT NOT NULL UNIQUE,
                nickname TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                is_public INTEGER NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS plan_members (
                plan_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL,
                PRIMARY KEY (plan_id, user_id)
            );"#,
            r#"CREATE TABLE IF NOT EXISTS refresh_sessions (
                user_id TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );"#,
        ];

        for query in queries {
            sqlx::query(query).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// 만료된 Refresh 세션 정리
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM refresh_sessions WHERE expires_at <= ?1"#)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(Error::storage)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, login_id, nickname, password_hash, status, created_at
               FROM users WHERE id = ?1"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, login_id, nickname, password_hash, status, created_at
               FROM users WHERE login_id = ?1"#,
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn insert(&self, user: User) -> Result<()> {
        let result = sqlx::query(
            r#"INSERT INTO users (id, login_id, nickname, password_hash, status, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.login_id)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(user.status.as_str())
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(Error::conflict("login id already in use"))
            }
            Err(e) => Err(Error::storage(e)),
        }
    }
}

#[async_trait]
impl PlanDirectory for SqliteStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"SELECT id, title, is_public, is_deleted, created_by, created_at
               FROM plans WHERE id = ?1"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;
        row.map(PlanRow::into_plan).transpose()
    }

    async fn insert(&self, plan: Plan) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO plans (id, title, is_public, is_deleted, created_by, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(plan.id.to_string())
        .bind(&plan.title)
        .bind(plan.is_public)
        .bind(plan.is_deleted)
        .bind(plan.created_by.to_string())
        .bind(plan.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?;
        Ok(())
    }

    async fn mark_deleted(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"UPDATE plans SET is_deleted = 1 WHERE id = ?1"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Error::storage)?;
        if result.rows_affected() == 0 {
            return Err(Error::plan_not_found());
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipDirectory for SqliteStore {
    async fn find_all_by_plan(&self, plan_id: Uuid) -> Result<Vec<MembershipRecord>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"SELECT plan_id, user_id, status FROM plan_members WHERE plan_id = ?1"#,
        )
        .bind(plan_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::storage)?;
        rows.into_iter().map(MemberRow::into_record).collect()
    }

    async fn upsert(&self, record: MembershipRecord) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO plan_members (plan_id, user_id, status) VALUES (?1, ?2, ?3)
               ON CONFLICT(plan_id, user_id) DO UPDATE SET status = excluded.status"#,
        )
        .bind(record.plan_id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT token FROM refresh_sessions WHERE user_id = ?1 AND expires_at > ?2"#,
        )
        .bind(user_id.to_string())
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)
    }

    async fn put(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO refresh_sessions (user_id, token, expires_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(user_id) DO UPDATE SET token = excluded.token, expires_at = excluded.expires_at"#,
        )
        .bind(user_id.to_string())
        .bind(token)
        .bind(expires_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: Uuid,
        expected: &str,
        replacement: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        // 단일 조건부 UPDATE라 같은 키에 대한 동시 요청 중 하나만 반영됨
        let result = sqlx::query(
            r#"UPDATE refresh_sessions SET token = ?1, expires_at = ?2
               WHERE user_id = ?3 AND token = ?4 AND expires_at > ?5"#,
        )
        .bind(replacement)
        .bind(expires_at.timestamp())
        .bind(user_id.to_string())
        .bind(expected)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_if(&self, user_id: Uuid, expected: &str) -> Result<RemoveOutcome> {
        let now = Utc::now().timestamp();
        let removed = sqlx::query(
            r#"DELETE FROM refresh_sessions WHERE user_id = ?1 AND token = ?2 AND expires_at > ?3"#,
        )
        .bind(user_id.to_string())
        .bind(expected)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?;
        if removed.rows_affected() == 1 {
            return Ok(RemoveOutcome::Removed);
        }

        if self.get(user_id).await?.is_some() {
            return Ok(RemoveOutcome::Mismatch);
        }

        sqlx::query(r#"DELETE FROM refresh_sessions WHERE user_id = ?1 AND expires_at <= ?2"#)
            .bind(user_id.to_string())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::storage)?;
        Ok(RemoveOutcome::Missing)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    login_id: String,
    nickname: String,
    password_hash: String,
    status: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let status = AccountStatus::from_str(&self.status)
            .ok_or_else(|| Error::storage(format!("unknown account status: {}", self.status)))?;
        Ok(User {
            id: parse_uuid(&self.id)?,
            login_id: self.login_id,
            nickname: self.nickname,
            password_hash: self.password_hash,
            status,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PlanRow {
    id: String,
    title: String,
    is_public: bool,
    is_deleted: bool,
    created_by: String,
    created_at: String,
}

impl PlanRow {
    fn into_plan(self) -> Result<Plan> {
        Ok(Plan {
            id: parse_uuid(&self.id)?,
            title: self.title,
            is_public: self.is_public,
            is_deleted: self.is_deleted,
            created_by: parse_uuid(&self.created_by)?,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct MemberRow {
    plan_id: String,
    user_id: String,
    status: String,
}

impl MemberRow {
    fn into_record(self) -> Result<MembershipRecord> {
        let status = MembershipStatus::from_str(&self.status)
            .ok_or_else(|| Error::storage(format!("unknown membership status: {}", self.status)))?;
        Ok(MembershipRecord::new(
            parse_uuid(&self.plan_id)?,
            parse_uuid(&self.user_id)?,
            status,
        ))
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(Error::storage)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(Error::storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;
    use tm_core::auth::{TokenCodec, TokenLifecycle, TokenSettings};

    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    fn later() -> DateTime<Utc> {
        Utc::now() + Duration::days(1)
    }

    #[tokio::test]
    async fn test_session_compare_and_swap() {
        let store = store().await;
        let user = Uuid::new_v4();

        store.put(user, "current", later()).await.unwrap();

        assert!(!store.compare_and_swap(user, "other", "next", later()).await.unwrap());
        assert!(store.compare_and_swap(user, "current", "next", later()).await.unwrap());
        assert!(!store.compare_and_swap(user, "current", "again", later()).await.unwrap());
        assert_eq!(store.get(user).await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_concurrent_rotation_allows_one_winner() {
        let path = std::env::temp_dir().join(format!("tm-api-{}.db", Uuid::new_v4()));
        let store = Arc::new(
            SqliteStore::connect(&format!("sqlite://{}", path.display()), 8)
                .await
                .unwrap(),
        );
        let codec = TokenCodec::new(
            SECRET,
            TokenSettings::new("tripmate", Duration::minutes(30), Duration::days(14)),
        )
        .unwrap();
        let tokens = Arc::new(TokenLifecycle::new(codec, store.clone()));
        let user = Uuid::new_v4();
        let original = tokens.issue_initial_tokens(user).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = tokens.clone();
                let presented = original.refresh_token.clone();
                tokio::spawn(async move { tokens.rotate(&presented).await })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(pair) => winners.push(pair),
                Err(e) => assert!(matches!(e, Error::InvalidCredentials(_)), "unexpected {:?}", e),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(store.get(user).await.unwrap(), Some(winners[0].refresh_token.clone()));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_session_remove_if() {
        let store = store().await;
        let user = Uuid::new_v4();

        assert_eq!(store.remove_if(user, "x").await.unwrap(), RemoveOutcome::Missing);

        store.put(user, "current", later()).await.unwrap();
        assert_eq!(store.remove_if(user, "other").await.unwrap(), RemoveOutcome::Mismatch);
        assert_eq!(store.remove_if(user, "current").await.unwrap(), RemoveOutcome::Removed);
        assert_eq!(store.get(user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_reads_as_absent() {
        let store = store().await;
        let user = Uuid::new_v4();

        store.put(user, "stale", Utc::now() - Duration::seconds(5)).await.unwrap();

        assert_eq!(store.get(user).await.unwrap(), None);
        assert_eq!(store.remove_if(user, "stale").await.unwrap(), RemoveOutcome::Missing);
        assert_eq!(store.purge_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_round_trip_and_uniqueness() {
        let store = store().await;
        let user = User::new("traveler", "Trav", "$argon2id$hash".to_string());
        let id = user.id;

        UserDirectory::insert(&store, user).await.unwrap();

        let found = store.find_by_login_id("traveler").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, AccountStatus::Active);

        let dup = UserDirectory::insert(&store, User::new("traveler", "Other", "h".to_string())).await;
        assert!(matches!(dup, Err(Error::DomainConflict { .. })));

        let found = UserDirectory::find_by_id(&store, id).await.unwrap().unwrap();
        assert_eq!(found.login_id, "traveler");
    }

    #[tokio::test]
    async fn test_plan_and_membership() {
        let store = store().await;
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let plan = Plan::new("Jeju", false, owner);
        let plan_id = plan.id;

        PlanDirectory::insert(&store, plan).await.unwrap();
        store.upsert(MembershipRecord::new(plan_id, owner, MembershipStatus::Owner)).await.unwrap();
        store.upsert(MembershipRecord::new(plan_id, guest, MembershipStatus::Member)).await.unwrap();
        store.upsert(MembershipRecord::new(plan_id, guest, MembershipStatus::Kicked)).await.unwrap();

        let records = store.find_all_by_plan(plan_id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.contains(&MembershipRecord::new(plan_id, guest, MembershipStatus::Kicked)));

        store.mark_deleted(plan_id).await.unwrap();
        let stored = PlanDirectory::find_by_id(&store, plan_id).await.unwrap().unwrap();
        assert!(stored.is_deleted);
        assert!(!stored.is_public);

        assert!(matches!(store.mark_deleted(Uuid::new_v4()).await, Err(Error::NotFound { .. })));
    }
}
