use super::auth::{SessionToken, SessionTokenValue};
use super::schema::USER_VERSIONED_SCHEMAS;
use super::user_models::UserProfile;
use super::user_store::UserStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open user database")?;

        let schema = USER_VERSIONED_SCHEMAS.last().unwrap();
        if is_new_db {
            info!("Creating new user database at {:?}", path);
            schema.create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;
            if db_version != schema.version as i64 {
                bail!(
                    "User database version {} is not supported (expected {})",
                    db_version,
                    schema.version
                );
            }
            schema
                .validate(&conn)
                .context("User database schema validation failed")?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_session_token(row: &rusqlite::Row) -> rusqlite::Result<SessionToken> {
        Ok(SessionToken {
            value: SessionTokenValue(row.get("value")?),
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
            last_used_at: row.get("last_used_at")?,
        })
    }
}

impl UserStore for SqliteUserStore {
    fn upsert_user(&self, profile: &UserProfile, now: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, display_name, avatar_url, profile_url, country, created_at, last_login_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                profile_url = excluded.profile_url,
                country = excluded.country,
                last_login_at = excluded.last_login_at",
            params![
                profile.id,
                profile.display_name,
                profile.avatar_url,
                profile.profile_url,
                profile.country,
                now
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, display_name, avatar_url, profile_url, country
                 FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        avatar_url: row.get(2)?,
                        profile_url: row.get(3)?,
                        country: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn add_session_token(&self, token: SessionToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO session_tokens (value, user_id, created_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token.value.0,
                token.user_id,
                token.created_at,
                token.last_used_at
            ],
        )?;
        Ok(())
    }

    fn get_session_token(&self, value: &SessionTokenValue) -> Result<Option<SessionToken>> {
        let conn = self.conn.lock().unwrap();
        let token = conn
            .query_row(
                "SELECT value, user_id, created_at, last_used_at
                 FROM session_tokens WHERE value = ?1",
                params![value.0],
                Self::row_to_session_token,
            )
            .optional()?;
        Ok(token)
    }

    fn delete_session_token(&self, value: &SessionTokenValue) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM session_tokens WHERE value = ?1",
            params![value.0],
        )?;
        Ok(deleted > 0)
    }

    fn touch_session_token(&self, value: &SessionTokenValue, now: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE session_tokens SET last_used_at = ?1 WHERE value = ?2",
            params![now, value.0],
        )?;
        Ok(())
    }

    fn prune_stale_session_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let cutoff = chrono::Utc::now().timestamp() - (unused_for_days as i64) * 24 * 3600;
        let deleted = conn.execute(
            "DELETE FROM session_tokens
             WHERE COALESCE(last_used_at, created_at) < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct TestStore {
        store: SqliteUserStore,
        _temp_dir: TempDir,
    }

    fn create_test_store() -> TestStore {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(temp_dir.path().join("users.db")).unwrap();
        TestStore {
            store,
            _temp_dir: temp_dir,
        }
    }

    fn test_profile(id: &str, display_name: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: None,
            profile_url: Some(format!("https://provider.example/users/{}", id)),
            country: Some("IT".to_string()),
        }
    }

    #[test]
    fn upsert_creates_then_refreshes() {
        let test = create_test_store();
        let store = &test.store;

        store.upsert_user(&test_profile("u1", "Ada"), 100).unwrap();
        assert_eq!(
            store.get_user("u1").unwrap().unwrap().display_name,
            "Ada"
        );

        store
            .upsert_user(&test_profile("u1", "Ada L."), 200)
            .unwrap();
        assert_eq!(
            store.get_user("u1").unwrap().unwrap().display_name,
            "Ada L."
        );
    }

    #[test]
    fn missing_user_is_none() {
        let test = create_test_store();
        assert!(test.store.get_user("nope").unwrap().is_none());
    }

    #[test]
    fn session_token_lifecycle() {
        let test = create_test_store();
        let store = &test.store;

        let value = SessionTokenValue::generate();
        store
            .add_session_token(SessionToken {
                value: value.clone(),
                user_id: "u1".to_string(),
                created_at: 100,
                last_used_at: None,
            })
            .unwrap();

        let token = store.get_session_token(&value).unwrap().unwrap();
        assert_eq!(token.user_id, "u1");
        assert_eq!(token.last_used_at, None);

        store.touch_session_token(&value, 500).unwrap();
        let token = store.get_session_token(&value).unwrap().unwrap();
        assert_eq!(token.last_used_at, Some(500));

        assert!(store.delete_session_token(&value).unwrap());
        assert!(!store.delete_session_token(&value).unwrap());
        assert!(store.get_session_token(&value).unwrap().is_none());
    }

    #[test]
    fn prune_removes_only_stale_tokens() {
        let test = create_test_store();
        let store = &test.store;

        let stale = SessionTokenValue::generate();
        let fresh = SessionTokenValue::generate();
        store
            .add_session_token(SessionToken {
                value: stale.clone(),
                user_id: "u1".to_string(),
                created_at: 0,
                last_used_at: Some(0),
            })
            .unwrap();
        store
            .add_session_token(SessionToken {
                value: fresh.clone(),
                user_id: "u1".to_string(),
                created_at: chrono::Utc::now().timestamp(),
                last_used_at: None,
            })
            .unwrap();

        let pruned = store.prune_stale_session_tokens(30).unwrap();
        assert_eq!(pruned, 1);
        assert!(store.get_session_token(&stale).unwrap().is_none());
        assert!(store.get_session_token(&fresh).unwrap().is_some());
    }
}
