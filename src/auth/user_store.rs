//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{User, UserRole};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_ADMIN_EMAIL: &str = "admin@escola.local";

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                full_name TEXT,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Create default admin user if none exists
        self.create_default_admin(&conn)?;

        Ok(())
    }

    /// Create default admin user for initial setup
    fn create_default_admin(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count == 0 {
            let password_hash =
                hash("admin123", DEFAULT_COST).context("Failed to hash password")?;

            let admin = User {
                id: Uuid::new_v4(),
                email: DEFAULT_ADMIN_EMAIL.to_string(),
                full_name: Some("Administrador".to_string()),
                password_hash,
                role: UserRole::Admin,
                created_at: Utc::now().to_rfc3339(),
            };

            conn.execute(
                "INSERT INTO users (id, email, full_name, password_hash, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    admin.id.to_string(),
                    admin.email,
                    admin.full_name,
                    admin.password_hash,
                    admin.role.as_str(),
                    admin.created_at,
                ],
            )
            .context("Failed to insert admin user")?;

            info!(
                "Default admin user created (email: {}, password: admin123)",
                DEFAULT_ADMIN_EMAIL
            );
            warn!("CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, email, full_name, password_hash, role, created_at
             FROM users WHERE email = ?1",
        )?;

        let user_result = stmt.query_row(params![email], map_user_row);

        match user_result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify email and password
    pub fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        match self.get_user_by_email(email)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid)
            }
            None => Ok(false),
        }
    }

    /// Create a new user
    pub fn create_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        password: &str,
        role: UserRole,
    ) -> Result<User> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.map(|n| n.to_string()),
            password_hash,
            role,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (id, email, full_name, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.email,
                user.full_name,
                user.password_hash,
                user.role.as_str(),
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("Created user: {} ({})", user.email, user.role.as_str());

        Ok(user)
    }

    /// List all users (admin only)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, email, full_name, password_hash, role, created_at FROM users",
        )?;

        let users = stmt
            .query_map([], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Delete a user by ID (admin only)
    pub fn delete_user(&self, user_id: &Uuid) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            params![user_id.to_string()],
        )?;

        if rows_affected == 0 {
            anyhow::bail!("User not found");
        }

        info!("Deleted user: {}", user_id);
        Ok(())
    }
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    Ok(User {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        email: row.get(1)?,
        full_name: row.get(2)?,
        password_hash: row.get(3)?,
        role: UserRole::from_str(&role_str).unwrap_or(UserRole::Viewer),
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_default_admin_created() {
        let (store, _temp) = create_test_store();

        let admin = store.get_user_by_email(DEFAULT_ADMIN_EMAIL).unwrap();
        assert!(admin.is_some());

        let admin = admin.unwrap();
        assert_eq!(admin.email, DEFAULT_ADMIN_EMAIL);
        assert_eq!(admin.role, UserRole::Admin);
    }

    #[test]
    fn test_password_verification() {
        let (store, _temp) = create_test_store();

        // Correct password
        assert!(store
            .verify_password(DEFAULT_ADMIN_EMAIL, "admin123")
            .unwrap());

        // Incorrect password
        assert!(!store
            .verify_password(DEFAULT_ADMIN_EMAIL, "wrongpassword")
            .unwrap());

        // Non-existent user
        assert!(!store
            .verify_password("nobody@escola.local", "password")
            .unwrap());
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let staff = store
            .create_user(
                "maria@escola.local",
                Some("Maria Costa"),
                "password123",
                UserRole::Staff,
            )
            .unwrap();
        assert_eq!(staff.email, "maria@escola.local");
        assert_eq!(staff.role, UserRole::Staff);

        let retrieved = store.get_user_by_email("maria@escola.local").unwrap();
        assert!(retrieved.is_some());

        let retrieved = retrieved.unwrap();
        assert_eq!(retrieved.full_name.as_deref(), Some("Maria Costa"));
        assert_eq!(retrieved.role, UserRole::Staff);
    }

    #[test]
    fn test_list_users() {
        let (store, _temp) = create_test_store();

        store
            .create_user("maria@escola.local", None, "pass", UserRole::Staff)
            .unwrap();
        store
            .create_user("viewer@escola.local", None, "pass", UserRole::Viewer)
            .unwrap();

        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 3); // default admin + 2
    }

    #[test]
    fn test_delete_user() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("temp@escola.local", None, "pass", UserRole::Viewer)
            .unwrap();

        assert!(store.get_user_by_email("temp@escola.local").unwrap().is_some());

        store.delete_user(&user.id).unwrap();

        assert!(store.get_user_by_email("temp@escola.local").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _temp) = create_test_store();

        store
            .create_user("maria@escola.local", None, "pass", UserRole::Staff)
            .unwrap();
        let result = store.create_user("maria@escola.local", None, "pass", UserRole::Staff);
        assert!(result.is_err());
    }
}
