//! # User Repository
//!
//! Database operations for user accounts.
//!
//! ## Key Operations
//! - CRUD with unique username and email
//! - Password hashing on create and on password change
//! - Login bookkeeping (`last_login`)
//!
//! Plaintext passwords never reach SQL: [`NewUser::password`] is hashed with
//! argon2 before the insert and only the PHC string is stored.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::password::{hash_password, verify_password};
use stockroom_core::validation::{validate_new_user, validate_password, validate_user};
use stockroom_core::{new_id, NewUser, User};
use tracing::debug;

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            is_active, is_staff, is_superuser, date_joined, last_login";

/// Repository for user database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = UserRepository::new(pool);
///
/// let user = repo.create(&new_user).await?;
/// let ok = repo.verify_password("alice", "s3cret").await?;
/// ```
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user.
    ///
    /// ## Errors
    /// * `DbError::Validation` - bad username, email or empty password
    /// * `DbError::UniqueViolation` - username or email already taken
    pub async fn create(&self, new: &NewUser) -> DbResult<User> {
        validate_new_user(new)?;

        debug!(username = %new.username, "Creating user");

        let password_hash = hash_blocking(&new.password).await?;
        let user = User {
            id: new_id(),
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            is_active: true,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            date_joined: Utc::now(),
            last_login: None,
        };

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, first_name, last_name,
                is_active, is_staff, is_superuser, date_joined, last_login
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.date_joined)
        .bind(user.last_login)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_field(e.into(), &user))?;

        debug!(id = %user.id, "User created");
        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all users ordered by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Updates profile fields and flags.
    ///
    /// The password hash, `date_joined` and `last_login` are left alone; use
    /// [`set_password`](Self::set_password) and
    /// [`record_login`](Self::record_login) for those.
    pub async fn update(&self, user: &User) -> DbResult<()> {
        validate_user(user)?;

        debug!(id = %user.id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = ?2,
                email = ?3,
                first_name = ?4,
                last_name = ?5,
                is_active = ?6,
                is_staff = ?7,
                is_superuser = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_field(e.into(), user))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }

        Ok(())
    }

    /// Replaces the stored password hash.
    pub async fn set_password(&self, id: &str, password: &str) -> DbResult<()> {
        validate_password(password)?;
        let hash = hash_blocking(password).await?;

        debug!(id = %id, "Changing password");

        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(&hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Checks a username/password pair.
    ///
    /// Returns `false` for unknown usernames, inactive accounts and wrong
    /// passwords alike.
    pub async fn verify_password(&self, username: &str, password: &str) -> DbResult<bool> {
        let Some(user) = self.get_by_username(username).await? else {
            debug!(username = %username, "Password check for unknown user");
            return Ok(false);
        };

        if !user.is_active {
            return Ok(false);
        }

        let password = password.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &user.password_hash))
            .await
            .map_err(|e| DbError::Internal(format!("password check task failed: {e}")))
    }

    /// Sets `last_login` to now.
    pub async fn record_login(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET last_login = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Deletes a user.
    ///
    /// Role extensions and user-type links go with it; stock movements the
    /// user recorded keep their rows with the user reference set to NULL.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Argon2 hashing, run on the blocking thread pool.
async fn hash_blocking(password: &str) -> DbResult<String> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DbError::Internal(format!("password hashing task failed: {e}")))??;

    Ok(hash)
}

/// Fills in which value collided for a unique violation on `users`.
fn duplicate_field(err: DbError, user: &User) -> DbError {
    match &err {
        DbError::UniqueViolation { field, .. } if field.ends_with(".email") => {
            err.with_value(&user.email)
        }
        DbError::UniqueViolation { .. } => err.with_value(&user.username),
        _ => err,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            first_name: "Test".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = fixtures::db().await;
        let users = db.users();

        let user = users
            .create(&new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(user.is_active);
        assert!(user.last_login.is_none());
        assert!(user.password_hash.starts_with("$argon2"));

        let by_id = users.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.password_hash, user.password_hash);

        let by_email = users.get_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id.clone()));

        assert!(users.get_by_username("bob").await.unwrap().is_none());
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = fixtures::db().await;
        let users = db.users();

        users
            .create(&new_user("alice", "shared@example.com"))
            .await
            .unwrap();

        let err = users
            .create(&new_user("bob", "shared@example.com"))
            .await
            .unwrap_err();

        assert!(err.is_constraint_violation());
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "users.email");
                assert_eq!(value, "shared@example.com");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Distinct emails succeed.
        users
            .create(&new_user("bob", "bob@example.com"))
            .await
            .unwrap();
        assert_eq!(users.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = fixtures::db().await;
        let users = db.users();

        users
            .create(&new_user("alice", "a1@example.com"))
            .await
            .unwrap();
        let err = users
            .create(&new_user("alice", "a2@example.com"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "users.username" && value == "alice")
        );
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_database() {
        let db = fixtures::db().await;

        let err = db
            .users()
            .create(&new_user("alice", "not-an-email"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(db.users().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_passwords() {
        let db = fixtures::db().await;
        let users = db.users();
        let user = users
            .create(&new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(users.verify_password("alice", "correct horse").await.unwrap());
        assert!(!users.verify_password("alice", "wrong").await.unwrap());
        assert!(!users.verify_password("nobody", "correct horse").await.unwrap());

        users.set_password(&user.id, "battery staple").await.unwrap();
        assert!(users.verify_password("alice", "battery staple").await.unwrap());
        assert!(!users.verify_password("alice", "correct horse").await.unwrap());

        let mut inactive = users.get_by_id(&user.id).await.unwrap().unwrap();
        inactive.is_active = false;
        users.update(&inactive).await.unwrap();
        assert!(!users.verify_password("alice", "battery staple").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_record_login() {
        let db = fixtures::db().await;
        let users = db.users();
        let mut user = users
            .create(&new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        user.last_name = "Smith".to_string();
        user.is_staff = true;
        users.update(&user).await.unwrap();
        users.record_login(&user.id).await.unwrap();

        let stored = users.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.full_name(), "Test Smith");
        assert!(stored.is_staff);
        assert!(stored.last_login.is_some());
        assert_eq!(stored.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_missing_user_operations() {
        let db = fixtures::db().await;
        let users = db.users();

        assert!(matches!(
            users.delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            users.record_login("missing").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            users.set_password("missing", "pw").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_runtime_free() {
        let db = fixtures::db().await;
        let users = db.users();

        // A ticker on the single runtime thread keeps running while hashes
        // are computed elsewhere.
        let ticks = tokio::spawn(async {
            let mut n = 0u32;
            for _ in 0..5 {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                n += 1;
            }
            n
        });

        let alice = new_user("alice", "alice@example.com");
        let bob = new_user("bob", "bob@example.com");
        let (a, b) = tokio::join!(users.create(&alice), users.create(&bob),);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.password_hash, b.password_hash);

        users.set_password(&a.id, "battery staple").await.unwrap();
        assert!(users.verify_password("alice", "battery staple").await.unwrap());
        assert!(users.verify_password("bob", "correct horse").await.unwrap());
        assert_eq!(ticks.await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_list_ordered_by_username() {
        let db = fixtures::db().await;
        fixtures::user(&db, "zoe").await;
        fixtures::user(&db, "adam").await;

        let names: Vec<_> = db
            .users()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }
}
