use crate::dto::auth_dto::{RegisterRequest, UpdateProfileRequest};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_password};
use sqlx::PgPool;

const REPORT_FORMATS: [&str; 2] = ["html", "csv"];

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let existing: Option<i64> =
            sqlx::query_scalar(r#"SELECT id FROM users WHERE username = $1"#)
                .bind(&req.username)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(Error::Conflict("Username already exists".to_string()));
        }

        let report_format = req.report_format.unwrap_or_else(|| "html".to_string());
        if !REPORT_FORMATS.contains(&report_format.as_str()) {
            return Err(Error::BadRequest(format!(
                "Unsupported report format '{}'",
                report_format
            )));
        }

        let password_hash = hash_password(&req.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, full_name, email, qualification, dob, report_format)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&req.username)
        .bind(&password_hash)
        .bind(&req.full_name)
        .bind(&req.email)
        .bind(&req.qualification)
        .bind(req.dob)
        .bind(&report_format)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid username or password".to_string()))?;

        let ok = verify_password(password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Failed to verify password: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }
        if !user.is_active {
            return Err(Error::Unauthorized("Account is deactivated".to_string()));
        }
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    pub async fn update_profile(&self, user_id: i64, req: UpdateProfileRequest) -> Result<User> {
        if let Some(ref fmt) = req.report_format {
            if !REPORT_FORMATS.contains(&fmt.as_str()) {
                return Err(Error::BadRequest(format!(
                    "Unsupported report format '{}'",
                    fmt
                )));
            }
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name),
                email = COALESCE($2, email),
                qualification = COALESCE($3, qualification),
                dob = COALESCE($4, dob),
                report_format = COALESCE($5, report_format),
                email_notifications = COALESCE($6, email_notifications),
                updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&req.full_name)
        .bind(&req.email)
        .bind(&req.qualification)
        .bind(req.dob)
        .bind(&req.report_format)
        .bind(req.email_notifications)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self.get_user(user_id).await?;
        let ok = verify_password(current_password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Failed to verify password: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(new_password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        sqlx::query(r#"UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2"#)
            .bind(&password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users =
            sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE role = 'user' ORDER BY id"#)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        let user = self.get_user(user_id).await?;
        if user.is_admin() {
            return Err(Error::BadRequest(
                "The admin account cannot be deleted".to_string(),
            ));
        }
        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Create the admin principal on first boot. Idempotent.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<()> {
        let existing: Option<i64> =
            sqlx::query_scalar(r#"SELECT id FROM users WHERE role = 'admin' LIMIT 1"#)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, full_name, role)
            VALUES ($1, $2, 'Quiz Master', 'admin')
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;
        tracing::info!("Seeded admin account '{}'", username);
        Ok(())
    }
}
