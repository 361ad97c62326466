/// Database models for Teamdeck
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `organization`: Tenant boundary with subscription state and usage counters
/// - `membership`: User-organization relationships with roles
/// - `refresh_token`: Persisted, revocable refresh-token records
///
/// # Example
///
/// ```no_run
/// use teamdeck_shared::models::user::{User, CreateUser};
/// use teamdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     name: Some("Jo Field".to_string()),
///     password_hash: Some("$argon2id$...".to_string()),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod organization;
pub mod refresh_token;
pub mod user;
