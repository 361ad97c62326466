/// Authentication and authorization for Teamdeck
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`jwt`]: signed access/refresh token issuing and verification
/// - [`session`]: register/login/refresh/logout orchestration
/// - [`tenant`]: membership-based tenant resolution
/// - [`permission`]: the static action-to-roles permission table
/// - [`middleware`]: request auth context shared with the HTTP layer
///
/// # Design
///
/// Access tokens are stateless (verified by signature alone, no storage
/// round-trip) to keep per-request authorization cheap. Refresh tokens are
/// additionally persisted, because logout must actually invalidate them —
/// something a pure signature scheme cannot do.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permission;
pub mod session;
pub mod tenant;
