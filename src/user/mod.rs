mod auth;
mod schema;
mod sqlite_user_store;
mod user_models;
mod user_store;

pub use auth::{SessionToken, SessionTokenValue};
pub use schema::USER_VERSIONED_SCHEMAS;
pub use sqlite_user_store::SqliteUserStore;
pub use user_models::UserProfile;
pub use user_store::UserStore;
