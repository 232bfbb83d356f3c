use super::auth::{SessionToken, SessionTokenValue};
use super::user_models::UserProfile;
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Inserts the user or refreshes the stored profile and login timestamp
    /// if it already exists.
    fn upsert_user(&self, profile: &UserProfile, now: i64) -> Result<()>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>>;

    fn add_session_token(&self, token: SessionToken) -> Result<()>;

    /// Returns Ok(None) if the token does not exist.
    fn get_session_token(&self, value: &SessionTokenValue) -> Result<Option<SessionToken>>;

    /// Returns false if the token did not exist.
    fn delete_session_token(&self, value: &SessionTokenValue) -> Result<bool>;

    /// Updates a token's last used timestamp.
    fn touch_session_token(&self, value: &SessionTokenValue, now: i64) -> Result<()>;

    /// Deletes tokens that have not been used for the given number of days.
    /// Returns the number of tokens that were deleted.
    fn prune_stale_session_tokens(&self, unused_for_days: u64) -> Result<usize>;
}
