//! Shared constants for end-to-end tests

/// Regular test user, known to the stub identity provider.
pub const TEST_USER: &str = "ada";

/// A second user for cross-user scenarios.
pub const OTHER_USER: &str = "bob";

/// Track ids used across reaction tests.
pub const TRACK_1_ID: &str = "track-0001";
pub const TRACK_2_ID: &str = "track-0002";
pub const ALBUM_1_ID: &str = "album-0001";

pub const REQUEST_TIMEOUT_SECS: u64 = 5;
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// The stub identity provider accepts tokens of the form `token-<user id>`.
pub fn provider_token(user: &str) -> String {
    format!("token-{}", user)
}
