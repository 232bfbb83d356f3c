use serde::{Deserialize, Serialize};

/// A user as mirrored from the music provider. The id is the provider's
/// stable user id, we never mint our own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub profile_url: Option<String>,
    pub country: Option<String>,
}
