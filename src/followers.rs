// Follower projection: turns raw user records from the follower listing
// into the reduced summaries printed by the default command.

use serde::{Deserialize, Serialize};

/// At most this many followers are printed.
pub const FOLLOWER_LIMIT: usize = 15;

/// A remote user record as returned by the v1.1 user endpoints. Only the
/// fields this tool reads are kept and all of them may be absent.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UserRecord {
    pub id_str: Option<String>,
    pub name: Option<String>,
    pub screen_name: Option<String>,
    pub profile_image_url_https: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Response of `followers/list.json`.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct FollowerPage {
    pub users: Vec<UserRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FollowerSummary {
    pub id: String,
    pub name: String,
    pub profile_image_url: Option<String>,
}

impl UserRecord {
    fn image_url(&self) -> Option<&str> {
        self.profile_image_url_https
            .as_deref()
            .or(self.profile_image_url.as_deref())
    }

    /// Project into a summary, or `None` when the record has no usable id.
    pub fn summarize(&self) -> Option<FollowerSummary> {
        let id = self.id_str.as_deref().filter(|id| !id.is_empty())?;
        Some(FollowerSummary {
            id: id.to_string(),
            name: self.name.clone().unwrap_or_default(),
            profile_image_url: self.image_url().map(full_size_image_url),
        })
    }
}

/// Drop the `_normal` size suffix so the URL points at the original upload.
/// Only the first occurrence is removed.
pub fn full_size_image_url(url: &str) -> String {
    url.replacen("_normal", "", 1)
}

/// The first `FOLLOWER_LIMIT` records, minus those without an id, in
/// source order.
pub fn summarize_followers(users: &[UserRecord]) -> Vec<FollowerSummary> {
    users
        .iter()
        .take(FOLLOWER_LIMIT)
        .filter_map(UserRecord::summarize)
        .collect()
}
