use crate::{error::EtlError, types::RecentlyPlayedResponse, utils};

use super::SpotifyClient;

impl SpotifyClient {
    /// Retrieves the user's recently played tracks.
    ///
    /// Requires a user token with the `user-read-recently-played` scope; a
    /// client-credentials token is rejected by Spotify with 401/403.
    ///
    /// # Arguments
    ///
    /// * `token` - pre-provisioned user access token
    /// * `limit` - requested page size, clamped to 1..=50
    /// * `after_ms` - only items played after this epoch-millisecond instant
    ///
    /// # Returns
    ///
    /// The raw `items` array; each item wraps a `track` and a `played_at`
    /// timestamp. Only the first page is read.
    pub fn recently_played(
        &self,
        token: &str,
        limit: i64,
        after_ms: i64,
    ) -> Result<Vec<serde_json::Value>, EtlError> {
        let limit = utils::clamp_limit(limit);
        let url = self.endpoint("me/player/recently-played")?;
        let request = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("after", after_ms.to_string()), ("limit", limit.to_string())]);

        let response: RecentlyPlayedResponse = self.get_json(request)?;
        let items = response.items.unwrap_or_default();

        if response.next.is_some() {
            tracing::debug!(limit, "more history available beyond the first page");
        }
        tracing::info!(count = items.len(), after_ms, limit, "retrieved recently played tracks");
        Ok(items)
    }
}
