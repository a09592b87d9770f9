use crate::{
    error::EtlError,
    types::{Artist, RawArtist, SearchResponse, TopTracksResponse},
};

use super::SpotifyClient;

impl SpotifyClient {
    /// Looks up an artist by name.
    ///
    /// Issues `GET /search?q=<name>&type=artist&limit=1`; the query is
    /// URL-encoded by the request builder.
    ///
    /// # Returns
    ///
    /// - `Ok(Artist)` - the first match
    /// - `Err(EtlError::NotFound)` - the search returned no artists
    /// - `Err(EtlError::Protocol)` - the first match has no usable id
    ///
    /// # Example
    ///
    /// ```
    /// let artist = client.search_artist(&token, "Ed Sheeran")?;
    /// println!("{} ({})", artist.name, artist.id);
    /// ```
    pub fn search_artist(&self, token: &str, name: &str) -> Result<Artist, EtlError> {
        let url = self.endpoint("search")?;
        let request = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("q", name), ("type", "artist"), ("limit", "1")]);

        let response: SearchResponse = self.get_json(request)?;
        let first = response
            .artists
            .and_then(|page| page.items)
            .and_then(|items| items.into_iter().next());

        let Some(value) = first else {
            tracing::warn!(artist = %name, "no artist found");
            return Err(EtlError::NotFound(format!("Artist '{name}' not found")));
        };

        let raw: RawArtist = serde_json::from_value(value)?;
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EtlError::Protocol("search result has no artist id".to_string()))?;
        let artist = Artist {
            id,
            name: raw.name.unwrap_or_else(|| name.to_string()),
        };

        tracing::info!(artist = %artist.name, id = %artist.id, "found artist");
        Ok(artist)
    }

    /// Fetches an artist's top tracks for a market.
    ///
    /// An empty list is a valid answer; the caller decides whether that means
    /// "no data". A response without a `tracks` key is treated as empty.
    pub fn top_tracks(
        &self,
        token: &str,
        artist_id: &str,
        market: &str,
    ) -> Result<Vec<serde_json::Value>, EtlError> {
        let url = self.endpoint(&format!("artists/{artist_id}/top-tracks"))?;
        let request = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("market", market)]);

        let response: TopTracksResponse = self.get_json(request)?;
        let tracks = response.tracks.unwrap_or_default();

        if tracks.is_empty() {
            tracing::warn!(artist_id, market, "no tracks found for artist");
        } else {
            tracing::info!(count = tracks.len(), artist_id, "fetched top tracks");
        }
        Ok(tracks)
    }
}
