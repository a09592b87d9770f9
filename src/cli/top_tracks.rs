use crate::{
    config::DEFAULT_TOP_TRACKS_FILE,
    pipeline::{Pipeline, sink::TOP_TRACKS_TABLE},
    spotify::SpotifyClient,
};

use super::job::{JobOptions, SinkKind, spinner};

/// Runs the top-tracks job: search the configured artist, fetch their top
/// tracks and append them to the sink (CSV unless `--sink sqlite`).
///
/// Exits the process with code 1 on any stage error.
pub fn top_tracks(opts: JobOptions) {
    let (ctx, settings, target) = opts.prepare(SinkKind::Csv, DEFAULT_TOP_TRACKS_FILE);
    let mut sink = target.open(TOP_TRACKS_TABLE);

    let client = match SpotifyClient::new(&settings) {
        Ok(client) => client,
        Err(e) => opts.fail(&ctx, &e),
    };

    let pb = spinner(&format!("Fetching top tracks for {}...", settings.artist_name));
    let result = Pipeline::new(&client, &settings).run_top_tracks(&ctx, sink.as_mut());
    pb.finish_and_clear();

    opts.report(&ctx, &settings, result);
}
