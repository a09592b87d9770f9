use crate::{
    config::DEFAULT_RECENT_FILE,
    pipeline::{Pipeline, sink::RECENTLY_PLAYED_TABLE},
    spotify::SpotifyClient,
};

use super::job::{JobOptions, SinkKind, spinner};

/// Runs the recently-played job: fetch the last 24 hours of listening
/// history with the user token and append it to the sink (SQLite at
/// `DATABASE_LOCATION` unless `--sink csv`).
pub fn recent(opts: JobOptions) {
    let (ctx, settings, target) = opts.prepare(SinkKind::Sqlite, DEFAULT_RECENT_FILE);
    let mut sink = target.open(RECENTLY_PLAYED_TABLE);

    let client = match SpotifyClient::new(&settings) {
        Ok(client) => client,
        Err(e) => opts.fail(&ctx, &e),
    };

    let pb = spinner("Fetching recently played tracks...");
    let result = Pipeline::new(&client, &settings).run_recently_played(&ctx, sink.as_mut());
    pb.finish_and_clear();

    opts.report(&ctx, &settings, result);
}
