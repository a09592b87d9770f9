use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use rusqlite::{Connection, params};

use crate::{error::EtlError, types::Track};

pub const SQLITE_SCHEME: &str = "sqlite:///";
pub const RECENTLY_PLAYED_TABLE: &str = "recently_played";
pub const TOP_TRACKS_TABLE: &str = "top_tracks";

/// Append-only destination for a normalized batch.
pub trait Sink {
    /// Human-readable location reported in the run summary.
    fn location(&self) -> String;

    /// Appends `batch`, returning the number of rows written.
    fn write(&mut self, batch: &[Track]) -> Result<usize, EtlError>;
}

/// Where a job's records go, parsed from a location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Csv(PathBuf),
    Sqlite(PathBuf),
}

impl SinkTarget {
    /// `sqlite:///<path>` selects a SQLite database, anything else is a CSV
    /// file path.
    pub fn parse(location: &str) -> Result<Self, EtlError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(EtlError::Config("sink location is empty".to_string()));
        }

        if let Some(path) = location.strip_prefix(SQLITE_SCHEME) {
            if path.is_empty() {
                return Err(EtlError::Config(format!(
                    "database location has no path: {location}"
                )));
            }
            return Ok(SinkTarget::Sqlite(PathBuf::from(path)));
        }

        if location.starts_with("sqlite:") {
            return Err(EtlError::Config(format!(
                "database location must look like {SQLITE_SCHEME}<path>, got {location}"
            )));
        }

        Ok(SinkTarget::Csv(PathBuf::from(location)))
    }

    /// Builds the sink. Nothing touches the filesystem until the first write.
    pub fn open(&self, table: &'static str) -> Box<dyn Sink> {
        match self {
            SinkTarget::Csv(path) => Box::new(CsvSink::new(path)),
            SinkTarget::Sqlite(path) => Box::new(SqliteSink::new(path, table)),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), EtlError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| EtlError::Sink(format!("create dir {}: {e}", parent.display()))),
        _ => Ok(()),
    }
}

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Sink for CsvSink {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    /// Appends rows to the file. The header is written only when the file is
    /// new or empty, so repeated runs build up a single table.
    fn write(&mut self, batch: &[Track]) -> Result<usize, EtlError> {
        ensure_parent(&self.path)?;

        let write_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EtlError::Sink(format!("open {}: {e}", self.path.display())))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for track in batch {
            writer.serialize(track)?;
        }
        writer
            .flush()
            .map_err(|e| EtlError::Sink(format!("flush {}: {e}", self.path.display())))?;

        tracing::info!(records = batch.len(), path = %self.path.display(), "saved records to csv");
        Ok(batch.len())
    }
}

pub struct SqliteSink {
    path: PathBuf,
    table: &'static str,
}

impl SqliteSink {
    pub fn new(path: impl AsRef<Path>, table: &'static str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table,
        }
    }

    fn ensure_table(&self, conn: &Connection) -> Result<(), EtlError> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
              track_name    TEXT NOT NULL,
              artist_name   TEXT NOT NULL,
              album_name    TEXT NOT NULL,
              track_id      TEXT NOT NULL,
              artist_id     TEXT NOT NULL,
              album_id      TEXT NOT NULL,
              duration_ms   INTEGER NOT NULL,
              popularity    INTEGER NOT NULL,
              explicit      INTEGER NOT NULL,
              external_url  TEXT NOT NULL,
              preview_url   TEXT NOT NULL,
              played_at     TEXT,
              rank          INTEGER,
              release_date  TEXT NOT NULL,
              timestamp     TEXT
            );
            "#,
            table = self.table
        ))?;
        Ok(())
    }
}

impl Sink for SqliteSink {
    fn location(&self) -> String {
        format!("{SQLITE_SCHEME}{}", self.path.display())
    }

    /// Inserts the whole batch in one transaction. No upsert: duplicates are
    /// only guarded against by validation.
    fn write(&mut self, batch: &[Track]) -> Result<usize, EtlError> {
        ensure_parent(&self.path)?;

        let mut conn = Connection::open(&self.path)?;
        self.ensure_table(&conn)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (
                    track_name, artist_name, album_name, track_id, artist_id, album_id,
                    duration_ms, popularity, explicit, external_url, preview_url,
                    played_at, rank, release_date, timestamp
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                table = self.table
            ))?;

            for track in batch {
                stmt.execute(params![
                    track.track_name,
                    track.artist_name,
                    track.album_name,
                    track.track_id,
                    track.artist_id,
                    track.album_id,
                    track.duration_ms as i64,
                    track.popularity,
                    track.explicit,
                    track.external_url,
                    track.preview_url,
                    track.played_at,
                    track.rank,
                    track.release_date,
                    track.timestamp(),
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(
            records = batch.len(),
            table = self.table,
            path = %self.path.display(),
            "saved records to database"
        );
        Ok(batch.len())
    }
}
