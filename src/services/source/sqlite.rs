use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::MediaRecordSource;
use crate::error::{ColumnError, SourceError};
use crate::models::media_types::{MediaFilter, MediaKind};
use crate::models::record_types::{RawRecord, RecordBatch, RecordRow};

const COL_ID: &str = "_id";
const COL_DISPLAY_NAME: &str = "_display_name";
const COL_DATA: &str = "_data";
const COL_BUCKET: &str = "bucket_display_name";
const COL_MEDIA_TYPE: &str = "media_type";
const COL_DURATION: &str = "duration";

const PROJECTION: &[&str] = &[COL_ID, COL_DISPLAY_NAME, COL_DATA, COL_BUCKET, COL_MEDIA_TYPE];
const PROJECTION_WITH_DURATION: &[&str] = &[
    COL_ID,
    COL_DISPLAY_NAME,
    COL_DATA,
    COL_BUCKET,
    COL_MEDIA_TYPE,
    COL_DURATION,
];

/// Schema revision of a media index, read from `PRAGMA user_version`.
///
/// Legacy indexes take the row limit as part of the sort clause; modern ones
/// bind it as a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRevision {
    Legacy,
    Modern,
}

impl IndexRevision {
    pub const MODERN_USER_VERSION: i64 = 2;

    pub fn from_user_version(version: i64) -> Self {
        if version >= Self::MODERN_USER_VERSION {
            IndexRevision::Modern
        } else {
            IndexRevision::Legacy
        }
    }

    fn user_version(self) -> i64 {
        match self {
            IndexRevision::Legacy => 1,
            IndexRevision::Modern => Self::MODERN_USER_VERSION,
        }
    }
}

/// SQL for one media query against the `media` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    filter: MediaFilter,
    limit: Option<usize>,
    revision: IndexRevision,
}

impl MediaQuery {
    pub fn new(filter: MediaFilter, limit: Option<usize>, revision: IndexRevision) -> Self {
        Self {
            filter,
            limit,
            revision,
        }
    }

    /// Duration is only projected when the filter admits video.
    pub fn selects_duration(&self) -> bool {
        self.filter.includes_video()
    }

    fn projection(&self) -> &'static [&'static str] {
        if self.selects_duration() {
            PROJECTION_WITH_DURATION
        } else {
            PROJECTION
        }
    }

    fn selection(&self) -> String {
        let clauses: Vec<String> = self
            .filter
            .kinds()
            .iter()
            .map(|kind| format!("{} = {}", COL_MEDIA_TYPE, kind.index_code()))
            .collect();
        format!("({})", clauses.join(" OR "))
    }

    pub fn to_sql(&self) -> String {
        let sort = "date_modified DESC, _id DESC";
        let limit = match (self.limit, self.revision) {
            (None, _) => String::new(),
            (Some(n), IndexRevision::Legacy) => format!(" LIMIT {}", n),
            (Some(_), IndexRevision::Modern) => " LIMIT ?1".to_string(),
        };
        format!(
            "SELECT {} FROM media WHERE {} ORDER BY {}{}",
            self.projection().join(", "),
            self.selection(),
            sort,
            limit
        )
    }

    pub fn params(&self) -> Vec<i64> {
        match (self.limit, self.revision) {
            (Some(n), IndexRevision::Modern) => vec![i64::try_from(n).unwrap_or(i64::MAX)],
            _ => Vec::new(),
        }
    }
}

/// Create the `media` table if missing and stamp the schema revision.
pub fn create_schema(conn: &Connection, revision: IndexRevision) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media (
            _id                 INTEGER PRIMARY KEY,
            _display_name       TEXT,
            _data               TEXT,
            bucket_display_name TEXT,
            media_type          INTEGER NOT NULL,
            duration            INTEGER,
            date_modified       INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_media_date_modified ON media(date_modified DESC)",
        [],
    )?;

    conn.execute_batch(&format!("PRAGMA user_version = {};", revision.user_version()))?;
    Ok(())
}

/// Insert or replace one row of the `media` table.
pub fn insert_record(conn: &Connection, record: &RawRecord, date_modified: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO media
            (_id, _display_name, _data, bucket_display_name, media_type, duration, date_modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.display_name,
            record.path,
            record.bucket_display_name,
            record.kind.index_code(),
            record.duration,
            date_modified
        ],
    )?;
    Ok(())
}

fn column_error(column: &'static str) -> impl Fn(rusqlite::Error) -> ColumnError {
    move |e| ColumnError::new(column, e.to_string())
}

fn read_record(row: &Row<'_>, with_duration: bool) -> RecordRow {
    let id: i64 = row.get(COL_ID).map_err(column_error(COL_ID))?;
    let display_name: Option<String> = row.get(COL_DISPLAY_NAME).map_err(column_error(COL_DISPLAY_NAME))?;
    let path: Option<String> = row.get(COL_DATA).map_err(column_error(COL_DATA))?;
    let bucket_display_name: Option<String> = row.get(COL_BUCKET).map_err(column_error(COL_BUCKET))?;

    let code: i64 = row.get(COL_MEDIA_TYPE).map_err(column_error(COL_MEDIA_TYPE))?;
    let kind = MediaKind::from_index_code(code)
        .ok_or_else(|| ColumnError::new(COL_MEDIA_TYPE, format!("unknown media type {}", code)))?;

    let duration = if with_duration {
        row.get::<_, Option<i64>>(COL_DURATION)
            .map_err(column_error(COL_DURATION))?
    } else {
        None
    };

    Ok(RawRecord {
        id,
        display_name,
        path,
        bucket_display_name,
        duration,
        kind,
    })
}

/// Media index stored in a SQLite database.
pub struct SqliteMediaSource {
    conn: Mutex<Option<Connection>>,
    revision: IndexRevision,
    db_path: Option<PathBuf>,
}

impl SqliteMediaSource {
    /// Open an existing index read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SourceError::unavailable(format!(
                "Media index not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut source = Self::from_connection(conn)?;
        source.db_path = Some(path.to_path_buf());
        info!(
            "Opened media index at {} ({:?})",
            path.display(),
            source.revision
        );
        Ok(source)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, SourceError> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            revision: IndexRevision::from_user_version(version),
            db_path: None,
        })
    }

    pub fn revision(&self) -> IndexRevision {
        self.revision
    }

    /// Close the underlying connection; later queries fail as unavailable.
    pub fn close(&self) {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        *conn = None;
    }
}

impl MediaRecordSource for SqliteMediaSource {
    fn query(&self, filter: MediaFilter, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| SourceError::unavailable("media index connection poisoned"))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| SourceError::unavailable("media index is closed"))?;

        let query = MediaQuery::new(filter, limit, self.revision);
        let sql = query.to_sql();
        debug!("Querying media index: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(query.params()))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(row, query.selects_duration()));
        }

        Ok(RecordBatch::new(records, limit))
    }
}

impl std::fmt::Debug for SqliteMediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMediaSource")
            .field("db_path", &self.db_path)
            .field("revision", &self.revision)
            .finish()
    }
}
