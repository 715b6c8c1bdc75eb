use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::config::{Difficulty, TestConfig, TestMode};
use crate::error::PersistenceError;
use crate::session::SessionStats;

/// How many finished tests are retained before the oldest are evicted
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// A finished test as handed to the history sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mode: TestMode,
    pub duration: Option<u32>,
    pub word_count: Option<usize>,
    pub text_source: String,
    pub difficulty: Difficulty,
    pub punctuation: bool,
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub elapsed_ms: u64,
}

impl TestResult {
    pub fn from_session(
        config: &TestConfig,
        stats: &SessionStats,
        target_word_count: usize,
        finished_at_ms: u64,
    ) -> Self {
        let timestamp = Utc
            .timestamp_millis_opt(finished_at_ms as i64)
            .single()
            .unwrap_or_else(Utc::now);
        let text_source = if config.custom_text.is_some() {
            "custom".to_string()
        } else if config.mode == TestMode::Quote {
            "quotes".to_string()
        } else {
            config.text_source.clone()
        };

        Self {
            id: Uuid::new_v4(),
            timestamp,
            mode: config.mode,
            duration: (config.mode == TestMode::Time).then_some(config.duration_secs),
            word_count: (config.mode == TestMode::Words).then_some(target_word_count),
            text_source,
            difficulty: config.difficulty,
            punctuation: config.punctuation,
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            total_chars: stats.total_chars,
            correct_chars: stats.correct_chars,
            incorrect_chars: stats.incorrect_chars,
            elapsed_ms: stats.elapsed_ms,
        }
    }
}

/// Destination for finished results
pub trait HistorySink {
    fn persist(&mut self, result: &TestResult) -> Result<(), PersistenceError>;
    /// Most recent results first
    fn recent(&self, limit: usize) -> Result<Vec<TestResult>, PersistenceError>;
}

impl<H: HistorySink + ?Sized> HistorySink for Box<H> {
    fn persist(&mut self, result: &TestResult) -> Result<(), PersistenceError> {
        (**self).persist(result)
    }

    fn recent(&self, limit: usize) -> Result<Vec<TestResult>, PersistenceError> {
        (**self).recent(limit)
    }
}

/// Volatile sink, used when the database cannot be opened and in tests
#[derive(Debug, Clone)]
pub struct InMemoryHistory {
    capacity: usize,
    results: VecDeque<TestResult>,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            results: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistorySink for InMemoryHistory {
    fn persist(&mut self, result: &TestResult) -> Result<(), PersistenceError> {
        self.results.push_front(result.clone());
        self.results.truncate(self.capacity);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<TestResult>, PersistenceError> {
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

/// SQLite-backed history capped to the most recent `capacity` results
#[derive(Debug)]
pub struct SqliteHistory {
    conn: Connection,
    capacity: usize,
}

impl SqliteHistory {
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?, capacity)
    }

    pub fn open_in_memory(capacity: usize) -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?, capacity)
    }

    fn init(conn: Connection, capacity: usize) -> Result<Self, PersistenceError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                timestamp TEXT NOT NULL,
                mode TEXT NOT NULL,
                duration INTEGER,
                word_count INTEGER,
                text_source TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                punctuation BOOLEAN NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                total_chars INTEGER NOT NULL,
                correct_chars INTEGER NOT NULL,
                incorrect_chars INTEGER NOT NULL,
                elapsed_ms INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn,
            capacity: capacity.max(1),
        })
    }

    pub fn count(&self) -> Result<usize, PersistenceError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Writes every retained result, oldest first, as CSV with a header row.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, PersistenceError> {
        let mut results = self.recent(self.capacity)?;
        results.reverse();

        let mut csv_writer = csv::Writer::from_writer(writer);
        for result in &results {
            csv_writer.serialize(CsvRow::from(result))?;
        }
        csv_writer.flush()?;
        Ok(results.len())
    }

    fn evict_oldest(&self) -> Result<usize, PersistenceError> {
        let evicted = self.conn.execute(
            "DELETE FROM results WHERE seq NOT IN (SELECT seq FROM results ORDER BY seq DESC LIMIT ?1)",
            params![self.capacity as i64],
        )?;
        Ok(evicted)
    }
}

impl HistorySink for SqliteHistory {
    fn persist(&mut self, result: &TestResult) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO results
            (id, timestamp, mode, duration, word_count, text_source, difficulty, punctuation,
             wpm, accuracy, total_chars, correct_chars, incorrect_chars, elapsed_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                result.id.to_string(),
                result.timestamp.to_rfc3339(),
                result.mode.to_string(),
                result.duration,
                result.word_count.map(|n| n as i64),
                result.text_source,
                result.difficulty.to_string(),
                result.punctuation,
                result.wpm,
                result.accuracy,
                result.total_chars as i64,
                result.correct_chars as i64,
                result.incorrect_chars as i64,
                result.elapsed_ms as i64,
            ],
        )?;
        tx.commit()?;

        let evicted = self.evict_oldest()?;
        if evicted > 0 {
            tracing::debug!(evicted, "evicted old results");
        }
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<TestResult>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, timestamp, mode, duration, word_count, text_source, difficulty, punctuation,
                   wpm, accuracy, total_chars, correct_chars, incorrect_chars, elapsed_ms
            FROM results
            ORDER BY seq DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], StoredRow::from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?.into_result()?);
        }
        Ok(results)
    }
}

/// Raw column values, validated into a [`TestResult`] after the query
struct StoredRow {
    id: String,
    timestamp: String,
    mode: String,
    duration: Option<u32>,
    word_count: Option<i64>,
    text_source: String,
    difficulty: String,
    punctuation: bool,
    wpm: u32,
    accuracy: u32,
    total_chars: i64,
    correct_chars: i64,
    incorrect_chars: i64,
    elapsed_ms: i64,
}

impl StoredRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            mode: row.get(2)?,
            duration: row.get(3)?,
            word_count: row.get(4)?,
            text_source: row.get(5)?,
            difficulty: row.get(6)?,
            punctuation: row.get(7)?,
            wpm: row.get(8)?,
            accuracy: row.get(9)?,
            total_chars: row.get(10)?,
            correct_chars: row.get(11)?,
            incorrect_chars: row.get(12)?,
            elapsed_ms: row.get(13)?,
        })
    }

    fn into_result(self) -> Result<TestResult, PersistenceError> {
        let invalid = |what: &str, value: &str| {
            PersistenceError::InvalidRecord(format!("{what} `{value}` in result {}", self.id))
        };

        let id = Uuid::parse_str(&self.id).map_err(|_| invalid("id", &self.id))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|_| invalid("timestamp", &self.timestamp))?
            .with_timezone(&Utc);
        let mode = match self.mode.as_str() {
            "time" => TestMode::Time,
            "words" => TestMode::Words,
            "quote" => TestMode::Quote,
            other => return Err(invalid("mode", other)),
        };
        let difficulty = match self.difficulty.as_str() {
            "Normal" => Difficulty::Normal,
            "Expert" => Difficulty::Expert,
            "Master" => Difficulty::Master,
            other => return Err(invalid("difficulty", other)),
        };

        Ok(TestResult {
            id,
            timestamp,
            mode,
            duration: self.duration,
            word_count: self.word_count.map(|n| n.max(0) as usize),
            text_source: self.text_source,
            difficulty,
            punctuation: self.punctuation,
            wpm: self.wpm,
            accuracy: self.accuracy,
            total_chars: self.total_chars.max(0) as usize,
            correct_chars: self.correct_chars.max(0) as usize,
            incorrect_chars: self.incorrect_chars.max(0) as usize,
            elapsed_ms: self.elapsed_ms.max(0) as u64,
        })
    }
}

/// One exported CSV line, elapsed time in seconds
#[derive(Serialize)]
struct CsvRow<'a> {
    id: String,
    timestamp: String,
    mode: String,
    duration: String,
    word_count: String,
    text_source: &'a str,
    difficulty: String,
    punctuation: bool,
    wpm: u32,
    accuracy: u32,
    total_chars: usize,
    correct_chars: usize,
    incorrect_chars: usize,
    elapsed_secs: String,
}

impl<'a> From<&'a TestResult> for CsvRow<'a> {
    fn from(r: &'a TestResult) -> Self {
        Self {
            id: r.id.to_string(),
            timestamp: r.timestamp.to_rfc3339(),
            mode: r.mode.to_string(),
            duration: r.duration.map_or(String::new(), |d| d.to_string()),
            word_count: r.word_count.map_or(String::new(), |w| w.to_string()),
            text_source: &r.text_source,
            difficulty: r.difficulty.to_string(),
            punctuation: r.punctuation,
            wpm: r.wpm,
            accuracy: r.accuracy,
            total_chars: r.total_chars,
            correct_chars: r.correct_chars,
            incorrect_chars: r.incorrect_chars,
            elapsed_secs: format!("{:.2}", r.elapsed_ms as f64 / 1000.0),
        }
    }
}
