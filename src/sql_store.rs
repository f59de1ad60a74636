//! SQLite-backed contest store.
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::error::{Result, TriviaError};
use crate::filter::FilterContext;
use crate::model::{validate_corpus, ContestRecord, Entry, EntryInContest};
use crate::store::{page_bounds, rank_by_average, ContestStore, EditionSummary, EntryField};

/// Default path of the SQLite database file
pub const DB_PATH: &str = "contests.sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contests (
    year         INTEGER PRIMARY KEY,
    host_country TEXT NOT NULL,
    host_city    TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS entries (
    year         INTEGER NOT NULL REFERENCES contests(year),
    country      TEXT NOT NULL,
    country_code TEXT NOT NULL,
    artist       TEXT NOT NULL,
    song         TEXT NOT NULL,
    placement    INTEGER NOT NULL CHECK (placement >= 1),
    score        REAL NOT NULL,
    media_url    TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (year, placement)
);
CREATE INDEX IF NOT EXISTS idx_entries_country ON entries(country);
CREATE INDEX IF NOT EXISTS idx_entries_country_code ON entries(country_code);
";

const ENTRY_COLUMNS: &str = "c.year, c.host_country, c.host_city, \
     e.country, e.country_code, e.artist, e.song, e.placement, e.score, e.media_url";

/// Contest archive stored in SQLite.
///
/// The connection sits behind a mutex so one store can serve concurrent
/// question draws.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Reads only; a panic elsewhere leaves the connection usable.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates and inserts contests in a single transaction.
    pub fn import(&self, contests: &[ContestRecord]) -> Result<()> {
        validate_corpus(contests)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut insert_contest = tx.prepare(
                "INSERT INTO contests (year, host_country, host_city) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_entry = tx.prepare(
                "INSERT INTO entries \
                 (year, country, country_code, artist, song, placement, score, media_url) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for contest in contests {
                insert_contest.execute(params![
                    contest.year,
                    contest.host_country,
                    contest.host_city
                ])?;
                for e in &contest.entries {
                    insert_entry.execute(params![
                        contest.year,
                        e.country,
                        e.country_code,
                        e.artist,
                        e.song,
                        e.placement,
                        e.score,
                        e.media_url
                    ])?;
                }
            }
        }
        tx.commit()?;

        info!(contests = contests.len(), "imported contest archive");
        Ok(())
    }

    pub fn contest_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM contests", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_entries(
        &self,
        where_sql: &str,
        values: Vec<Value>,
        tail: &str,
    ) -> Result<Vec<EntryInContest>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS}\n\
             FROM entries e\n\
             JOIN contests c ON c.year = e.year\n\
             WHERE {where_sql}\n\
             {tail}"
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), entry_in_contest_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn query_strings(&self, sql: &str, values: Vec<Value>) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// Builds the `WHERE` fragment and bound values restricting entries `e` to `filter`.
fn scope_clause(filter: &FilterContext) -> (String, Vec<Value>) {
    let mut clauses = vec!["1 = 1".to_string()];
    let mut values = Vec::new();

    if !filter.years().is_empty() {
        let marks = vec!["?"; filter.years().len()].join(", ");
        clauses.push(format!("e.year IN ({marks})"));
        values.extend(filter.years().iter().map(|y| Value::Integer(i64::from(*y))));
    }
    if !filter.countries().is_empty() {
        let marks = vec!["?"; filter.countries().len()].join(", ");
        clauses.push(format!("e.country IN ({marks})"));
        values.extend(filter.countries().iter().map(|c| Value::Text(c.clone())));
    }

    (clauses.join(" AND "), values)
}

/// [`page_bounds`] as SQLite integers; offsets beyond `i64::MAX` clamp to it.
fn sql_page_bounds(page: usize, per_page: usize) -> (i64, i64) {
    let (offset, limit) = page_bounds(page, per_page);
    (
        i64::try_from(offset).unwrap_or(i64::MAX),
        i64::try_from(limit).unwrap_or(i64::MAX),
    )
}

fn entry_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Entry> {
    Ok(Entry {
        country: row.get(offset)?,
        country_code: row.get(offset + 1)?,
        artist: row.get(offset + 2)?,
        song: row.get(offset + 3)?,
        placement: row.get(offset + 4)?,
        score: row.get(offset + 5)?,
        media_url: row.get(offset + 6)?,
    })
}

fn entry_in_contest_from_row(row: &Row<'_>) -> rusqlite::Result<EntryInContest> {
    Ok(EntryInContest {
        year: row.get(0)?,
        host_country: row.get(1)?,
        host_city: row.get(2)?,
        entry: entry_from_row(row, 3)?,
    })
}

impl ContestStore for SqliteStore {
    fn entries(&self, filter: &FilterContext) -> Result<Vec<EntryInContest>> {
        let (where_sql, values) = scope_clause(filter);
        self.query_entries(&where_sql, values, "ORDER BY e.year, e.placement")
    }

    fn years(&self, filter: &FilterContext) -> Result<Vec<i32>> {
        let (where_sql, values) = scope_clause(filter);
        let sql = format!(
            "SELECT DISTINCT e.year FROM entries e WHERE {where_sql} ORDER BY e.year"
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, i32>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn countries(&self, filter: &FilterContext) -> Result<Vec<String>> {
        let (where_sql, values) = scope_clause(filter);
        let sql = format!(
            "SELECT DISTINCT e.country FROM entries e WHERE {where_sql} ORDER BY e.country"
        );
        self.query_strings(&sql, values)
    }

    fn group_values(
        &self,
        group: EntryField,
        exclude: &str,
        matching: Option<(EntryField, &str)>,
    ) -> Result<Vec<String>> {
        let column = group.column();
        let mut values = vec![Value::Text(exclude.to_string())];
        let mut sql = format!("SELECT DISTINCT {column} FROM entries WHERE {column} <> ?1");
        if let Some((field, value)) = matching {
            sql.push_str(&format!(" AND {} = ?2", field.column()));
            values.push(Value::Text(value.to_string()));
        }
        sql.push_str(&format!(" ORDER BY {column}"));
        self.query_strings(&sql, values)
    }

    fn earliest_year_for(&self, country: &str) -> Result<i32> {
        let year: Option<i32> = self.conn().query_row(
            "SELECT MIN(year) FROM entries WHERE country = ?1",
            [country],
            |row| row.get(0),
        )?;
        year.ok_or_else(|| TriviaError::NotFound(format!("country {country} never participated")))
    }

    fn average_score_by_country(&self, start: i32, end: i32) -> Result<Vec<(String, f64)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT country, score\n\
             FROM entries\n\
             WHERE year BETWEEN ?1 AND ?2\n\
             ORDER BY year, placement",
        )?;
        let rows = stmt.query_map(params![start, end], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut scores = Vec::new();
        for row in rows {
            scores.push(row?);
        }
        Ok(rank_by_average(
            scores.iter().map(|(country, score)| (country.as_str(), *score)),
        ))
    }

    fn winner_of(&self, year: i32) -> Result<Entry> {
        self.conn()
            .query_row(
                "SELECT country, country_code, artist, song, placement, score, media_url\n\
                 FROM entries WHERE year = ?1 AND placement = 1",
                [year],
                |row| entry_from_row(row, 0),
            )
            .optional()?
            .ok_or_else(|| TriviaError::NotFound(format!("no winner recorded for {year}")))
    }

    fn contest(&self, year: i32) -> Result<ContestRecord> {
        let header = self
            .conn()
            .query_row(
                "SELECT host_country, host_city FROM contests WHERE year = ?1",
                [year],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let (host_country, host_city) =
            header.ok_or_else(|| TriviaError::NotFound(format!("no contest in {year}")))?;

        let entries = self
            .query_entries(
                "e.year = ?1",
                vec![Value::Integer(i64::from(year))],
                "ORDER BY e.placement",
            )?
            .into_iter()
            .map(|e| e.entry)
            .collect();

        Ok(ContestRecord {
            year,
            host_country,
            host_city,
            entries,
        })
    }

    fn editions(&self, page: usize, per_page: usize) -> Result<Vec<EditionSummary>> {
        let (offset, limit) = sql_page_bounds(page, per_page);
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT c.year, c.host_country, c.host_city, COUNT(e.year)\n\
             FROM contests c\n\
             LEFT JOIN entries e ON e.year = c.year\n\
             GROUP BY c.year\n\
             ORDER BY c.year DESC\n\
             LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit, offset], |row| {
            Ok(EditionSummary {
                year: row.get(0)?,
                host_country: row.get(1)?,
                host_city: row.get(2)?,
                entry_count: row.get::<_, i64>(3)? as usize,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn participations(
        &self,
        country_code: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<EntryInContest>> {
        let known: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM entries WHERE country_code = ?1",
            [country_code],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(TriviaError::NotFound(format!("country code {country_code}")));
        }

        let (offset, limit) = sql_page_bounds(page, per_page);
        self.query_entries(
            "e.country_code = ?1",
            vec![
                Value::Text(country_code.to_string()),
                Value::Integer(limit),
                Value::Integer(offset),
            ],
            "ORDER BY e.year DESC LIMIT ?2 OFFSET ?3",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::sample_corpus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.import(&sample_corpus()).unwrap();
        store
    }

    #[test]
    fn test_import_counts_contests() {
        assert_eq!(store().contest_count().unwrap(), 4);
    }

    #[test]
    fn test_import_rejects_duplicate_years() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut corpus = sample_corpus();
        corpus.push(corpus[0].clone());
        assert!(matches!(
            store.import(&corpus),
            Err(TriviaError::InvalidData(_))
        ));
        assert_eq!(store.contest_count().unwrap(), 0);
    }

    #[test]
    fn test_entries_respect_filter() {
        let store = store();
        let filter = FilterContext::new([1962], ["Spain"]);
        let entries = store.entries(&filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].year, 1962);
        assert_eq!(entries[0].entry.country, "Spain");
    }

    #[test]
    fn test_earliest_year_ignores_scope() {
        let store = store();
        assert_eq!(store.earliest_year_for("Spain").unwrap(), 1961);
        assert!(matches!(
            store.earliest_year_for("Atlantis"),
            Err(TriviaError::NotFound(_))
        ));
    }

    #[test]
    fn test_winner_lookup() {
        let store = store();
        let winner = store.winner_of(1961).unwrap();
        assert_eq!(winner.placement, 1);
        assert_eq!(winner.country, "Luxembourg");
        assert!(matches!(store.winner_of(1900), Err(TriviaError::NotFound(_))));
    }

    #[test]
    fn test_average_ties_break_by_name() {
        let store = store();
        let ranked = store.average_score_by_country(1970, 1970).unwrap();
        let names: Vec<&str> = ranked.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names[0], "Ireland");
        // France and Spain both scored 8 in 1970
        let france = names.iter().position(|c| *c == "France").unwrap();
        let spain = names.iter().position(|c| *c == "Spain").unwrap();
        assert_eq!(spain, france + 1);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_group_values_same_country() {
        let store = store();
        let songs = store
            .group_values(
                EntryField::Song,
                "Estando contigo",
                Some((EntryField::Country, "Spain")),
            )
            .unwrap();
        assert!(!songs.contains(&"Estando contigo".to_string()));
        assert!(songs.iter().all(|s| !s.is_empty()));
        assert_eq!(songs.len(), 3);
    }

    #[test]
    fn test_sample_years_fails_when_too_few() {
        let store = store();
        let mut rng = StdRng::seed_from_u64(1);
        let filter = FilterContext::new([1970], Vec::<String>::new());
        assert_eq!(store.sample_years(1, &filter, &mut rng).unwrap(), vec![1970]);
        assert!(matches!(
            store.sample_years(2, &filter, &mut rng),
            Err(TriviaError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_sample_entries_empty_scope() {
        let store = store();
        let mut rng = StdRng::seed_from_u64(1);
        let filter = FilterContext::new([2050], Vec::<String>::new());
        assert!(matches!(
            store.sample_entries(1, &filter, &mut rng),
            Err(TriviaError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_contest_entries_ordered_by_placement() {
        let contest = store().contest(1962).unwrap();
        assert_eq!(contest.host_city, "Luxembourg");
        let placements: Vec<u32> = contest.entries.iter().map(|e| e.placement).collect();
        let mut sorted = placements.clone();
        sorted.sort();
        assert_eq!(placements, sorted);
    }

    #[test]
    fn test_editions_newest_first() {
        let store = store();
        let page = store.editions(1, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].year, 1971);
        assert_eq!(page[1].year, 1970);
        let rest = store.editions(2, 2).unwrap();
        assert_eq!(rest[0].year, 1962);
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let store = store();
        assert!(store.editions(usize::MAX, 5).unwrap().is_empty());
        assert!(store.participations("es", usize::MAX, 10).unwrap().is_empty());
    }

    #[test]
    fn test_participations_by_code() {
        let store = store();
        let spain = store.participations("es", 1, 10).unwrap();
        assert_eq!(spain.len(), 4);
        assert!(spain.windows(2).all(|w| w[0].year >= w[1].year));
        assert!(matches!(
            store.participations("zz", 1, 10),
            Err(TriviaError::NotFound(_))
        ));
    }
}
