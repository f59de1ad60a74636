//! In-memory contest store, loaded from a JSON dataset.
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Result, TriviaError};
use crate::filter::FilterContext;
use crate::model::{parse_corpus, validate_corpus, ContestRecord, Entry, EntryInContest};
use crate::store::{page_bounds, rank_by_average, ContestStore, EditionSummary, EntryField};

/// Contest archive held in memory, sorted by year with entries by placement.
pub struct MemoryStore {
    contests: Vec<ContestRecord>,
}

impl MemoryStore {
    pub fn new(mut contests: Vec<ContestRecord>) -> Result<Self> {
        validate_corpus(&contests)?;
        contests.sort_by_key(|c| c.year);
        for contest in &mut contests {
            contest.entries.sort_by_key(|e| e.placement);
        }
        Ok(MemoryStore { contests })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::new(parse_corpus(&raw)?)
    }

    pub fn contests(&self) -> &[ContestRecord] {
        &self.contests
    }

    fn all_entries(&self) -> impl Iterator<Item = (&ContestRecord, &Entry)> {
        self.contests
            .iter()
            .flat_map(|c| c.entries.iter().map(move |e| (c, e)))
    }

    fn find(&self, year: i32) -> Option<&ContestRecord> {
        self.contests.iter().find(|c| c.year == year)
    }
}

fn with_context(contest: &ContestRecord, entry: &Entry) -> EntryInContest {
    EntryInContest {
        year: contest.year,
        host_country: contest.host_country.clone(),
        host_city: contest.host_city.clone(),
        entry: entry.clone(),
    }
}

impl ContestStore for MemoryStore {
    fn entries(&self, filter: &FilterContext) -> Result<Vec<EntryInContest>> {
        Ok(self
            .all_entries()
            .filter(|(c, e)| filter.matches(c.year, &e.country))
            .map(|(c, e)| with_context(c, e))
            .collect())
    }

    fn years(&self, filter: &FilterContext) -> Result<Vec<i32>> {
        let years: BTreeSet<i32> = self
            .all_entries()
            .filter(|(c, e)| filter.matches(c.year, &e.country))
            .map(|(c, _)| c.year)
            .collect();
        Ok(years.into_iter().collect())
    }

    fn countries(&self, filter: &FilterContext) -> Result<Vec<String>> {
        let countries: BTreeSet<&str> = self
            .all_entries()
            .filter(|(c, e)| filter.matches(c.year, &e.country))
            .map(|(_, e)| e.country.as_str())
            .collect();
        Ok(countries.into_iter().map(str::to_string).collect())
    }

    fn group_values(
        &self,
        group: EntryField,
        exclude: &str,
        matching: Option<(EntryField, &str)>,
    ) -> Result<Vec<String>> {
        let values: BTreeSet<&str> = self
            .all_entries()
            .map(|(_, e)| e)
            .filter(|e| matching.map_or(true, |(field, value)| field.value_of(e) == value))
            .map(|e| group.value_of(e))
            .filter(|v| *v != exclude)
            .collect();
        Ok(values.into_iter().map(str::to_string).collect())
    }

    fn earliest_year_for(&self, country: &str) -> Result<i32> {
        self.all_entries()
            .filter(|(_, e)| e.country == country)
            .map(|(c, _)| c.year)
            .min()
            .ok_or_else(|| {
                TriviaError::NotFound(format!("country {country} never participated"))
            })
    }

    fn average_score_by_country(&self, start: i32, end: i32) -> Result<Vec<(String, f64)>> {
        Ok(rank_by_average(
            self.all_entries()
                .filter(|(c, _)| c.year >= start && c.year <= end)
                .map(|(_, e)| (e.country.as_str(), e.score)),
        ))
    }

    fn winner_of(&self, year: i32) -> Result<Entry> {
        self.find(year)
            .and_then(|c| c.winner())
            .cloned()
            .ok_or_else(|| TriviaError::NotFound(format!("no winner recorded for {year}")))
    }

    fn contest(&self, year: i32) -> Result<ContestRecord> {
        self.find(year)
            .cloned()
            .ok_or_else(|| TriviaError::NotFound(format!("no contest in {year}")))
    }

    fn editions(&self, page: usize, per_page: usize) -> Result<Vec<EditionSummary>> {
        let (offset, limit) = page_bounds(page, per_page);
        Ok(self
            .contests
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|c| EditionSummary {
                year: c.year,
                host_country: c.host_country.clone(),
                host_city: c.host_city.clone(),
                entry_count: c.entries.len(),
            })
            .collect())
    }

    fn participations(
        &self,
        country_code: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<EntryInContest>> {
        let mut found: Vec<EntryInContest> = self
            .all_entries()
            .filter(|(_, e)| e.country_code == country_code)
            .map(|(c, e)| with_context(c, e))
            .collect();
        if found.is_empty() {
            return Err(TriviaError::NotFound(format!("country code {country_code}")));
        }

        found.reverse();
        let (offset, limit) = page_bounds(page, per_page);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_store::SqliteStore;
    use crate::testdata::{memory_store, sample_corpus};

    #[test]
    fn test_rejects_invalid_corpus() {
        let mut corpus = sample_corpus();
        corpus[0].entries[0].placement = 2;
        assert!(MemoryStore::new(corpus).is_err());
    }

    #[test]
    fn test_matches_sqlite_backend() {
        let memory = memory_store();
        let sqlite = SqliteStore::open_in_memory().unwrap();
        sqlite.import(&sample_corpus()).unwrap();

        let filter = FilterContext::new([1962, 1971], Vec::<String>::new());
        assert_eq!(memory.years(&filter).unwrap(), sqlite.years(&filter).unwrap());
        assert_eq!(
            memory.countries(&filter).unwrap(),
            sqlite.countries(&filter).unwrap()
        );
        assert_eq!(memory.entries(&filter).unwrap(), sqlite.entries(&filter).unwrap());
        assert_eq!(
            memory.average_score_by_country(1961, 1971).unwrap(),
            sqlite.average_score_by_country(1961, 1971).unwrap()
        );
        assert_eq!(
            memory
                .group_values(EntryField::Artist, "Karina", Some((EntryField::Country, "Spain")))
                .unwrap(),
            sqlite
                .group_values(EntryField::Artist, "Karina", Some((EntryField::Country, "Spain")))
                .unwrap()
        );
        assert_eq!(memory.contest(1970).unwrap(), sqlite.contest(1970).unwrap());
        assert_eq!(memory.editions(1, 3).unwrap(), sqlite.editions(1, 3).unwrap());
        assert_eq!(
            memory.participations("gb", 1, 10).unwrap(),
            sqlite.participations("gb", 1, 10).unwrap()
        );
    }

    #[test]
    fn test_fractional_averages_rank_alike() {
        let mut corpus = sample_corpus();
        let thirds = [0.1, 0.2, 0.3];
        for (i, contest) in corpus.iter_mut().take(3).enumerate() {
            for entry in contest.entries.iter_mut() {
                entry.score = match entry.country.as_str() {
                    "Luxembourg" | "France" => thirds[i],
                    "Italy" | "Spain" => thirds[2 - i],
                    _ => entry.score,
                };
            }
        }
        let memory = MemoryStore::new(corpus.clone()).unwrap();
        let sqlite = SqliteStore::open_in_memory().unwrap();
        sqlite.import(&corpus).unwrap();

        let from_memory = memory.average_score_by_country(1961, 1970).unwrap();
        assert_eq!(from_memory, sqlite.average_score_by_country(1961, 1970).unwrap());
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let store = memory_store();
        assert!(store.editions(usize::MAX, 5).unwrap().is_empty());
        assert!(store.participations("gb", usize::MAX, 10).unwrap().is_empty());
    }

    #[test]
    fn test_country_filter_limits_years() {
        let store = memory_store();
        let filter = FilterContext::new(Vec::new(), ["Netherlands"]);
        assert_eq!(store.years(&filter).unwrap(), vec![1970]);
    }

    #[test]
    fn test_earliest_year() {
        let store = memory_store();
        assert_eq!(store.earliest_year_for("Ireland").unwrap(), 1970);
        assert_eq!(store.earliest_year_for("Spain").unwrap(), 1961);
    }
}
