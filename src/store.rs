//! Data-access port over the contest archive.
//!
//! Backends answer plain, deterministically ordered queries; the sampling
//! methods are provided on top of them so every backend draws the same way
//! from the injected random source.
use rand::seq::SliceRandom;
use rand::RngCore;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{Result, TriviaError};
use crate::filter::FilterContext;
use crate::model::{ContestRecord, Entry, EntryInContest};

/// Entry column used for grouping and matching in distractor queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Country,
    Song,
    Artist,
}

impl EntryField {
    pub fn column(self) -> &'static str {
        match self {
            EntryField::Country => "country",
            EntryField::Song => "song",
            EntryField::Artist => "artist",
        }
    }

    pub fn value_of(self, entry: &Entry) -> &str {
        match self {
            EntryField::Country => &entry.country,
            EntryField::Song => &entry.song,
            EntryField::Artist => &entry.artist,
        }
    }
}

/// Summary row for the archive listing
#[derive(Debug, Clone, PartialEq)]
pub struct EditionSummary {
    pub year: i32,
    pub host_country: String,
    pub host_city: String,
    pub entry_count: usize,
}

pub trait ContestStore: Send + Sync {
    /// Entries matching `filter`, ordered by year then placement.
    fn entries(&self, filter: &FilterContext) -> Result<Vec<EntryInContest>>;

    /// Distinct years with at least one entry matching `filter`, ascending.
    fn years(&self, filter: &FilterContext) -> Result<Vec<i32>>;

    /// Distinct countries with at least one entry matching `filter`, ascending.
    fn countries(&self, filter: &FilterContext) -> Result<Vec<String>>;

    /// Distinct values of `group` over the whole archive, excluding `exclude`
    /// and optionally restricted to entries where `matching` holds. Ascending.
    fn group_values(
        &self,
        group: EntryField,
        exclude: &str,
        matching: Option<(EntryField, &str)>,
    ) -> Result<Vec<String>>;

    /// First year `country` took part, over the whole archive.
    fn earliest_year_for(&self, country: &str) -> Result<i32>;

    /// Average score per country over `start..=end`, best first.
    /// Equal averages are ordered by country name.
    fn average_score_by_country(&self, start: i32, end: i32) -> Result<Vec<(String, f64)>>;

    /// The placement 1 entry of `year`.
    fn winner_of(&self, year: i32) -> Result<Entry>;

    /// The full contest of `year`, entries ordered by placement.
    fn contest(&self, year: i32) -> Result<ContestRecord>;

    /// One page of contests, newest first.
    fn editions(&self, page: usize, per_page: usize) -> Result<Vec<EditionSummary>>;

    /// One page of a country's entries (by country code), newest first.
    fn participations(
        &self,
        country_code: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<EntryInContest>>;

    /// Up to `count` entries drawn uniformly from those matching `filter`.
    fn sample_entries(
        &self,
        count: usize,
        filter: &FilterContext,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EntryInContest>> {
        let pool = self.entries(filter)?;
        if pool.is_empty() {
            return Err(TriviaError::EmptyResult(format!(
                "no entries for {filter}"
            )));
        }
        Ok(pool.choose_multiple(rng, count).cloned().collect())
    }

    /// `count` distinct years in scope, without replacement.
    fn sample_years(
        &self,
        count: usize,
        filter: &FilterContext,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<i32>> {
        let pool = self.years(filter)?;
        if pool.len() < count || pool.is_empty() {
            return Err(TriviaError::EmptyResult(format!(
                "{} years available for {filter}, {count} requested",
                pool.len()
            )));
        }
        Ok(pool.choose_multiple(rng, count).copied().collect())
    }

    /// Up to `count` distinct countries with an entry in scope.
    fn sample_countries(
        &self,
        count: usize,
        filter: &FilterContext,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<String>> {
        let pool = self.countries(filter)?;
        if pool.is_empty() {
            return Err(TriviaError::EmptyResult(format!(
                "no countries for {filter}"
            )));
        }
        Ok(pool.choose_multiple(rng, count).cloned().collect())
    }

    /// Up to `sample_size` distinct `group` values other than `exclude`.
    /// Returns fewer when the pool is smaller.
    fn group_and_sample(
        &self,
        group: EntryField,
        exclude: &str,
        matching: Option<(EntryField, &str)>,
        sample_size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<String>> {
        let pool = self.group_values(group, exclude, matching)?;
        Ok(pool.choose_multiple(rng, sample_size).cloned().collect())
    }
}

/// `(offset, limit)` for a 1-based page. Offsets past `usize::MAX` saturate.
pub(crate) fn page_bounds(page: usize, per_page: usize) -> (usize, usize) {
    let page = page.max(1);
    ((page - 1).saturating_mul(per_page), per_page)
}

/// Decimal places kept on an average before ranking
const AVERAGE_PRECISION: f64 = 1e6;

/// Averages `(country, score)` rows per country, best first, equal averages
/// by country name.
///
/// Scores are summed in the order given and the average is rounded to six
/// decimals, so sums that differ only by float rounding rank as equal.
pub(crate) fn rank_by_average<'a, I>(scores: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut totals: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
    for (country, score) in scores {
        let slot = totals.entry(country).or_insert((0.0, 0));
        slot.0 += score;
        slot.1 += 1;
    }

    let mut ranked: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(country, (sum, n))| {
            let avg = (sum / f64::from(n) * AVERAGE_PRECISION).round() / AVERAGE_PRECISION;
            (country.to_string(), avg)
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}
