//! Questions played over a performance video.
use rand::RngCore;
use tracing::warn;
use url::Url;

use crate::error::Result;
use crate::filter::FilterContext;
use crate::questions::{first, Draft, StrategyKind, DISTRACTORS};
use crate::store::{ContestStore, EntryField};

/// Shown when a video link cannot be turned into an id
pub const PLACEHOLDER_MEDIA_ID: &str = "dQw4w9WgXcQ";

/// Video id for the player: the last path segment of the URL.
///
/// Watch links (`/watch?v=<id>`) are the exception: their `v` query
/// parameter is the id. Unusable links fall back to [`PLACEHOLDER_MEDIA_ID`].
pub fn media_id(raw: &str) -> String {
    let parsed = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(e) => {
            warn!(url = raw, error = %e, "unparseable media url, using placeholder");
            return PLACEHOLDER_MEDIA_ID.to_string();
        }
    };

    if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| *k == "v") {
        if !v.is_empty() {
            return v.into_owned();
        }
    }

    match parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    {
        Some(segment) => segment.to_string(),
        None => {
            warn!(url = raw, "media url has no path, using placeholder");
            PLACEHOLDER_MEDIA_ID.to_string()
        }
    }
}

/// "Which country did this performance represent?"
pub(crate) fn country_of_performance(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let pick = first(store.sample_entries(1, filter, rng)?, "entry in scope")?;
    let entry = pick.entry;
    let pool =
        store.group_and_sample(EntryField::Country, &entry.country, None, DISTRACTORS, rng)?;

    Ok(Draft::assemble(
        StrategyKind::CountryOfPerformance,
        "Which country did this performance represent?".to_string(),
        entry.country,
        pool,
    )?
    .with_media(&entry.media_url))
}

/// "What is the title of this song?" Wrong titles are songs from the same country.
pub(crate) fn song_title(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let pick = first(store.sample_entries(1, filter, rng)?, "entry in scope")?;
    let entry = pick.entry;
    let pool = store.group_and_sample(
        EntryField::Song,
        &entry.song,
        Some((EntryField::Country, &entry.country)),
        DISTRACTORS,
        rng,
    )?;

    Ok(Draft::assemble(
        StrategyKind::SongTitle,
        "What is the title of this song?".to_string(),
        entry.song,
        pool,
    )?
    .with_media(&entry.media_url))
}

/// "Who performed this song?" Wrong performers are from the same country.
pub(crate) fn performer_name(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let pick = first(store.sample_entries(1, filter, rng)?, "entry in scope")?;
    let entry = pick.entry;
    let pool = store.group_and_sample(
        EntryField::Artist,
        &entry.artist,
        Some((EntryField::Country, &entry.country)),
        DISTRACTORS,
        rng,
    )?;

    Ok(Draft::assemble(
        StrategyKind::PerformerName,
        "Who performed this song?".to_string(),
        entry.artist,
        pool,
    )?
    .with_media(&entry.media_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriviaError;
    use crate::questions::draw;
    use crate::testdata::memory_store;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_media_id_short_link() {
        assert_eq!(media_id("https://youtu.be/es1970gwend"), "es1970gwend");
    }

    #[test]
    fn test_media_id_watch_link() {
        assert_eq!(
            media_id("https://www.youtube.com/watch?v=ie1970akoev&t=12"),
            "ie1970akoev"
        );
    }

    #[test]
    fn test_media_id_trailing_slash() {
        assert_eq!(media_id("https://example.org/videos/abc/"), "abc");
    }

    #[test]
    fn test_media_id_falls_back() {
        assert_eq!(media_id("not a url"), PLACEHOLDER_MEDIA_ID);
        assert_eq!(media_id(""), PLACEHOLDER_MEDIA_ID);
        assert_eq!(media_id("https://youtu.be"), PLACEHOLDER_MEDIA_ID);
    }

    #[test]
    fn test_song_title_distractors_share_country() {
        let store = memory_store();
        // Spain is the only country with four distinct songs in the fixture
        let filter = FilterContext::new(Vec::new(), ["Spain"]);
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let draft = draw(StrategyKind::SongTitle, &filter, &store, &mut rng).unwrap();
            let spanish = store
                .group_values(EntryField::Song, "", Some((EntryField::Country, "Spain")))
                .unwrap();
            assert!(spanish.contains(&draft.correct_answer));
            for wrong in &draft.distractors {
                assert!(spanish.contains(wrong));
            }
            assert!(draft.media.is_some());
        }
    }

    #[test]
    fn test_performer_name_needs_three_other_artists() {
        let store = memory_store();
        // Two German entries, both by the same artist
        let filter = FilterContext::new(Vec::new(), ["Germany"]);
        let mut rng = StdRng::seed_from_u64(1);
        let result = draw(StrategyKind::PerformerName, &filter, &store, &mut rng);
        assert!(matches!(result, Err(TriviaError::InsufficientData(_))));
    }

    #[test]
    fn test_country_of_performance_media_never_fails() {
        let store = memory_store();
        // 1962 includes an entry whose link is not a url
        let filter = FilterContext::new([1962], ["Spain"]);
        let mut rng = StdRng::seed_from_u64(4);
        let draft = draw(StrategyKind::CountryOfPerformance, &filter, &store, &mut rng).unwrap();
        assert_eq!(draft.correct_answer, "Spain");
        let media = draft.media.unwrap();
        assert_eq!(media.url, "not a url");
        assert_eq!(media.id, PLACEHOLDER_MEDIA_ID);
    }
}
