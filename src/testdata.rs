//! Shared fixture corpus for unit tests.
use crate::memory_store::MemoryStore;
use crate::model::{parse_corpus, ContestRecord};

pub fn sample_corpus() -> Vec<ContestRecord> {
    parse_corpus(include_str!("../tests/fixtures/contests.json")).expect("fixture corpus is valid")
}

pub fn memory_store() -> MemoryStore {
    MemoryStore::new(sample_corpus()).expect("fixture corpus is valid")
}
