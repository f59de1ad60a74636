use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use tracing::error;

use twelve_points::config::Config;
use twelve_points::questions::parse_code;
use twelve_points::store::ContestStore;
use twelve_points::{telemetry, FilterContext, QuestionRecord, QuizGenerator, RecordKind};

/// Contests shown per `editions` page
const EDITIONS_PER_PAGE: usize = 5;

/// Entries shown per `country` page
const ENTRIES_PER_PAGE: usize = 10;

struct Session {
    score: u32,
    possible: u32,
    played: u32,
    filter: FilterContext,
}

impl Session {
    fn print_summary(&self) {
        println!("Questions played: {}", self.played);
        println!("Total score: {}/{}", self.score, self.possible);
    }
}

fn main() {
    telemetry::init_tracing();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open contest archive");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let generator = QuizGenerator::new(store.as_ref())
        .with_max_attempts(config.max_attempts)
        .with_mode(config.draw_mode());
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = Session {
        score: 0,
        possible: 0,
        played: 0,
        filter: FilterContext::unrestricted(),
    };

    println!("Welcome to Twelve Points (song contest trivia)");
    println!("Commands:");
    println!("  play                 -> play a round of random questions");
    println!("  json                 -> print a round as JSON");
    println!("  list                 -> show all question codes");
    println!("  <code>               -> play one question of that kind (e.g., first_year)");
    println!("  years <y> [<y>...]   -> restrict questions to these years");
    println!("  countries <a>, <b>   -> restrict questions to these countries");
    println!("  filter | clear       -> show / drop the restrictions");
    println!("  editions [page]      -> list contests, newest first");
    println!("  edition <year>       -> show one contest");
    println!("  country <code> [page] -> show a country's entries (e.g., country es)");
    println!("  score                -> show session score");
    println!("  quit                 -> exit");
    println!();

    let per_round = config.questions_per_round;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        let raw = match lines.next() {
            Some(Ok(line)) => line.trim().to_string(),
            Some(Err(e)) => {
                eprintln!("Error reading input: {e}");
                break;
            }
            None => break,
        };
        if raw.is_empty() {
            continue;
        }

        let (cmd, rest) = match raw.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (raw.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" => break,
            "score" => {
                println!("\n=== SESSION SCORE ===");
                session.print_summary();
                println!();
            }
            "list" => {
                println!("Available question codes:");
                for (code, meta) in generator.registry() {
                    println!(" - {code}: {}", meta.description);
                }
                println!();
            }
            "filter" => println!("Filter: {}\n", session.filter),
            "clear" => {
                session.filter = FilterContext::unrestricted();
                println!("Filter cleared.\n");
            }
            "years" => {
                let parsed: Result<Vec<i32>, _> =
                    rest.split_whitespace().map(str::parse::<i32>).collect();
                match parsed {
                    Ok(years) => {
                        let countries = session.filter.countries().clone();
                        session.filter = FilterContext::new(years, countries);
                        println!("Filter: {}\n", session.filter);
                    }
                    Err(_) => println!("Years must be numbers, e.g. 'years 1970 1971'.\n"),
                }
            }
            "countries" => {
                let countries: Vec<&str> = rest.split(',').collect();
                session.filter = FilterContext::new(session.filter.years().clone(), countries);
                println!("Filter: {}\n", session.filter);
            }
            "play" => match generator.generate(per_round, &session.filter, &mut rng) {
                Ok(records) => {
                    for record in &records {
                        ask(record, &mut lines, &mut session);
                    }
                }
                Err(e) => println!("Not enough data for this filter: {e}\n"),
            },
            "json" => match generator.generate(per_round, &session.filter, &mut rng) {
                Ok(records) => {
                    let payload = serde_json::json!({ "preguntas": records });
                    match serde_json::to_string_pretty(&payload) {
                        Ok(text) => println!("{text}\n"),
                        Err(e) => eprintln!("Error encoding questions: {e}"),
                    }
                }
                Err(e) => println!("Not enough data for this filter: {e}\n"),
            },
            "editions" => {
                let page = rest.parse::<usize>().unwrap_or(1);
                match store.editions(page, EDITIONS_PER_PAGE) {
                    Ok(editions) if editions.is_empty() => {
                        println!("No contests on page {page}.\n")
                    }
                    Ok(editions) => {
                        for e in editions {
                            println!(
                                "{} | {} ({}) | {} entries",
                                e.year, e.host_city, e.host_country, e.entry_count
                            );
                        }
                        println!();
                    }
                    Err(e) => eprintln!("Error listing contests: {e}"),
                }
            }
            "edition" => match rest.parse::<i32>() {
                Ok(year) => show_edition(store.as_ref(), year),
                Err(_) => println!("Usage: edition <year>\n"),
            },
            "country" => {
                let mut parts = rest.split_whitespace();
                match parts.next() {
                    Some(code) => {
                        let page = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
                        show_country(store.as_ref(), &code.to_lowercase(), page);
                    }
                    None => println!("Usage: country <code> [page]\n"),
                }
            }
            other => {
                if let Some((code, meta)) = parse_code(other, generator.registry()) {
                    println!("Code: {code}");
                    println!("Description: {}", meta.description);
                    match generator.generate_kind(meta.kind, &session.filter, &mut rng) {
                        Ok(record) => ask(&record, &mut lines, &mut session),
                        Err(e) => println!("Could not build that question: {e}\n"),
                    }
                } else {
                    println!("Unknown command or code: '{other}'");
                    println!("Type 'list' to see available codes.\n");
                }
            }
        }
    }

    println!("\n=== SESSION SUMMARY ===");
    session.print_summary();
    println!("Goodbye!");
}

/// Shows one question, reads an option number and scores it.
fn ask<I>(record: &QuestionRecord, lines: &mut I, session: &mut Session)
where
    I: Iterator<Item = io::Result<String>>,
{
    println!("--- TRIVIA ---");
    println!("{}", record.question_text);
    if record.kind == RecordKind::Video {
        if let (Some(url), Some(id)) = (&record.media_url, &record.media_id) {
            println!("Video: {url} (id {id})");
        }
    }
    for (i, option) in record.answer_options.iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }

    session.played += 1;
    session.possible += record.score_weight;

    let choice = loop {
        print!("Your answer (1-{}): ", record.answer_options.len());
        io::stdout().flush().ok();
        match lines.next() {
            Some(Ok(line)) => match line.trim().parse::<usize>() {
                Ok(n) if (1..=record.answer_options.len()).contains(&n) => break Some(n - 1),
                _ => println!("Pick a number between 1 and {}.", record.answer_options.len()),
            },
            Some(Err(_)) | None => break None,
        }
    };

    if choice == Some(record.correct_index) {
        session.score += record.score_weight;
        println!("Correct! (+{} points)", record.score_weight);
    } else {
        println!(
            "Wrong! The answer was {}) {}",
            record.correct_index + 1,
            record.answer_options[record.correct_index]
        );
    }
    println!();
}

fn show_edition(store: &dyn ContestStore, year: i32) {
    match store.contest(year) {
        Ok(contest) => {
            println!("{} | {} ({})", contest.year, contest.host_city, contest.host_country);
            for e in &contest.entries {
                println!(
                    "{:>2}. {} - {} \"{}\" ({} pts)",
                    e.placement, e.country, e.artist, e.song, e.score
                );
            }
            println!();
        }
        Err(e) => println!("{e}\n"),
    }
}

fn show_country(store: &dyn ContestStore, code: &str, page: usize) {
    match store.participations(code, page, ENTRIES_PER_PAGE) {
        Ok(entries) if entries.is_empty() => println!("No entries on page {page}.\n"),
        Ok(entries) => {
            for p in entries {
                println!(
                    "{} | {} - \"{}\" | place {} ({} pts)",
                    p.year, p.entry.artist, p.entry.song, p.entry.placement, p.entry.score
                );
            }
            println!();
        }
        Err(e) => println!("{e}\n"),
    }
}
