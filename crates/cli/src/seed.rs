//! Seed-data generator: a fixed fruit→vegetable corpus written in rounds,
//! with the running index persisted inside the database so repeated `seed`
//! invocations keep numbering where they left off.

use anyhow::Result;
use engine::Db;
use rand::seq::SliceRandom;
use std::time::Instant;

/// Reserved key holding the next seed round index.
const SEED_INDEX_KEY: &[u8] = b"__cli_seed_index__";

const PAIRS: [(&str, &str); 26] = [
    ("apple", "artichoke"),
    ("banana", "broccoli"),
    ("cherry", "cabbage"),
    ("durian", "daikon"),
    ("elderberry", "eggplant"),
    ("fig", "fennel"),
    ("grapefruit", "ginger"),
    ("honeydew", "horseradish"),
    ("imbe", "ivygourd"),
    ("jackfruit", "jicama"),
    ("kiwi", "kale"),
    ("lime", "leek"),
    ("mango", "mushroom"),
    ("nectarine", "nopale"),
    ("orange", "okra"),
    ("peach", "peas"),
    ("quince", "quinoa"),
    ("raspberry", "radish"),
    ("strawberry", "spinach"),
    ("tangerine", "tomato"),
    ("ugni", "ube"),
    ("voavanga", "vanilla"),
    ("watermelon", "watercress"),
    ("ximenia", "xanthan"),
    ("yuzu", "yam"),
    ("zarzamora", "zucchini"),
];

fn load_index(db: &Db) -> usize {
    db.get(SEED_INDEX_KEY)
        .ok()
        .flatten()
        .and_then(|raw| String::from_utf8(raw).ok())
        .and_then(|text| text.parse().ok())
        .unwrap_or(0)
}

/// Writes `rounds` passes over the corpus. Each round writes all 26 pairs
/// with the current index suffix, in shuffled order so the workload is not
/// perfectly sorted.
pub fn run(db: &Db, rounds: usize) -> Result<String> {
    let start = Instant::now();
    let mut index = load_index(db);
    let first_index = index;

    let mut shuffled = PAIRS;
    shuffled.shuffle(&mut rand::thread_rng());

    let mut written = 0usize;
    for _ in 0..rounds {
        for (fruit, vegetable) in shuffled {
            let key = format!("{fruit}{index}");
            let value = format!("{vegetable}{index}");
            db.put(key.as_bytes(), value.as_bytes())?;
            written += 1;
        }
        index += 1;
    }

    db.put(SEED_INDEX_KEY, index.to_string().as_bytes())?;

    Ok(format!(
        "seeded {written} entries (26 x {rounds}, index {first_index}..{index}) in {:?}",
        start.elapsed()
    ))
}
