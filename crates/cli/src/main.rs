//! # CLI — EmberKV Interactive Shell
//!
//! A REPL over the engine's public API. Reads commands from stdin, executes
//! them against an open database, and prints results to stdout — usable
//! interactively or scripted by piping commands in.
//!
//! ## Commands
//!
//! ```text
//! put <key> <value>      Insert or update a key
//! get <key>              Look up a key (prints value or "(nil)")
//! delete <key>           Delete a key (writes a tombstone)
//! seed <n>               Write n rounds of generated fruit/vegetable data
//! inspect [target]       Summarize memtable | manifest | wal/<f> | sstable/<l>/<f>
//! dump [target]          Print the entries of a target (default: memtable)
//! clear                  Delete every live key
//! help                   Show this list
//! exit                   Close the database and quit
//! ```
//!
//! ## Configuration
//!
//! Environment variables, all optional:
//!
//! ```text
//! EMBER_DB_PATH           database directory       (default: "data")
//! EMBER_FLUSH_THRESHOLD   memtable entries/flush   (default: 256)
//! EMBER_MAX_BATCH         group-commit batch cap   (default: 50)
//! EMBER_BATCH_TIMEOUT_MS  batch straggler wait     (default: 5)
//! EMBER_BLOOM_FPR         bloom false-positive     (default: 0.01)
//! EMBER_CACHE_BLOCKS      block cache capacity     (default: 1024)
//! EMBER_LOG               tracing filter           (default: "warn")
//! ```

mod commands;
mod inspect;
mod seed;

use anyhow::Result;
use commands::ExecResult;
use engine::{Db, Options};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn options_from_env() -> Options {
    let db_path = env_or("EMBER_DB_PATH", "data");
    let flush: usize = env_or("EMBER_FLUSH_THRESHOLD", "256").parse().unwrap_or(256);
    let batch: usize = env_or("EMBER_MAX_BATCH", "50").parse().unwrap_or(50);
    let timeout_ms: u64 = env_or("EMBER_BATCH_TIMEOUT_MS", "5").parse().unwrap_or(5);
    let fpr: f64 = env_or("EMBER_BLOOM_FPR", "0.01").parse().unwrap_or(0.01);
    let cache: usize = env_or("EMBER_CACHE_BLOCKS", "1024").parse().unwrap_or(1024);

    Options::new(db_path)
        .with_flush_threshold(flush)
        .with_max_batch_size(batch)
        .with_batch_timeout(Duration::from_millis(timeout_ms))
        .with_bloom_fpr(fpr)
        .with_block_cache_capacity(cache)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("EMBER_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let opts = options_from_env();
    let db_path = opts.db_path.clone();
    let db = Db::open(opts)?;

    println!(
        "EmberKV started (path={}, seq={}, wal={}.log)",
        db_path.display(),
        db.last_seq(),
        db.current_wal()
    );
    println!("commands: put <key> <value> | get <key> | delete <key> | seed <n>");
    println!("          inspect [target] | dump [target] | clear | help | exit");

    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush().ok();

    for line in stdin.lock().lines() {
        let line = line?;
        match commands::execute(&db, &line) {
            ExecResult::Output(text) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            ExecResult::Exit => break,
        }
        print!("> ");
        io::stdout().flush().ok();
    }

    db.close()?;
    println!("bye");
    Ok(())
}
