//! Command parsing and execution. Every verb goes through the engine's
//! public API (plus read-only file decoding for `inspect`/`dump`), so the
//! shell can never see state the engine could not.

use crate::{inspect, seed};
use engine::Db;
use std::collections::BTreeSet;

pub enum ExecResult {
    /// Text to print (possibly empty for a blank input line).
    Output(String),
    /// The user asked to quit.
    Exit,
}

const HELP: &str = "\
put <key> <value>      insert or update a key
get <key>              look up a key
delete <key>           delete a key
seed <n>               write n rounds of generated data
inspect [target]       summarize memtable | manifest | wal/<f> | sstable/<l>/<f>
dump [target]          print entries of a target (default: memtable)
clear                  delete every live key
help                   this list
exit                   close the database and quit";

/// Executes one input line. Errors become `ERR ...` output rather than
/// terminating the shell.
pub fn execute(db: &Db, line: &str) -> ExecResult {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return ExecResult::Output(String::new());
    };
    let args: Vec<&str> = parts.collect();

    let output = match verb.to_lowercase().as_str() {
        "put" => cmd_put(db, &args),
        "get" => cmd_get(db, &args),
        "delete" => cmd_delete(db, &args),
        "seed" => cmd_seed(db, &args),
        "inspect" => inspect::inspect(db, args.first().copied()),
        "dump" => inspect::dump(db, args.first().copied()),
        "clear" => cmd_clear(db),
        "help" => Ok(HELP.to_string()),
        "exit" | "quit" => return ExecResult::Exit,
        other => Ok(format!("ERR unknown command: {other}")),
    };

    ExecResult::Output(output.unwrap_or_else(|e| format!("ERR {e}")))
}

fn cmd_put(db: &Db, args: &[&str]) -> anyhow::Result<String> {
    let [key, rest @ ..] = args else {
        return Ok("usage: put <key> <value>".into());
    };
    if rest.is_empty() {
        return Ok("usage: put <key> <value>".into());
    }
    let value = rest.join(" ");
    db.put(key.as_bytes(), value.as_bytes())?;
    Ok("ok".into())
}

fn cmd_get(db: &Db, args: &[&str]) -> anyhow::Result<String> {
    let [key] = args else {
        return Ok("usage: get <key>".into());
    };
    Ok(match db.get(key.as_bytes())? {
        Some(value) => String::from_utf8_lossy(&value).into_owned(),
        None => "(nil)".into(),
    })
}

fn cmd_delete(db: &Db, args: &[&str]) -> anyhow::Result<String> {
    let [key] = args else {
        return Ok("usage: delete <key>".into());
    };
    db.delete(key.as_bytes())?;
    Ok("ok".into())
}

fn cmd_seed(db: &Db, args: &[&str]) -> anyhow::Result<String> {
    let [count] = args else {
        return Ok("usage: seed <n>".into());
    };
    let Ok(rounds) = count.parse::<usize>() else {
        return Ok("usage: seed <n>".into());
    };
    seed::run(db, rounds)
}

/// Deletes every live key: the memtable snapshot plus every table scan give
/// the full key universe, and each key still live is tombstoned through the
/// public API.
fn cmd_clear(db: &Db) -> anyhow::Result<String> {
    let mut keys: BTreeSet<Vec<u8>> = db
        .memtable_snapshot()
        .into_iter()
        .map(|entry| entry.key)
        .collect();

    for entry in inspect::all_table_entries(db)? {
        keys.insert(entry.key);
    }

    let mut deleted = 0usize;
    for key in keys {
        if db.get(&key)?.is_some() {
            db.delete(&key)?;
            deleted += 1;
        }
    }
    Ok(format!("cleared {deleted} keys"))
}
