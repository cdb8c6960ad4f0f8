//! `inspect` and `dump`: read-only views of the database internals.
//!
//! Targets:
//!
//! ```text
//! (none)                overview / memtable dump
//! memtable              the in-memory buffer
//! manifest              the current Version
//! wal/<file>.log        one WAL file, decoded frame by frame
//! sstable/<l>/<file>.sst one table: footer geometry or full entry dump
//! ```
//!
//! WAL files are decoded directly with [`codec::read_entry`] rather than
//! through [`wal::Wal::open`], which would repair a torn tail — an
//! inspector must never modify what it looks at.

use anyhow::{anyhow, bail, Result};
use codec::{read_entry, CodecError, Entry};
use engine::{paths, Db};
use sstable::Table;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

enum Target {
    Memtable,
    Manifest,
    Wal(PathBuf),
    Sstable { path: PathBuf, file_no: u64 },
}

fn parse_target(db: &Db, raw: Option<&str>, default: Target) -> Result<Target> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw {
        "memtable" => Ok(Target::Memtable),
        "manifest" => Ok(Target::Manifest),
        _ => {
            let root = &db.options().db_path;
            let parts: Vec<&str> = raw.split('/').collect();
            match parts.as_slice() {
                ["wal", name] => Ok(Target::Wal(paths::wal_dir(root).join(name))),
                ["sstable", level, name] => {
                    let level: usize = level
                        .parse()
                        .map_err(|_| anyhow!("bad level in target: {raw}"))?;
                    let path = paths::sstable_dir(root, level).join(name);
                    let file_no = name
                        .strip_suffix(".sst")
                        .and_then(|stem| stem.parse().ok())
                        .ok_or_else(|| anyhow!("bad table name in target: {raw}"))?;
                    Ok(Target::Sstable { path, file_no })
                }
                _ => bail!("unknown target: {raw} (try memtable, manifest, wal/<f>, sstable/<l>/<f>)"),
            }
        }
    }
}

pub fn inspect(db: &Db, raw_target: Option<&str>) -> Result<String> {
    let target = match raw_target {
        None => return Ok(overview(db)),
        some => parse_target(db, some, Target::Memtable)?,
    };

    match target {
        Target::Memtable => {
            let entries = db.memtable_snapshot();
            Ok(format!(
                "memtable: {} entries{}",
                entries.len(),
                seq_range(&entries)
            ))
        }
        Target::Manifest => {
            let version = db.version();
            let mut out = String::new();
            writeln!(out, "current_wal: {}", version.current_wal)?;
            writeln!(out, "next_wal_no: {}", version.next_wal_no)?;
            writeln!(out, "next_sst_no: {}", version.next_sst_no)?;
            for (level, files) in version.levels.iter().enumerate() {
                let names: Vec<String> =
                    files.iter().map(|m| format!("{}.sst", m.file_no)).collect();
                writeln!(out, "L{level}: [{}]", names.join(", "))?;
            }
            Ok(out.trim_end().to_string())
        }
        Target::Wal(path) => {
            let (entries, torn) = read_wal_file(&path)?;
            Ok(format!(
                "{}: {} entries{}{}",
                path.display(),
                entries.len(),
                seq_range(&entries),
                if torn { ", torn tail" } else { "" }
            ))
        }
        Target::Sstable { path, file_no } => {
            let table = Table::open(&path, file_no, None)?;
            let footer = table.footer();
            Ok(format!(
                "{}: {} entries, {} blocks, filter_offset={}, index_offset={}",
                path.display(),
                table.len(),
                table.block_count(),
                footer.filter_offset,
                footer.index_offset
            ))
        }
    }
}

pub fn dump(db: &Db, raw_target: Option<&str>) -> Result<String> {
    match parse_target(db, raw_target, Target::Memtable)? {
        Target::Memtable => Ok(render_entries(&db.memtable_snapshot())),
        Target::Manifest => inspect(db, Some("manifest")),
        Target::Wal(path) => {
            let (entries, torn) = read_wal_file(&path)?;
            let mut out = render_entries(&entries);
            if torn {
                out.push_str("\n(torn tail)");
            }
            Ok(out)
        }
        Target::Sstable { path, file_no } => {
            let table = Table::open(&path, file_no, None)?;
            let entries: Vec<Entry> = table.iter()?.collect::<Result<_, _>>()?;
            Ok(render_entries(&entries))
        }
    }
}

/// Every entry of every table the current version references, for `clear`.
pub fn all_table_entries(db: &Db) -> Result<Vec<Entry>> {
    let version = db.version();
    let root = &db.options().db_path;
    let mut entries = Vec::new();
    for (level, files) in version.levels.iter().enumerate() {
        for meta in files {
            let path = paths::sstable_path(root, level, meta.file_no);
            let table = Table::open(&path, meta.file_no, None)?;
            for entry in table.iter()? {
                entries.push(entry?);
            }
        }
    }
    Ok(entries)
}

fn overview(db: &Db) -> String {
    let version = db.version();
    let tables: usize = version.levels.iter().map(|files| files.len()).sum();
    format!(
        "memtable: {} entries | last_seq: {} | wal: {}.log | tables: {}",
        db.memtable_len(),
        db.last_seq(),
        version.current_wal,
        tables
    )
}

fn seq_range(entries: &[Entry]) -> String {
    let min = entries.iter().map(|e| e.seq).min();
    let max = entries.iter().map(|e| e.seq).max();
    match (min, max) {
        (Some(min), Some(max)) => format!(", seq {min}..={max}"),
        _ => String::new(),
    }
}

fn render_entries(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return "(empty)".into();
    }
    let mut out = String::new();
    for entry in entries {
        let key = String::from_utf8_lossy(&entry.key);
        if entry.is_tombstone() {
            writeln!(out, "{:>8}  {} -> (tombstone)", entry.seq, key).ok();
        } else {
            let value = String::from_utf8_lossy(&entry.value);
            writeln!(out, "{:>8}  {} -> {}", entry.seq, key, value).ok();
        }
    }
    out.trim_end().to_string()
}

/// Decodes a WAL file without touching it: complete entries plus a flag for
/// a torn trailing frame.
fn read_wal_file(path: &std::path::Path) -> Result<(Vec<Entry>, bool)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut entries = Vec::new();
    loop {
        match read_entry(&mut reader) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => return Ok((entries, false)),
            Err(CodecError::IncompleteEntry) => return Ok((entries, true)),
            Err(e) => return Err(e.into()),
        }
    }
}
