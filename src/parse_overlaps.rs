/// Overlap input parsing
/// Reads PAF alignments or plain "read1 read2 overlap" edge lists into overlap records.
/// Lines that do not parse are skipped without being counted anywhere.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::create_overlap_graph::{GraphBuilder, OverlapRecord};
use crate::id_map::IdMap;

/// Supported overlap file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapFormat {
    Paf,
    EdgeList,
}

/// Negative overlaps reach the builder as 0 so they are counted below the threshold
fn clamp_overlap(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// Parse one PAF line.
/// Overlap is the number of matching bases (column 10), falling back to the query span
/// only when column 10 is not an integer.
pub fn parse_paf_line(line: &str, reads: &mut IdMap) -> Option<OverlapRecord> {
    if line.starts_with('#') || line.trim().is_empty() { return None; }

    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
    if fields.len() < 10 { return None; }

    let query_length: u32 = fields[1].parse().ok()?;
    let target_length: u32 = fields[6].parse().ok()?;

    let overlap = match fields[9].parse::<i64>() {
        Ok(n) => clamp_overlap(n),
        Err(_) => {
            let query_start: i64 = fields[2].parse().ok()?;
            let query_end: i64 = fields[3].parse().ok()?;
            clamp_overlap(query_end - query_start)
        }
    };

    let source = reads.get_or_insert(fields[0]);
    let target = reads.get_or_insert(fields[5]);
    Some(OverlapRecord::new(source, target, overlap).with_lengths(query_length, target_length))
}

/// Parse one edge-list line: exactly three whitespace separated fields
pub fn parse_edge_line(line: &str, reads: &mut IdMap) -> Option<OverlapRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 3 { return None; }

    let overlap = clamp_overlap(parts[2].parse::<i64>().ok()?);
    let source = reads.get_or_insert(parts[0]);
    let target = reads.get_or_insert(parts[1]);
    Some(OverlapRecord::new(source, target, overlap))
}

/// Stream every parsable record of a reader into the builder
pub fn load_overlaps<R: BufRead>(reader: R, format: OverlapFormat, reads: &mut IdMap, builder: &mut GraphBuilder) -> std::io::Result<()> {
    let parse: fn(&str, &mut IdMap) -> Option<OverlapRecord> = match format {
        OverlapFormat::Paf => parse_paf_line,
        OverlapFormat::EdgeList => parse_edge_line,
    };

    for line in reader.lines() {
        let line = line?;
        if let Some(record) = parse(&line, reads) {
            builder.add_record(record);
        }
    }
    Ok(())
}

/// Open an overlap file and feed it into the builder
pub fn load_overlap_file<P: AsRef<Path>>(path: P, format: OverlapFormat, reads: &mut IdMap, builder: &mut GraphBuilder) -> Result<()> {
    let path = path.as_ref();
    match format {
        OverlapFormat::Paf => info!("Parsing PAF: {}", path.display()),
        OverlapFormat::EdgeList => info!("Parsing edge list: {}", path.display()),
    }
    let reader = BufReader::new(File::open(path).with_context(|| format!("opening overlap file {}", path.display()))?);
    load_overlaps(reader, format, reads, builder).with_context(|| format!("reading overlap file {}", path.display()))
}
