/// Classifier input and final label output
/// Kraken2 per-read lines look like "C<TAB>read_id<TAB>taxid<TAB>...". Every read is kept
/// for output ordering; only classified reads with a non-zero taxid become labels.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ahash::AHashSet;
use anyhow::{Context, Result};
use tracing::info;

use crate::create_overlap_graph::NodeId;
use crate::id_map::IdMap;
use crate::Labels;

/// Initial labels plus the order reads appeared in the classifier output
#[derive(Debug, Default)]
pub struct ClassifierLabels {
    pub labels: Labels,
    pub order: Vec<NodeId>,
}

pub fn load_labels_and_order<R: BufRead>(reader: R, reads: &mut IdMap, taxa: &mut IdMap) -> io::Result<ClassifierLabels> {
    let mut out = ClassifierLabels::default();
    let mut seen: AHashSet<NodeId> = AHashSet::new();

    for line in reader.lines() {
        let line = line?;
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if fields.len() < 3 { continue; }
        let (status, read_name, taxid) = (fields[0], fields[1], fields[2]);

        // register unclassified reads too so they show up in the output
        let rid = reads.get_or_insert(read_name);
        if seen.insert(rid) {
            out.order.push(rid);
        }

        if status == "C" && taxid != "0" {
            out.labels.insert(rid, taxa.get_or_insert(taxid));
        }
    }
    Ok(out)
}

pub fn load_kraken_file<P: AsRef<Path>>(path: P, reads: &mut IdMap, taxa: &mut IdMap) -> Result<ClassifierLabels> {
    let path = path.as_ref();
    info!("Loading Kraken2 labels from {}", path.display());
    let reader = BufReader::new(File::open(path).with_context(|| format!("opening classifier output {}", path.display()))?);
    let loaded = load_labels_and_order(reader, reads, taxa).with_context(|| format!("reading classifier output {}", path.display()))?;
    info!("Initial labeled reads: {} | All reads in Kraken: {}", loaded.labels.len(), loaded.order.len());
    Ok(loaded)
}

/// Write one line per read in classifier order, "U<TAB>read<TAB>0" for reads left unlabelled
pub fn write_final_labels<W: Write>(writer: &mut W, order: &[NodeId], labels: &Labels, reads: &IdMap, taxa: &IdMap) -> io::Result<()> {
    for &rid in order {
        let read_name = reads.name(rid).unwrap_or_default();
        match labels.get(&rid).and_then(|&lab| taxa.name(lab)) {
            Some(taxid) => writeln!(writer, "C\t{}\t{}", read_name, taxid)?,
            None => writeln!(writer, "U\t{}\t0", read_name)?,
        }
    }
    Ok(())
}

pub fn write_final_labels_file<P: AsRef<Path>>(path: P, order: &[NodeId], labels: &Labels, reads: &IdMap, taxa: &IdMap) -> Result<()> {
    let path = path.as_ref();
    info!("Writing: {}", path.display());
    let mut writer = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    write_final_labels(&mut writer, order, labels, reads, taxa)
        .and_then(|_| writer.flush())
        .with_context(|| format!("writing {}", path.display()))
}
