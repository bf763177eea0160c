use std::collections::HashMap;
use std::hash::Hash;

use crate::config::Config;
use crate::dbscan;
use crate::distance::distance;
use crate::fileinfo::FileInfo;
use crate::result::{DeduplicationResult, DuplicateSet};
use crate::selector::{duplicates_of, select_representatives};

/// spec.md §2 data flow: "VP-Tree build → DBSCAN → representative
/// selection → per-cluster result." Fingerprint assembly is not part
/// of this function — it needs I/O-bound collaborators the app crate
/// supplies — so this takes an already-assembled `FileInfo` map and
/// covers everything downstream of it.
pub fn run<Id>(files: &HashMap<Id, FileInfo>, cfg: &Config) -> DeduplicationResult<Id>
where
    Id: Clone + Eq + Hash + Ord + Send + Sync,
{
    let ids: Vec<Id> = files.keys().cloned().collect();
    if ids.is_empty() {
        return DeduplicationResult::default();
    }

    let dist = |a: &Id, b: &Id| distance(&files[a].media, &files[b].media, cfg).unwrap_or(1.0);
    let accept = |a: &Id, b: &Id| {
        let fa = &files[a];
        let fb = &files[b];
        1.0 - dist(a, b) >= cfg.adaptive_threshold(fa.is_video(), fb.is_video())
    };

    let clusters = dbscan::cluster(&ids, cfg.dbscan_epsilon(), &dist, &accept, cfg.concurrency);

    let mut unique_files = Vec::new();
    let mut duplicate_sets = Vec::new();

    for cluster in clusters {
        if cluster.len() < 2 {
            unique_files.extend(cluster);
            continue;
        }

        let resolve = |id: &Id| files[id].clone();
        let representatives = select_representatives(&cluster, &resolve, &dist, cfg);
        let duplicates = duplicates_of(&cluster, &representatives);
        let best_file = representatives
            .first()
            .cloned()
            .expect("select_representatives never returns empty for a non-empty cluster");

        duplicate_sets.push(DuplicateSet {
            best_file,
            representatives,
            duplicates,
        });
    }

    unique_files.sort();
    DeduplicationResult {
        unique_files,
        duplicate_sets,
    }
}
