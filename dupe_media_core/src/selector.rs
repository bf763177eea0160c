use std::cmp::Ordering;
use std::hash::Hash;

use crate::config::Config;
use crate::fileinfo::FileInfo;
use crate::scoring::score;

/// spec.md §4.7: pick representatives for a cluster of size >= 2.
/// `resolve` maps an id to its assembled `FileInfo`; `distance` is the
/// same distance function used to build the VP-tree.
pub fn select_representatives<Id, R, D>(
    cluster: &[Id],
    resolve: &R,
    distance: &D,
    cfg: &Config,
) -> Vec<Id>
where
    Id: Clone + Eq + Hash + Ord + Send + Sync,
    R: Fn(&Id) -> FileInfo,
    D: Fn(&Id, &Id) -> f64 + Sync,
{
    if cluster.is_empty() {
        return Vec::new();
    }

    let best = top_scored(cluster, resolve);
    let best_info = resolve(&best);

    if best_info.is_image() {
        return vec![best];
    }

    let best_quality = best_info.metadata.pixel_count();
    let best_lacks_date = best_info.metadata.image_date.is_none();

    let candidates: Vec<Id> = cluster
        .iter()
        .filter(|id| **id != best)
        .filter(|id| {
            let info = resolve(id);
            info.is_image()
                && info.metadata.pixel_count() >= best_quality
                && (best_lacks_date || info.metadata.image_date.is_some())
        })
        .cloned()
        .collect();

    let mut representatives = vec![best];
    if candidates.is_empty() {
        return representatives;
    }

    // spec.md §4.7 step 4: recursively cluster the candidates and take
    // one unique file per resulting sub-cluster.
    let eps = 1.0 - cfg.image_similarity_threshold;
    let accept = |a: &Id, b: &Id| 1.0 - distance(a, b) >= cfg.image_similarity_threshold;
    let sub_clusters = crate::dbscan::cluster(&candidates, eps, distance, &accept, 1);

    let mut picks: Vec<Id> = sub_clusters
        .into_iter()
        .map(|sub| top_scored(&sub, resolve))
        .collect();

    // keep output order stable relative to the original cluster.
    picks.sort_by_key(|id| candidates.iter().position(|c| c == id).unwrap_or(usize::MAX));
    representatives.extend(picks);
    representatives
}

fn top_scored<Id, R>(ids: &[Id], resolve: &R) -> Id
where
    Id: Clone,
    R: Fn(&Id) -> FileInfo,
{
    ids.iter()
        .map(|id| (id.clone(), score(&resolve(id))))
        .fold(None, |acc: Option<(Id, f64)>, (id, s)| match acc {
            Some((best_id, best_s)) if best_s.partial_cmp(&s) != Some(Ordering::Less) => {
                Some((best_id, best_s))
            }
            _ => Some((id, s)),
        })
        .expect("ids is non-empty")
        .0
}

/// spec.md §4.7: "Duplicates are simply `cluster \ representatives`."
#[must_use]
pub fn duplicates_of<Id: Clone + Eq + Hash>(cluster: &[Id], representatives: &[Id]) -> Vec<Id> {
    let reps: std::collections::HashSet<&Id> = representatives.iter().collect();
    cluster
        .iter()
        .filter(|id| !reps.contains(id))
        .cloned()
        .collect()
}
