use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use rayon::prelude::*;

use crate::disjoint_set::DisjointSet;
use crate::vptree::VpTree;

/// spec.md §4.6: every neighborhood includes the point itself, so a
/// point with zero *other* accepted neighbors still has `|neighbors| ==
/// 1 < minPts` and is emitted as a singleton cluster.
pub const MIN_PTS: usize = 2;

/// spec.md §4.6: run DBSCAN over `ids`, splitting the work across
/// `concurrency` worker-local passes against a single shared VP-tree,
/// then consolidating by connected components. `accept_pair` must
/// encode `adaptiveThreshold` from §4.4; `eps` is `1 - minThreshold`
/// and only prunes the VP-tree query, it does not replace the
/// per-pair check.
pub fn cluster<Id, D, P>(
    ids: &[Id],
    eps: f64,
    distance: &D,
    accept_pair: &P,
    concurrency: usize,
) -> Vec<Vec<Id>>
where
    Id: Clone + Eq + Hash + Ord + Send + Sync,
    D: Fn(&Id, &Id) -> f64 + Sync,
    P: Fn(&Id, &Id) -> bool + Sync,
{
    if ids.is_empty() {
        return Vec::new();
    }

    let tree = VpTree::build(ids.to_vec(), distance);
    let chunk_size = (ids.len() / concurrency.max(1)).max(1);

    let raw_clusters: Vec<Vec<Id>> = ids
        .par_chunks(chunk_size)
        .flat_map_iter(|chunk| worker_dbscan(chunk, &tree, distance, accept_pair, eps))
        .collect();

    merge_connected_components(raw_clusters)
}

fn accepted_neighbors<Id, D, P>(
    p: &Id,
    tree: &VpTree<Id>,
    distance: &D,
    accept_pair: &P,
    eps: f64,
) -> Vec<Id>
where
    Id: Clone,
    D: Fn(&Id, &Id) -> f64,
    P: Fn(&Id, &Id) -> bool,
{
    tree.range_query(p, eps, distance)
        .into_iter()
        .filter(|q| accept_pair(p, q))
        .collect()
}

/// Worker-local DBSCAN expansion (spec.md §4.6 steps 1-3), restricted
/// to `chunk` as the set of seed candidates but querying the full
/// shared tree for neighbors.
fn worker_dbscan<Id, D, P>(
    chunk: &[Id],
    tree: &VpTree<Id>,
    distance: &D,
    accept_pair: &P,
    eps: f64,
) -> Vec<Vec<Id>>
where
    Id: Clone + Eq + Hash,
    D: Fn(&Id, &Id) -> f64,
    P: Fn(&Id, &Id) -> bool,
{
    let mut visited: HashSet<Id> = HashSet::new();
    let mut clusters = Vec::new();

    for p in chunk {
        if visited.contains(p) {
            continue;
        }
        visited.insert(p.clone());

        let neighbors = accepted_neighbors(p, tree, distance, accept_pair, eps);
        if neighbors.len() < MIN_PTS {
            clusters.push(vec![p.clone()]);
            continue;
        }

        let mut in_cluster: HashSet<Id> = HashSet::new();
        in_cluster.insert(p.clone());
        let mut cluster = vec![p.clone()];
        let mut seeds: VecDeque<Id> = neighbors.into_iter().collect();

        while let Some(q) = seeds.pop_front() {
            if in_cluster.insert(q.clone()) {
                cluster.push(q.clone());
            }

            if visited.insert(q.clone()) {
                let q_neighbors = accepted_neighbors(&q, tree, distance, accept_pair, eps);
                if q_neighbors.len() >= MIN_PTS {
                    for n in q_neighbors {
                        if !in_cluster.contains(&n) {
                            seeds.push_back(n);
                        }
                    }
                }
            }
        }

        clusters.push(cluster);
    }

    clusters
}

/// spec.md §4.6: "the union of cluster-memberships is then consolidated
/// by connected components." Multi-member raw clusters become edges;
/// any id that never appears in a multi-member cluster surfaces as its
/// own singleton.
fn merge_connected_components<Id>(raw: Vec<Vec<Id>>) -> Vec<Vec<Id>>
where
    Id: Clone + Eq + Hash + Ord,
{
    let mut ds: DisjointSet<Id> = DisjointSet::default();
    let mut grouped: HashSet<Id> = HashSet::new();
    let mut seen: HashSet<Id> = HashSet::new();

    for raw_cluster in &raw {
        for id in raw_cluster {
            seen.insert(id.clone());
        }
        if raw_cluster.len() >= 2 {
            let first = raw_cluster[0].clone();
            for other in &raw_cluster[1..] {
                ds.insert(first.clone(), other.clone());
            }
            grouped.extend(raw_cluster.iter().cloned());
        }
    }

    let mut result: Vec<Vec<Id>> = ds
        .all_sets()
        .map(|members| members.cloned().collect())
        .collect();

    for id in seen {
        if !grouped.contains(&id) {
            result.push(vec![id]);
        }
    }

    result
}
