use crate::confirm::{EdgeSet, SimilarityConfirmer};
use crate::lsh::{sign_documents, HashFamily, MinHashLSH};
use corpus_dedup::dto::{ClusterAssignment, Document, FuzzyDedupConfig, KeepPolicy};
use rand::prelude::*;
use std::time::Instant;
use tracing::{debug, enabled, info, Level};

///
/// Connected components of the near-duplicate graph.
///
/// Documents are graph nodes addressed by index; only components with at
/// least two members are recorded.
///
pub struct DeduplicationTable {
    /// Members of each cluster, ascending by document index
    clusters: Vec<Vec<usize>>,
    num_documents: usize,
}

impl DeduplicationTable {
    ///
    /// Partitions the edge graph into clusters.
    ///
    /// ## Arguments
    ///
    /// * `num_documents` - Number of nodes; every edge endpoint must be below it.
    /// * `edges` - Confirmed near-duplicate pairs.
    ///
    pub fn new(num_documents: usize, edges: &EdgeSet) -> Self {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); num_documents];
        for &(a, b) in edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        let mut visited = vec![false; num_documents];
        let mut clusters = Vec::new();
        let mut stack = Vec::new();
        for start in 0..num_documents {
            if visited[start] || adjacency[start].is_empty() {
                continue;
            }
            visited[start] = true;
            stack.push(start);
            let mut cluster = Vec::new();
            while let Some(node) = stack.pop() {
                cluster.push(node);
                for &next in &adjacency[node] {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }
            cluster.sort_unstable();
            clusters.push(cluster);
        }
        DeduplicationTable {
            clusters,
            num_documents,
        }
    }

    /// Document indices of each cluster.
    pub fn grouped_ids(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    ///
    /// Marks which documents survive: one representative per cluster plus
    /// every document outside all clusters.
    ///
    pub fn keep_set<R: Rng + ?Sized>(&self, policy: KeepPolicy, rng: &mut R) -> Vec<bool> {
        let mut keep = vec![true; self.num_documents];
        for cluster in &self.clusters {
            let representative = match policy {
                KeepPolicy::First => cluster[0],
                KeepPolicy::Random => *cluster.choose(rng).unwrap_or(&cluster[0]),
            };
            for &member in cluster {
                keep[member] = member == representative;
            }
        }
        keep
    }
}

pub struct DedupOutcome {
    pub keep: Vec<bool>,
    pub clusters: Vec<Vec<usize>>,
    pub candidates: usize,
    pub edges: usize,
}

impl DedupOutcome {
    pub fn removed(&self) -> usize {
        self.keep.iter().filter(|&&k| !k).count()
    }

    pub fn assignments(&self, documents: &[Document]) -> Vec<ClusterAssignment> {
        self.clusters
            .iter()
            .enumerate()
            .flat_map(|(cluster, members)| {
                members.iter().map(move |&doc| ClusterAssignment {
                    id: documents[doc].id.clone(),
                    cluster,
                    kept: self.keep[doc],
                })
            })
            .collect()
    }
}

/// Runs signing, banding, confirmation and clustering over a closed set of
/// documents. The configuration must already be validated.
pub fn deduplicate(documents: &[Document], config: &FuzzyDedupConfig) -> DedupOutcome {
    let start = Instant::now();
    let family = HashFamily::new(config.num_hashes, config.seed);
    let signatures = sign_documents(documents, config.ngram_length, &family);
    let unshingled = signatures.iter().filter(|minhash| minhash.is_empty()).count();
    info!(
        "Hashed {} documents ({} too short to shingle) in {:.4} secs",
        documents.len(),
        unshingled,
        start.elapsed().as_secs_f64()
    );

    let start = Instant::now();
    let lsh = MinHashLSH::new(&signatures, config.num_bands);
    let candidates = lsh.candidate_pairs();
    let confirmer = SimilarityConfirmer::new(documents, config.ngram_length, config.threshold);
    let edges = confirmer.confirm_all(&candidates);
    info!(
        "Confirmed {} of {} candidate pairs in {:.4} secs",
        edges.len(),
        candidates.len(),
        start.elapsed().as_secs_f64()
    );
    if enabled!(Level::DEBUG) {
        for &(a, b) in &edges {
            debug!(
                a = %documents[a].id,
                b = %documents[b].id,
                exact = confirmer.similarity(a, b),
                estimated = signatures[a].estimated_similarity(&signatures[b]),
                "Near-duplicate pair"
            );
        }
    }

    let table = DeduplicationTable::new(documents.len(), &edges);
    info!("Resolved {} duplicate clusters", table.grouped_ids().len());
    let mut rng = StdRng::seed_from_u64(config.seed);
    let keep = table.keep_set(config.keep_policy, &mut rng);
    DedupOutcome {
        keep,
        clusters: table.clusters,
        candidates: candidates.len(),
        edges: edges.len(),
    }
}
