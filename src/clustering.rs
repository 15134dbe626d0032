// clustering.rs
//
// Cluster selection for the fallback diarization pipeline: seeded k-means
// over per-segment MFCC descriptors, silhouette-scored sweep over candidate
// speaker counts, and gap filling so every segment ends up with a default
// acoustic label.

use log::{debug, info};
use ndarray::{Array2, ArrayView1};

use crate::config::{
    DEFAULT_SPEAKER, KMEANS_MAX_ITERS, KMEANS_RESTARTS, KMEANS_SEED, SILHOUETTE_MARGIN,
};
use crate::features::{self, SegmentFeatures};
use crate::types::Segment;

/// Outcome of the acoustic labeling stage.
///
/// `Clustered` carries one default label per input segment (gap-filled, no
/// holes). `Unavailable` means the whole acoustic path was abandoned and the
/// reconciler must rely on textual names and continuity alone.
#[derive(Debug, Clone, PartialEq)]
pub enum AcousticLabels {
    Clustered(Vec<String>),
    Unavailable,
}

impl AcousticLabels {
    /// Default label for segment `idx`, if the acoustic path produced one.
    pub fn label_for(&self, idx: usize) -> Option<&str> {
        match self {
            AcousticLabels::Clustered(labels) => labels.get(idx).map(String::as_str),
            AcousticLabels::Unavailable => None,
        }
    }
}

fn sq_dist(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ style centroid seeding, deterministic for a given rng state
fn init_centroids(data: &Array2<f32>, k: usize, rng: &mut fastrand::Rng) -> Array2<f32> {
    let n = data.nrows();
    let dim = data.ncols();
    let mut centroids = Array2::<f32>::zeros((k, dim));

    let first = rng.usize(..n);
    centroids.row_mut(0).assign(&data.row(first));

    // Squared distance from each point to its nearest chosen centroid
    let mut d2: Vec<f32> = (0..n)
        .map(|i| sq_dist(data.row(i), centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f32 = d2.iter().sum();
        let chosen = if total <= 0.0 {
            rng.usize(..n)
        } else {
            let mut target = rng.f32() * total;
            let mut pick = n - 1;
            for (i, &w) in d2.iter().enumerate() {
                if target <= w {
                    pick = i;
                    break;
                }
                target -= w;
            }
            pick
        };
        centroids.row_mut(c).assign(&data.row(chosen));

        for i in 0..n {
            let d = sq_dist(data.row(i), centroids.row(c));
            if d < d2[i] {
                d2[i] = d;
            }
        }
    }

    centroids
}

/// One k-means fit. Returns per-row cluster ids and the total inertia
/// (sum of squared distances to assigned centroids).
fn kmeans_fit(data: &Array2<f32>, k: usize, rng: &mut fastrand::Rng) -> (Vec<usize>, f32) {
    let n = data.nrows();
    let dim = data.ncols();
    let mut centroids = init_centroids(data, k, rng);
    let mut labels = vec![0usize; n];

    for _ in 0..KMEANS_MAX_ITERS {
        let mut changed = false;

        for i in 0..n {
            let point = data.row(i);
            let mut min_d = f32::INFINITY;
            let mut min_j = 0;
            for j in 0..k {
                let d = sq_dist(point, centroids.row(j));
                if d < min_d {
                    min_d = d;
                    min_j = j;
                }
            }
            if labels[i] != min_j {
                labels[i] = min_j;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        let mut sums = Array2::<f32>::zeros((k, dim));
        let mut counts = vec![0usize; k];
        for i in 0..n {
            let j = labels[i];
            counts[j] += 1;
            let point = data.row(i);
            let mut row = sums.row_mut(j);
            for (s, &v) in row.iter_mut().zip(point.iter()) {
                *s += v;
            }
        }

        for j in 0..k {
            if counts[j] == 0 {
                // Empty cluster: reseed with the point farthest from its centroid
                let far = (0..n)
                    .max_by(|&a, &b| {
                        let da = sq_dist(data.row(a), centroids.row(labels[a]));
                        let db = sq_dist(data.row(b), centroids.row(labels[b]));
                        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .unwrap_or(0);
                centroids.row_mut(j).assign(&data.row(far));
            } else {
                let inv = 1.0 / counts[j] as f32;
                let mut row = centroids.row_mut(j);
                for (c, &s) in row.iter_mut().zip(sums.row(j).iter()) {
                    *c = s * inv;
                }
            }
        }
    }

    let inertia: f32 = (0..n).map(|i| sq_dist(data.row(i), centroids.row(labels[i]))).sum();

    (labels, inertia)
}

/// Best of several seeded restarts (lowest inertia), deterministic per `k`.
fn kmeans(data: &Array2<f32>, k: usize) -> Vec<usize> {
    let mut best_labels = Vec::new();
    let mut best_inertia = f32::INFINITY;

    for restart in 0..KMEANS_RESTARTS {
        let seed = KMEANS_SEED
            .wrapping_add((k as u64) << 32)
            .wrapping_add(restart as u64);
        let mut rng = fastrand::Rng::with_seed(seed);
        let (labels, inertia) = kmeans_fit(data, k, &mut rng);
        if inertia < best_inertia {
            best_inertia = inertia;
            best_labels = labels;
        }
    }

    best_labels
}

/// Mean silhouette coefficient over all rows (Euclidean distance)
fn silhouette_score(data: &Array2<f32>, labels: &[usize]) -> f32 {
    let n = data.nrows();
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for (i, &l) in labels.iter().enumerate() {
        if l >= clusters.len() {
            clusters.resize(l + 1, Vec::new());
        }
        clusters[l].push(i);
    }

    let dist = |a: usize, b: usize| -> f32 { sq_dist(data.row(a), data.row(b)).sqrt() };

    let mut total = 0.0f32;
    for i in 0..n {
        let own = &clusters[labels[i]];
        if own.len() <= 1 {
            // Singleton clusters contribute 0 by convention
            continue;
        }

        let a = own
            .iter()
            .filter(|&&j| j != i)
            .map(|&j| dist(i, j))
            .sum::<f32>()
            / (own.len() - 1) as f32;

        let b = clusters
            .iter()
            .enumerate()
            .filter(|(c, members)| *c != labels[i] && !members.is_empty())
            .map(|(_, members)| {
                members.iter().map(|&j| dist(i, j)).sum::<f32>() / members.len() as f32
            })
            .fold(f32::INFINITY, f32::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / n as f32
}

fn populated_clusters(labels: &[usize]) -> usize {
    let mut seen = Vec::new();
    for &l in labels {
        if !seen.contains(&l) {
            seen.push(l);
        }
    }
    seen.len()
}

/// Sweep candidate cluster counts and pick per-row cluster ids.
///
/// The sweep runs k = 2..=max_k in order, tracking a running best score; a
/// candidate is accepted only when its silhouette beats the running best by
/// more than the fixed margin. This is deliberately not an argmax: small
/// improvements never displace an earlier, smaller k. If nothing is
/// accepted, a forced 2-cluster fit is used; with fewer than 2 rows the
/// selector reports None.
fn select_clusters(data: &Array2<f32>, max_speakers: usize) -> Option<Vec<usize>> {
    let n = data.nrows();
    if n < 2 {
        return None;
    }

    let max_k = max_speakers.min(n);
    let mut best_labels: Option<Vec<usize>> = None;
    let mut best_score = -1.0f32;
    let mut best_k = 0;

    for k in 2..=max_k {
        let labels = kmeans(data, k);
        if populated_clusters(&labels) < 2 {
            continue;
        }
        let score = silhouette_score(data, &labels);
        debug!("k={} silhouette={:.4}", k, score);
        if score > best_score + SILHOUETTE_MARGIN {
            best_score = score;
            best_labels = Some(labels);
            best_k = k;
        }
    }

    if let Some(labels) = best_labels {
        info!("Selected {} clusters (silhouette {:.4})", best_k, best_score);
        return Some(labels);
    }

    // No decisive winner: force two clusters, skipping the quality gate
    info!("No cluster count accepted; forcing k=2");
    Some(kmeans(data, 2))
}

/// Map raw cluster ids to "Speaker {n}" by order of first temporal appearance
fn assign_default_labels(
    segment_count: usize,
    features: &SegmentFeatures,
    cluster_ids: &[usize],
) -> Vec<Option<String>> {
    let mut order: Vec<usize> = Vec::new();
    for &id in cluster_ids {
        if !order.contains(&id) {
            order.push(id);
        }
    }

    let mut defaults = vec![None; segment_count];
    for (&seg_idx, &id) in features.indices.iter().zip(cluster_ids.iter()) {
        let rank = order.iter().position(|&o| o == id).unwrap_or(0);
        defaults[seg_idx] = Some(format!("Speaker {}", rank + 1));
    }

    defaults
}

/// Fill unassigned positions: forward pass, backward pass, then a residual
/// "Speaker 1" for anything still unassigned.
pub fn fill_gaps(mut defaults: Vec<Option<String>>) -> Vec<String> {
    let mut last_seen: Option<String> = None;
    for slot in defaults.iter_mut() {
        match slot {
            Some(label) => last_seen = Some(label.clone()),
            None => *slot = last_seen.clone(),
        }
    }

    last_seen = None;
    for slot in defaults.iter_mut().rev() {
        match slot {
            Some(label) => last_seen = Some(label.clone()),
            None => *slot = last_seen.clone(),
        }
    }

    defaults
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| DEFAULT_SPEAKER.to_string()))
        .collect()
}

/// Run the full acoustic labeling stage over the decoded recording.
///
/// Returns `Unavailable` when fewer than 2 segments are eligible for
/// featurization or when no clustering is possible; callers never see an
/// error from this path.
pub fn cluster_segments_by_voice(
    signal: &[f32],
    sample_rate: u32,
    segments: &[Segment],
    max_speakers: usize,
) -> AcousticLabels {
    let features = features::extract_segment_features(signal, sample_rate, segments);
    if features.indices.len() < 2 {
        info!(
            "Only {} eligible segment(s); acoustic clustering unavailable",
            features.indices.len()
        );
        return AcousticLabels::Unavailable;
    }

    let cluster_ids = match select_clusters(&features.matrix, max_speakers) {
        Some(ids) => ids,
        None => return AcousticLabels::Unavailable,
    };

    let defaults = assign_default_labels(segments.len(), &features, &cluster_ids);
    AcousticLabels::Clustered(fill_gaps(defaults))
}
