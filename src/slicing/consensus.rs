//! Consensus clustering of onset candidates
//!
//! Merges the detections of every onset method into agreed-upon markers.
//! Timestamps are clustered greedily left to right: a candidate joins the
//! current cluster while it stays within the cluster threshold of the
//! cluster's last element. Clusters reaching the minimum size emit one
//! representative timestamp.

/// Greedily cluster sorted timestamps and emit cluster representatives
///
/// `onsets` must be sorted ascending. A cluster is kept when it holds at
/// least `min_size` members; its representative is the outlier-trimmed
/// mean (see [`representative`]).
pub fn cluster_onsets(onsets: &[f64], threshold_s: f64, min_size: usize) -> Vec<f64> {
    let mut merged = Vec::new();
    if onsets.is_empty() {
        return merged;
    }

    let mut cluster: Vec<f64> = vec![onsets[0]];
    for &t in &onsets[1..] {
        if t - *cluster.last().expect("cluster is never empty") <= threshold_s {
            cluster.push(t);
        } else {
            if cluster.len() >= min_size {
                merged.push(representative(&cluster));
            }
            cluster.clear();
            cluster.push(t);
        }
    }
    if cluster.len() >= min_size {
        merged.push(representative(&cluster));
    }

    merged
}

/// Representative timestamp of one cluster
///
/// Small clusters (< 4 members) use the plain mean. Larger clusters are
/// first trimmed with the Tukey fence; if every member lands outside the
/// fence (IQR of 0 with spread values), the untrimmed mean is used.
pub fn representative(cluster: &[f64]) -> f64 {
    if cluster.is_empty() {
        return 0.0;
    }
    if cluster.len() < 4 {
        return cluster.iter().sum::<f64>() / cluster.len() as f64;
    }

    let cleaned = remove_outliers(cluster);
    let kept = if cleaned.is_empty() { cluster } else { &cleaned };
    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Drop values outside the Tukey fence `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`
fn remove_outliers(data: &[f64]) -> Vec<f64> {
    if data.len() < 4 {
        return data.to_vec();
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    data.iter()
        .copied()
        .filter(|&v| v >= lower && v <= upper)
        .collect()
}

/// Percentile of a sorted slice by linear interpolation between ranks
pub fn percentile(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lower = (rank.floor() as usize).min(sorted.len() - 1);
    let upper = (rank.ceil() as usize).min(sorted.len() - 1);

    if lower == upper {
        return sorted[lower];
    }

    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}
