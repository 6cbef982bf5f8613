//! Density-based clustering (DBSCAN)
//!
//! Neighbourhoods are computed in parallel with rayon; cluster expansion is
//! sequential and visits points in input order, so labels are deterministic.
//!
//! A point is a core point when at least `min_samples` points (itself
//! included) lie within `eps`. Border points join the first cluster that
//! reaches them. Everything else is noise.

use albumkit_core::vector::{cosine, l2_distance};
use albumkit_core::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cluster label of one point; `None` is noise
pub type Label = Option<usize>;

/// Distance used to build neighbourhoods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `1 - cos(a, b)`, in [0, 2]
    Cosine,
    #[default]
    Euclidean,
}

impl Metric {
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => 1.0 - cosine(a, b),
            Metric::Euclidean => l2_distance(a, b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    eps: f32,
    min_samples: usize,
    metric: Metric,
}

impl Dbscan {
    #[must_use]
    pub fn new(eps: f32, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples,
            metric: Metric::Euclidean,
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Label every point. Cluster labels are dense, starting at 0, in order
    /// of their first core point. Points of different dimension are an error.
    pub fn fit_predict<V>(&self, points: &[V]) -> Result<Vec<Label>>
    where
        V: AsRef<[f32]> + Sync,
    {
        check_dimensions(points)?;

        let n = points.len();
        let neighbourhoods = self.neighbourhoods(points);
        let core: Vec<bool> = neighbourhoods
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels: Vec<Label> = vec![None; n];
        let mut next_label = 0usize;
        let mut stack = Vec::new();

        for seed in 0..n {
            if labels[seed].is_some() || !core[seed] {
                continue;
            }

            labels[seed] = Some(next_label);
            stack.push(seed);

            while let Some(p) = stack.pop() {
                if !core[p] {
                    continue;
                }
                for &q in &neighbourhoods[p] {
                    if labels[q].is_none() {
                        labels[q] = Some(next_label);
                        if core[q] {
                            stack.push(q);
                        }
                    }
                }
            }

            next_label += 1;
        }

        let noise = labels.iter().filter(|l| l.is_none()).count();
        debug!(
            points = n,
            clusters = next_label,
            noise,
            eps = self.eps,
            "dbscan finished"
        );
        Ok(labels)
    }

    fn neighbourhoods<V>(&self, points: &[V]) -> Vec<Vec<usize>>
    where
        V: AsRef<[f32]> + Sync,
    {
        (0..points.len())
            .into_par_iter()
            .map(|i| {
                let a = points[i].as_ref();
                (0..points.len())
                    .filter(|&j| j == i || self.metric.distance(a, points[j].as_ref()) <= self.eps)
                    .collect()
            })
            .collect()
    }
}

/// All points must share the dimension of the first one
pub fn check_dimensions<V: AsRef<[f32]>>(points: &[V]) -> Result<()> {
    let Some(first) = points.first() else {
        return Ok(());
    };
    let expected = first.as_ref().len();
    match points.iter().find(|p| p.as_ref().len() != expected) {
        Some(bad) => Err(Error::InvalidDimension {
            expected,
            actual: bad.as_ref().len(),
        }),
        None => Ok(()),
    }
}

/// Number of distinct clusters in a labelling
pub fn cluster_count(labels: &[Label]) -> usize {
    labels.iter().flatten().max().map_or(0, |m| m + 1)
}
