//! Rendition matrix expansion and variant scheduling.
//!
//! Expansion (which variants exist) is kept apart from execution (how they
//! are run) so the scheduling strategy can change without touching stages.

use futures_util::stream::{self, StreamExt};
use std::future::Future;
use tracing::warn;

use reelcut_models::{AspectRatio, EditRequest};

/// One (duration, aspect ratio) cell of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantPlan {
    pub duration_secs: u32,
    pub aspect: AspectRatio,
}

/// Durations crossed with aspect ratios, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenditionMatrix {
    durations: Vec<u32>,
    aspects: Vec<AspectRatio>,
    skipped_labels: Vec<String>,
}

impl RenditionMatrix {
    /// Build the matrix for a request. Duplicates collapse; unknown aspect
    /// labels are dropped with a warning.
    pub fn from_request(request: &EditRequest) -> Self {
        let mut aspects = Vec::new();
        let mut skipped_labels = Vec::new();
        for label in request.unique_aspect_labels() {
            match AspectRatio::from_label(&label) {
                Some(aspect) if !aspects.contains(&aspect) => aspects.push(aspect),
                Some(_) => {}
                None => {
                    warn!("Skipping unknown aspect ratio: {}", label);
                    skipped_labels.push(label);
                }
            }
        }

        Self {
            durations: request.unique_durations(),
            aspects,
            skipped_labels,
        }
    }

    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    pub fn aspects(&self) -> &[AspectRatio] {
        &self.aspects
    }

    /// Labels that did not name a supported aspect ratio.
    pub fn skipped_labels(&self) -> &[String] {
        &self.skipped_labels
    }

    /// Number of variants that will be attempted.
    pub fn len(&self) -> usize {
        self.durations.len() * self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Variants for one duration, in aspect order.
    pub fn variants_for(&self, duration_secs: u32) -> Vec<VariantPlan> {
        self.aspects
            .iter()
            .map(|&aspect| VariantPlan {
                duration_secs,
                aspect,
            })
            .collect()
    }

    /// All variants, duration-major.
    pub fn variants(&self) -> impl Iterator<Item = VariantPlan> + '_ {
        self.durations
            .iter()
            .flat_map(move |&d| self.variants_for(d))
    }
}

/// How the variants of one duration are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantStrategy {
    /// One at a time, in matrix order
    #[default]
    Sequential,
    /// Up to `n` at once; results still come back in matrix order
    Parallel(usize),
}

impl VariantStrategy {
    pub fn from_concurrency(n: usize) -> Self {
        if n <= 1 {
            Self::Sequential
        } else {
            Self::Parallel(n)
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => (*n).max(1),
        }
    }

    /// Run `f` over `items` and collect the results in input order.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
    {
        stream::iter(items).map(f).buffered(self.width()).collect().await
    }
}
