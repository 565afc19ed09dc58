//! Adoption-percentile frames.
//!
//! Clusters are admitted in descending order of users. Each admission adds
//! the cluster's users to a running total and intersects a running feature
//! set (starting from the full feature universe) with the cluster's own set.
//! A frame is cut whenever the running share of adjusted users reaches the
//! next unconsumed threshold.

use reachframe_cluster::{Cluster, Membership};
use reachframe_error::{ReachError, Result};
use reachframe_types::set_ops::{difference, intersect_in_place};
use reachframe_types::{BrowserRecord, FeatureSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One cumulative snapshot.
///
/// The first frame carries `available`; later frames carry `added` and
/// `removed` relative to the previous frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Users admitted so far, across all frames up to this one.
    pub users: u64,
    /// Highest threshold reached by this frame; `None` for a closing frame
    /// cut because the input ran out.
    pub threshold: Option<f64>,
    /// Records admitted since the previous frame, in admission order.
    pub browsers: Vec<BrowserRecord>,
    /// Union of every cluster admitted so far.
    pub cluster: Membership,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<FeatureSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<FeatureSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<FeatureSet>,
}

/// Cuts clusters into frames at a list of thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuilder {
    thresholds: Vec<f64>,
}

impl FrameBuilder {
    /// # Errors
    ///
    /// [`ReachError::InvalidConfig`] unless `thresholds` is non-empty, finite,
    /// positive and strictly increasing.
    pub fn new(thresholds: Vec<f64>) -> Result<Self> {
        validate_thresholds(&thresholds)?;
        Ok(Self { thresholds })
    }

    /// Build frames from clusters sorted descending by users.
    ///
    /// Several thresholds reached by one admission produce a single frame
    /// that records the highest of them. Clusters left over after the last
    /// frame are flushed into one closing frame; when the last admission
    /// itself cut a frame, nothing is pending and no closing frame follows,
    /// even if later thresholds were never reached. An `adjusted_total` of zero
    /// never reaches a threshold, so at most the closing frame is produced.
    pub fn build(&self, clusters: &[Cluster], universe: &FeatureSet, adjusted_total: u64) -> Vec<Frame> {
        let mut state = FrameState::new(universe.clone());
        let mut next = 0;

        for cluster in clusters {
            state.admit(cluster);
            let ratio = share(state.users, adjusted_total);

            let mut reached = None;
            while next < self.thresholds.len() && ratio >= self.thresholds[next] {
                reached = Some(self.thresholds[next]);
                next += 1;
            }
            if reached.is_some() {
                state.cut(reached);
            }
        }
        if !state.pending.is_empty() {
            debug!(users = state.users, "input exhausted before the next threshold");
            state.cut(None);
        }

        debug!(
            clusters = clusters.len(),
            frames = state.frames.len(),
            "frames built"
        );
        state.frames
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self {
            thresholds: reachframe_types::limits::DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

/// Accumulators local to one `build` call.
struct FrameState {
    users: u64,
    current: FeatureSet,
    previous: Option<FeatureSet>,
    cumulative: Membership,
    pending: Vec<BrowserRecord>,
    frames: Vec<Frame>,
}

impl FrameState {
    fn new(universe: FeatureSet) -> Self {
        Self {
            users: 0,
            current: universe,
            previous: None,
            cumulative: Membership::new(),
            pending: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn admit(&mut self, cluster: &Cluster) {
        self.users = self.users.saturating_add(cluster.users);
        intersect_in_place(&mut self.current, &cluster.features);
        self.cumulative.merge(&cluster.members);
        self.pending.extend(cluster.records.iter().cloned());
    }

    fn cut(&mut self, threshold: Option<f64>) {
        let mut cluster = self.cumulative.clone();
        cluster.normalize();
        let (available, added, removed) = match &self.previous {
            None => (Some(self.current.clone()), None, None),
            Some(previous) => (
                None,
                Some(difference(&self.current, previous)),
                Some(difference(previous, &self.current)),
            ),
        };
        self.frames.push(Frame {
            users: self.users,
            threshold,
            browsers: std::mem::take(&mut self.pending),
            cluster,
            available,
            added,
            removed,
        });
        self.previous = Some(self.current.clone());
    }
}

#[allow(clippy::cast_precision_loss)]
fn share(users: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        users as f64 / total as f64
    }
}

pub(crate) fn validate_thresholds(thresholds: &[f64]) -> Result<()> {
    if thresholds.is_empty() {
        return Err(ReachError::config("threshold list is empty"));
    }
    if let Some(bad) = thresholds.iter().find(|t| !t.is_finite() || **t <= 0.0) {
        return Err(ReachError::config(format!(
            "threshold {bad} must be finite and positive"
        )));
    }
    if let Some(pair) = thresholds.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(ReachError::config(format!(
            "thresholds must be strictly increasing ({} then {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}
