use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::error::StoreError;
use crate::core::severity::Severity;
use crate::core::store::WorkOrderStore;

/// Which timestamp anchors each point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimelineView {
    /// When each work order was first opened.
    #[default]
    FirstOccurrence,
    /// When each work order was last seen.
    Activity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub at: DateTime<Utc>,
    pub severity: Severity,
}

/// Ordered severity-over-time series, one point per work order. Pure read;
/// an empty store yields an empty series.
pub async fn build_timeline(
    store: &WorkOrderStore,
    view: TimelineView,
) -> Result<Vec<TimelinePoint>, StoreError> {
    let mut points: Vec<TimelinePoint> = store
        .scan_ordered()
        .await?
        .into_iter()
        .map(|order| TimelinePoint {
            at: match view {
                TimelineView::FirstOccurrence => order.created_at,
                TimelineView::Activity => order.last_seen_at,
            },
            severity: order.severity,
        })
        .collect();

    // The scan is ordered by created_at; the activity view re-sorts on
    // last_seen_at, which duplicates may have moved.
    if view == TimelineView::Activity {
        points.sort_by_key(|p| p.at);
    }
    Ok(points)
}
