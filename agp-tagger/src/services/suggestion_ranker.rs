//! Suggestion ranking
//!
//! Orders provider suggestions by confidence, highest first. The sort is
//! stable: suggestions with equal confidence keep their arrival order.
//! Ranking never drops or re-scores an entry.

use crate::models::MetadataResult;

/// Rank suggestions by confidence descending
///
/// Position 0 of the returned list is the accepted suggestion.
pub fn rank(mut suggestions: Vec<MetadataResult>) -> Vec<MetadataResult> {
    // sort_by is stable
    suggestions.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    suggestions
}
