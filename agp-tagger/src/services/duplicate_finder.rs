//! Duplicate detection over the inventory

use std::collections::HashMap;

use crate::models::{non_blank, EnhancedAudioFile};

/// Groups of inventory indices sharing artist and title
///
/// Comparison is case-insensitive after trimming; files missing either
/// field never group. Each group has at least two members and groups are
/// ordered by their first index.
pub fn find_duplicates(inventory: &[EnhancedAudioFile]) -> Vec<Vec<usize>> {
    let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();

    for (index, entry) in inventory.iter().enumerate() {
        let Some(metadata) = entry.file.current_metadata.as_ref() else {
            continue;
        };
        let (Some(artist), Some(title)) = (
            non_blank(metadata.artist.as_deref()),
            non_blank(metadata.title.as_deref()),
        ) else {
            continue;
        };

        groups
            .entry((artist.to_lowercase(), title.to_lowercase()))
            .or_default()
            .push(index);
    }

    let mut duplicates: Vec<Vec<usize>> = groups
        .into_values()
        .filter(|indices| indices.len() > 1)
        .collect();
    duplicates.sort_by_key(|indices| indices[0]);
    duplicates
}
