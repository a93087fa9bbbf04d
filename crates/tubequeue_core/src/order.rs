use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{CategoryActivity, CategoryOrder, LinkRecord};

/// Orders category names for display.
///
/// `Alphabetical` sorts by name alone. The other strategies apply their own
/// key first (`MostItems`: link count descending, `PinnedFirst`: pinned
/// before unpinned) and then fall back to most recent activity, then name.
pub fn order_categories(
    categories: &[String],
    links: &[LinkRecord],
    activity: &CategoryActivity,
    order: CategoryOrder,
    pinned: &[String],
) -> Vec<String> {
    let counts = link_counts(links);
    let count = |name: &str| counts.get(name).copied().unwrap_or(0);
    let is_pinned = |name: &str| pinned.iter().any(|p| p == name);

    let mut ordered = categories.to_vec();
    ordered.sort_by(|a, b| {
        let primary = match order {
            CategoryOrder::Alphabetical => return a.cmp(b),
            CategoryOrder::MostItems => count(b).cmp(&count(a)),
            CategoryOrder::PinnedFirst => is_pinned(b).cmp(&is_pinned(a)),
            CategoryOrder::Recent => Ordering::Equal,
        };
        primary
            .then_with(|| activity.last_active(b).cmp(&activity.last_active(a)))
            .then_with(|| a.cmp(b))
    });
    ordered
}

pub(crate) fn link_counts(links: &[LinkRecord]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for link in links {
        for category in &link.categories {
            *counts.entry(category.as_str()).or_insert(0) += 1;
        }
    }
    counts
}
