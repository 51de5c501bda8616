//! Customer de-duplication against the batch itself and the existing table.

use std::collections::HashSet;

use ordersheet_core::Customer;

/// Keeps the first candidate per phone number.
///
/// Candidates with a blank phone cannot be keyed and are dropped.
#[must_use]
pub fn dedupe_batch(candidates: Vec<Customer>) -> Vec<Customer> {
    let mut seen = HashSet::new();
    let mut blank = 0usize;
    let kept: Vec<Customer> = candidates
        .into_iter()
        .filter(|c| {
            if c.phone.is_empty() {
                blank += 1;
                return false;
            }
            seen.insert(c.phone.clone())
        })
        .collect();

    if blank > 0 {
        tracing::warn!(skipped = blank, "customers without phone number skipped");
    }
    kept
}

/// Candidates whose phone is not yet registered for platform `tag`, sorted
/// by name.
///
/// Only existing customers of the same platform block a candidate; the same
/// phone on another platform is a different customer.
#[must_use]
pub fn select_new_customers(
    candidates: Vec<Customer>,
    existing: &[Customer],
    tag: &str,
) -> Vec<Customer> {
    let known: HashSet<&str> = existing
        .iter()
        .filter(|c| c.platform == tag)
        .map(|c| c.phone.as_str())
        .collect();

    let mut fresh: Vec<Customer> = dedupe_batch(candidates)
        .into_iter()
        .filter(|c| !known.contains(c.phone.as_str()))
        .collect();
    fresh.sort_by(|a, b| a.name.cmp(&b.name));
    fresh
}
