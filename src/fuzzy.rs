//! Fuzzy matching for library searches
//!
//! Resolves a spoken, noise-prone query against a freshly fetched library
//! listing. Only the single top-ranked candidate is ever returned: with
//! speech input a wrong pick is an accepted outcome, and surfacing alternates
//! would require a disambiguation round-trip the voice path cannot do.

use strsim::normalized_levenshtein;

/// Tunables for a match pass
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// 0.0 = exact matches only, 1.0 = match anything.
    /// A candidate survives when its similarity is at least `1 - threshold`.
    pub threshold: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { threshold: 0.4 }
    }
}

/// Similarity of `query` against one candidate label, in `0.0..=1.0`.
///
/// Case-insensitive. Exact equality wins outright; containment scores higher
/// the closer the two lengths are; everything else falls back to normalized
/// Levenshtein distance.
pub fn score(query: &str, candidate: &str) -> f64 {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();

    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 1.0;
    }

    let (shorter, longer) = if query.len() <= candidate.len() {
        (&query, &candidate)
    } else {
        (&candidate, &query)
    };
    if longer.contains(shorter.as_str()) {
        return 0.75 + 0.25 * (shorter.len() as f64 / longer.len() as f64);
    }

    normalized_levenshtein(&query, &candidate)
}

/// Find the single best candidate for `query`, or `None`.
///
/// `label` selects the field to match on. Deterministic: on equal scores the
/// earlier candidate wins. An empty candidate list or a blank query resolves
/// to `None` without scoring anything.
pub fn best_match<'a, T, F>(
    opts: &MatchOptions,
    candidates: &'a [T],
    label: F,
    query: &str,
) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let query = query.trim();
    if query.is_empty() || candidates.is_empty() {
        return None;
    }

    let cutoff = 1.0 - opts.threshold.clamp(0.0, 1.0);

    let mut best: Option<(&'a T, f64)> = None;
    for candidate in candidates {
        let s = score(query, label(candidate));
        if s < cutoff {
            continue;
        }
        // Strictly-greater keeps the earlier candidate on ties
        match best {
            Some((_, best_score)) if s <= best_score => {}
            _ => best = Some((candidate, s)),
        }
    }

    best.map(|(candidate, _)| candidate)
}
