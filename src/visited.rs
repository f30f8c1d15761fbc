use std::collections::HashSet;
use std::sync::Mutex;

/// URLs already handled in the current run.
///
/// A URL is *visited* once a valid product has been recorded from it. While a
/// fetch is underway the URL is *claimed*, which keeps concurrent workers from
/// fetching it twice; a failed attempt releases the claim so that the URL can
/// be tried again if it is rediscovered later in the run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<VisitedState>,
}

#[derive(Debug, Default)]
struct VisitedState {
    visited: HashSet<String>,
    in_flight: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a valid product was already recorded from `url`
    pub fn seen(&self, url: &str) -> bool {
        self.lock().visited.contains(url)
    }

    /// Record `url` as visited, dropping any outstanding claim
    pub fn mark(&self, url: &str) {
        let mut state = self.lock();
        state.in_flight.remove(url);
        state.visited.insert(url.to_string());
    }

    /// Atomically reserve `url` for fetching.
    ///
    /// Returns `false` if it is already visited or claimed by another worker.
    pub fn claim(&self, url: &str) -> bool {
        let mut state = self.lock();
        if state.visited.contains(url) || state.in_flight.contains(url) {
            ::log::trace!("Skipping already visited or in-flight: {}", url);
            return false;
        }
        state.in_flight.insert(url.to_string());
        true
    }

    /// Give up a claim after a failed fetch or invalid extraction
    pub fn release(&self, url: &str) {
        self.lock().in_flight.remove(url);
    }

    pub fn len(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VisitedState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_mark_and_seen() {
        let visited = VisitedSet::new();
        assert!(!visited.seen("https://a/products/1"));
        visited.mark("https://a/products/1");
        assert!(visited.seen("https://a/products/1"));
        assert!(!visited.seen("https://a/products/1/"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_claim_blocks_second_claim() {
        let visited = VisitedSet::new();
        assert!(visited.claim("u"));
        assert!(!visited.claim("u"));
        assert!(!visited.seen("u"));
    }

    #[test]
    fn test_release_allows_retry() {
        let visited = VisitedSet::new();
        assert!(visited.claim("u"));
        visited.release("u");
        assert!(!visited.seen("u"));
        assert!(visited.claim("u"));
    }

    #[test]
    fn test_marked_url_cannot_be_claimed() {
        let visited = VisitedSet::new();
        assert!(visited.claim("u"));
        visited.mark("u");
        assert!(!visited.claim("u"));
        visited.release("u");
        assert!(visited.seen("u"));
        assert!(!visited.claim("u"));
    }

    #[test]
    fn test_concurrent_claims_admit_exactly_one() {
        let visited = Arc::new(VisitedSet::new());
        let handles = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || visited.claim("https://a/products/race"))
            })
            .collect::<Vec<_>>();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
