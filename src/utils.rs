use crate::config::DelayRange;
use crate::interrupt::Interrupt;
use rand::seq::SliceRandom;
use url::Url;

/// Client identities rotated across browser sessions and search requests
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];

/// Pick a client identity at random from the pool
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Sleep for a random duration drawn from `range`, returning early on interruption.
///
/// Returns `false` when the pause was cut short.
pub async fn polite_pause(range: &DelayRange, interrupt: &Interrupt) -> bool {
    let delay = range.sample();
    if delay.is_zero() {
        return !interrupt.is_triggered();
    }
    ::log::trace!("Politeness delay of {:?}", delay);

    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = interrupt.triggered() => false,
    }
}

/// Reduce a URL to its origin (`scheme://host[:port]`)
pub fn origin_of(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;
    Some(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_is_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_origin_of() {
        let url = Url::parse("https://shop.example.com/products/a?x=1#top").unwrap();
        assert_eq!(origin_of(&url).as_deref(), Some("https://shop.example.com"));

        let url = Url::parse("http://localhost:8080/collections/all").unwrap();
        assert_eq!(origin_of(&url).as_deref(), Some("http://localhost:8080"));

        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(origin_of(&url), None);
    }

    #[tokio::test]
    async fn test_polite_pause_cut_short_by_interrupt() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let range = DelayRange::from_secs(30, 30);
        let started = std::time::Instant::now();
        assert!(!polite_pause(&range, &interrupt).await);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_polite_pause_zero_range() {
        let interrupt = Interrupt::new();
        assert!(polite_pause(&DelayRange::none(), &interrupt).await);
    }
}
