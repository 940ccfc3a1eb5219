use rand::seq::IndexedRandom;

/// Desktop browser User-Agents accepted by the streaming platforms' web APIs.
///
/// The web-room endpoints reject obviously scripted agents, so outbound API
/// calls pick one of these when the caller did not set a User-Agent itself.
const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Fixed agent presented by the local CORS proxy when resending requests.
pub const PROXY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Get a random desktop Chrome User-Agent.
pub fn random_user_agent() -> &'static str {
    DESKTOP_USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent() {
        let ua = random_user_agent();
        assert!(ua.contains("Chrome/"));
        assert!(DESKTOP_USER_AGENTS.contains(&ua));
    }

    #[test]
    fn test_proxy_user_agent_is_chrome() {
        assert!(PROXY_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(PROXY_USER_AGENT.contains("Chrome/91"));
    }
}
