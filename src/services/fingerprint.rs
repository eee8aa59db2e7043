// src/services/fingerprint.rs

//! Request fingerprint generation.
//!
//! Produces a randomized, plausible outbound header set per call so that
//! consecutive RPC replays do not share an identical client signature.
//! Pure: no state is carried between calls.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, DNT, HeaderMap, HeaderName, HeaderValue,
    REFERER, USER_AGENT,
};

use crate::error::{HarvestError, Result};
use crate::models::LocaleSettings;

/// Build the header set for one outbound RPC call.
///
/// The User-Agent is drawn uniformly from `user_agents`; Accept-Language
/// is derived from the request locale with a standard quality fallback.
pub fn request_headers(user_agents: &[String], locale: &LocaleSettings) -> Result<HeaderMap> {
    let ua = user_agents
        .get(fastrand::usize(..user_agents.len().max(1)))
        .ok_or_else(|| HarvestError::configuration("user agent pool is empty"))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(ua)
            .map_err(|e| HarvestError::configuration(format!("invalid user agent: {e}")))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&accept_language(locale))
            .map_err(|e| HarvestError::configuration(format!("invalid locale: {e}")))?,
    );
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/maps/"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    Ok(headers)
}

/// Accept-Language value for a locale, e.g. `zh-TW,zh;q=0.9,en;q=0.8`.
fn accept_language(locale: &LocaleSettings) -> String {
    let language = locale.language.trim();
    let base = language.split(['-', '_']).next().unwrap_or(language);
    if base == "en" {
        "en-US,en;q=0.9".to_string()
    } else if base == language {
        format!("{language},en;q=0.8")
    } else {
        format!("{language},{base};q=0.9,en;q=0.8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(language: &str) -> LocaleSettings {
        LocaleSettings {
            language: language.to_string(),
            region: "us".to_string(),
        }
    }

    #[test]
    fn test_headers_carry_pool_user_agent() {
        let pool = vec!["test-agent/1.0".to_string()];
        let headers = request_headers(&pool, &locale("en")).unwrap();
        assert_eq!(headers.get(USER_AGENT).unwrap(), "test-agent/1.0");
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(request_headers(&[], &locale("en")).is_err());
    }

    #[test]
    fn test_accept_language_with_region_subtag() {
        assert_eq!(accept_language(&locale("zh-TW")), "zh-TW,zh;q=0.9,en;q=0.8");
    }

    #[test]
    fn test_accept_language_bare() {
        assert_eq!(accept_language(&locale("en")), "en-US,en;q=0.9");
        assert_eq!(accept_language(&locale("fr")), "fr,en;q=0.8");
    }

    #[test]
    fn test_user_agent_always_from_pool() {
        let pool: Vec<String> = (0..4).map(|i| format!("agent-{i}")).collect();
        for _ in 0..20 {
            let headers = request_headers(&pool, &locale("en")).unwrap();
            let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
            assert!(pool.iter().any(|p| p == ua));
        }
    }
}
