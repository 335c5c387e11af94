//! Post URL resolution
//!
//! Accepts links on both the legacy (`twitter.com`) and current (`x.com`)
//! domains, in the `/<handle>/status/<id>` and `/i/web/status/<id>` shapes.

use std::sync::LazyLock;

use advault_core::models::PostReference;
use regex::Regex;

static STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:(?:www|mobile)\.)?(?:twitter|x)\.com/([A-Za-z0-9_]+)/status(?:es)?/(\d+)(?:[/?#].*)?$")
        .expect("Invalid status URL regex")
});

static WEB_STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:(?:www|mobile)\.)?(?:twitter|x)\.com/i/web/status/(\d+)(?:[/?#].*)?$")
        .expect("Invalid web status URL regex")
});

/// Handle used when the URL carries none (`/i/web/status/<id>`); the
/// metadata API resolves the real author from the post id.
pub const UNKNOWN_HANDLE: &str = "i";

/// Parse a post URL into its id and author handle.
///
/// Returns `None` for anything that is not a recognised post link. Never
/// touches the network.
pub fn resolve(url: &str) -> Option<PostReference> {
    let url = url.trim();

    if let Some(caps) = WEB_STATUS_URL.captures(url) {
        return Some(PostReference {
            post_id: caps.get(1)?.as_str().to_string(),
            author_handle: UNKNOWN_HANDLE.to_string(),
        });
    }

    let caps = STATUS_URL.captures(url)?;
    let handle = caps.get(1)?.as_str();
    if handle.eq_ignore_ascii_case("i") {
        return None;
    }

    Some(PostReference {
        post_id: caps.get(2)?.as_str().to_string(),
        author_handle: handle.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile_and_capture() {
        let caps = STATUS_URL.captures("https://x.com/alice/status/42").unwrap();
        assert_eq!(&caps[1], "alice");
        assert_eq!(&caps[2], "42");
        let caps = WEB_STATUS_URL
            .captures("https://twitter.com/i/web/status/42")
            .unwrap();
        assert_eq!(&caps[1], "42");
    }

    #[test]
    fn test_both_domains_resolve_identically() {
        let handles = ["alice", "Bob_99", "x"];
        let ids = ["12345", "1790000000000000000"];
        for handle in handles {
            for id in ids {
                let legacy = resolve(&format!("https://twitter.com/{}/status/{}", handle, id));
                let current = resolve(&format!("https://x.com/{}/status/{}", handle, id));
                assert!(legacy.is_some());
                assert_eq!(legacy, current);
                let reference = current.unwrap();
                assert_eq!(reference.post_id, id);
                assert_eq!(reference.author_handle, handle);
            }
        }
    }

    #[test]
    fn test_web_status_form() {
        let reference = resolve("https://x.com/i/web/status/777").unwrap();
        assert_eq!(reference.post_id, "777");
        assert_eq!(reference.author_handle, UNKNOWN_HANDLE);
        assert_eq!(resolve("https://twitter.com/i/web/status/777"), Some(reference));
    }

    #[test]
    fn test_tolerates_query_fragment_and_subdomains() {
        let expected = Some(PostReference {
            post_id: "42".to_string(),
            author_handle: "alice".to_string(),
        });
        assert_eq!(resolve("https://x.com/alice/status/42?s=20"), expected);
        assert_eq!(resolve("https://mobile.twitter.com/alice/status/42/video/1"), expected);
        assert_eq!(resolve("  www.x.com/alice/status/42#top "), expected);
    }

    #[test]
    fn test_rejects_non_post_urls() {
        for url in [
            "",
            "not a url",
            "https://x.com/alice",
            "https://x.com/alice/status/",
            "https://x.com/alice/status/abc",
            "https://x.com/alice/status/12a",
            "https://youtube.com/alice/status/42",
            "https://notx.com/alice/status/42",
            "https://x.com.evil.io/alice/status/42",
            "https://x.com/i/status/42",
        ] {
            assert_eq!(resolve(url), None, "{} should not resolve", url);
        }
    }
}
