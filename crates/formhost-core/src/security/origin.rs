//! Embedding-origin matching.
//!
//! Patterns come in three shapes:
//! - exact origin (`https://portal.acme.com`)
//! - wildcard, where `*` expands to any run of characters (`https://*.acme.com`)
//! - loopback (`http://localhost`, `http://127.0.0.1`), matched on host only so
//!   any dev-server port passes

use url::Url;

const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Glob match where `*` matches any (possibly empty) run of bytes.
fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut resume = 0usize;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some(p);
                resume = t;
                p += 1;
            }
            Some(&c) if c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some(s) => {
                    p = s + 1;
                    resume += 1;
                    t = resume;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

fn loopback_host(pattern: &str) -> Option<String> {
    let url = Url::parse(pattern).ok()?;
    let host = url.host_str()?;
    LOOPBACK_HOSTS.contains(&host).then(|| host.to_string())
}

/// Does `candidate` (an origin) satisfy `pattern`?
pub fn origin_matches(candidate: &str, pattern: &str) -> bool {
    if candidate == pattern {
        return true;
    }
    if pattern.contains('*') {
        return wildcard_match(pattern.as_bytes(), candidate.as_bytes());
    }
    if let Some(host) = loopback_host(pattern) {
        return Url::parse(candidate)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == host))
            .unwrap_or(false);
    }
    false
}

/// Origin (scheme://host[:port]) of a referring page, if it has one.
///
/// Opaque origins (`data:`, `about:`, unparseable input) resolve to `None`.
pub fn parent_origin_from_referrer(referrer: &str) -> Option<String> {
    let url = Url::parse(referrer.trim()).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
