//! Identifier rewriting for cloned configurations.
//!
//! The payload is never parsed. Every occurrence of the source entity's URL is
//! replaced by the destination entity's URL, provided the match ends on an
//! identifier boundary (so `job/build` does not rewrite `job/build-nightly`).

use crate::destination::Destination;
use crate::kind::Kind;

/// Rewrite `payload` so references to `from` point at `to`.
///
/// Destinations with an unknown (empty) entity are left alone.
pub fn fixup(payload: &str, kind: Kind, from: &Destination, to: &Destination) -> String {
    if !from.has_entity() || !to.has_entity() || from == to {
        return payload.to_string();
    }

    let needle = from.url(kind);
    let replacement = to.url(kind);

    let mut out = String::with_capacity(payload.len());
    let mut last = 0;
    let mut rewritten = 0usize;

    for (start, matched) in payload.match_indices(&needle) {
        if start < last {
            continue;
        }
        let end = start + matched.len();
        if !ends_on_boundary(&payload[end..]) {
            continue;
        }
        out.push_str(&payload[last..start]);
        out.push_str(&replacement);
        last = end;
        rewritten += 1;
    }
    out.push_str(&payload[last..]);

    if rewritten > 0 {
        log::debug!("Rewrote {} reference(s) {} -> {}", rewritten, needle, replacement);
    }

    out
}

fn ends_on_boundary(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '%')),
    }
}
