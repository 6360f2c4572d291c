//! # Extractors
//!
//! Per-source payload extraction. Each extractor function inspects one raw
//! JSON payload and either produces a fully-populated normalized variant,
//! declines (`Ok(None)`, the payload is well-formed but not interesting), or
//! fails with a retryable error when a collaborator it depends on is
//! unavailable.
//!
//! Extraction is total over arbitrary JSON: a missing or mistyped field is a
//! decline, never a panic. Partial output does not exist; a variant is only
//! returned once every required field has been read.

use serde_json::Value;

pub mod github;
pub mod gitlab;
pub mod pagure;
pub mod results;

// ============================================================================
// Payload navigation
// ============================================================================

/// Walk a path of object keys, returning the value at the end.
pub(crate) fn nested<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = payload;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Walk a path of object keys down to a string leaf.
pub(crate) fn nested_str<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a str> {
    nested(payload, path)?.as_str()
}

/// Walk a path of object keys down to an unsigned integer leaf.
pub(crate) fn nested_u64(payload: &Value, path: &[&str]) -> Option<u64> {
    nested(payload, path)?.as_u64()
}

/// Last two path segments of a forge project URL, as `(namespace, repo)`.
///
/// GitLab nests subgroups arbitrarily deep, so the namespace keeps every
/// segment before the final one.
pub(crate) fn namespace_and_repo(project_url: &str) -> Option<(String, String)> {
    let parsed = url::Url::parse(project_url).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 2 {
        return None;
    }
    let repo = segments[segments.len() - 1].trim_end_matches(".git");
    let namespace = segments[..segments.len() - 1].join("/");
    Some((namespace, repo.to_string()))
}

/// Short ref name from a full `refs/heads/...` or `refs/tags/...` ref.
///
/// Branch names may themselves contain slashes, so only the first two
/// segments are stripped.
pub(crate) fn short_ref(full_ref: &str) -> &str {
    let mut parts = full_ref.splitn(3, '/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("refs"), Some(_), Some(rest)) => rest,
        _ => full_ref,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
