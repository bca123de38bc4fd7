use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::RepoPath;

pub static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*(/[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*)*$")
        .unwrap()
});

pub static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9._-]{0,127}$").unwrap());

pub static DIGEST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+([+._-][a-z0-9]+)*:[a-zA-Z0-9=_-]+").unwrap());

pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn is_valid_tag(tag: &str) -> bool {
    TAG_RE.is_match(tag)
}

pub fn is_valid_digest(digest: &str) -> bool {
    DIGEST_RE.is_match(digest)
}

/// Splits a validated name into namespace and repo on the LAST slash; the
/// namespace keeps any inner slashes.
pub fn split_name(name: &str) -> Option<RepoPath> {
    let (namespace, repo) = name.rsplit_once('/')?;
    if namespace.is_empty() || repo.is_empty() {
        return None;
    }
    Some(RepoPath::new(namespace, repo))
}
