//! Slug, branch, and path naming for subtask workspaces.

use std::path::{Path, PathBuf};

/// Slug used when a subtask sanitizes to nothing.
const EMPTY_SLUG: &str = "task";

/// Longest slug produced. Longer ones are cut and suffixed with a hash of
/// the full subtask so branch refs and directory names stay within
/// filesystem component limits.
pub const MAX_SLUG_LEN: usize = 64;

/// `-` plus eight hex digits.
const HASH_SUFFIX_LEN: usize = 9;

/// Derive the workspace slug for a subtask.
///
/// ASCII alphanumerics, `-` and `_` are kept (lowercased); every other
/// character, including whitespace and non-ASCII, becomes `_`. No collapsing
/// or trimming happens, so the mapping stays a pure per-character function.
///
/// Slugs longer than [`MAX_SLUG_LEN`] keep their first characters and end in
/// `-<hash>`, where the hash covers the whole subtask text.
///
/// Example: `"Add /health route"` -> `"add__health_route"`
pub fn slugify(subtask: &str) -> String {
    let slug: String = subtask
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else if slug.len() > MAX_SLUG_LEN {
        // Every char is ASCII here, so byte slicing is on a boundary.
        let keep = MAX_SLUG_LEN - HASH_SUFFIX_LEN;
        format!("{}-{:08x}", &slug[..keep], fnv1a(subtask.as_bytes()))
    } else {
        slug
    }
}

/// 32-bit FNV-1a, stable across builds and platforms.
fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5_u32, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(0x0100_0193)
    })
}

/// Branch name for a slug: `<prefix>/<slug>`.
pub fn branch_name(prefix: &str, slug: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), slug)
}

/// Workspace directory for a slug: `<base>/<slug>`.
pub fn workspace_path(base_dir: &Path, slug: &str) -> PathBuf {
    base_dir.join(slug)
}
