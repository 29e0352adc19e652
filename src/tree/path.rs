//! Path helpers for the file tree.
//!
//! Tree nodes store absolute, forward-slash separated path strings. All
//! comparisons inside the tree go through [`normalize`] so watcher events
//! (which report raw platform paths) and user input join against the same
//! representation.

use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Normalize a platform path into the tree's canonical string form:
/// forward slashes, no trailing separator, no `\\?\` prefix.
pub fn normalize(path: &Path) -> String {
    let simplified = dunce::simplified(path);
    normalize_str(&simplified.to_string_lossy())
}

/// Normalize an already-stringly path.
pub fn normalize_str(path: &str) -> String {
    let mut out = path.replace('\\', "/");
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Join a directory path and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Final component of a path.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Parent directory of a path. The root's parent is the root itself.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// True if `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len() + 1 && path.starts_with(ancestor) && path.as_bytes()[ancestor.len()] == b'/'
}

/// True if `path` equals `target` or lies below it. This is the tab cascade
/// predicate for deletes and unlinks.
pub fn covers(target: &str, path: &str) -> bool {
    path == target || is_descendant(path, target)
}

/// Substitute `old_prefix` with `new_prefix` at the start of `path`.
///
/// Callers guarantee the prefix relation; descendant paths are derived, so a
/// rename or move rewrites a whole subtree with this one substitution.
pub fn rewrite_prefix(path: &str, old_prefix: &str, new_prefix: &str) -> String {
    debug_assert!(path == old_prefix || is_descendant(path, old_prefix));
    format!("{}{}", new_prefix, &path[old_prefix.len()..])
}

/// Split an entry name into stem and extension. Leading dots do not start an
/// extension, so `.gitignore` has no extension.
pub fn split_stem_ext(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Disambiguated sibling name of the form `stem (n).ext`.
pub fn numbered_name(name: &str, n: u32) -> String {
    match split_stem_ext(name) {
        (stem, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
        (stem, None) => format!("{} ({})", stem, n),
    }
}

/// Fold an entry name for collision matching: NFC normalization plus
/// lowercasing, so `Note.md` and `note.md` collide the way case-preserving
/// filesystems treat them.
pub fn fold_name(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}
