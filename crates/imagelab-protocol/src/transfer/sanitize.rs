//! Filename sanitisation for persisted blobs.
//!
//! Strips any path component from either POSIX or Windows separators,
//! falls back to `"file"` for an empty/`.`/`..` remainder, then replaces
//! any character outside `[A-Za-z0-9._-]` with `_`.

/// Sanitise `filename` into a safe basename for filesystem persistence.
pub fn sanitize_filename(filename: &str) -> String {
    let candidate = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let candidate = match candidate {
        "" | "." | ".." => "file",
        other => other,
    };

    let sanitised: String = candidate
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitised.is_empty() {
        "file".to_string()
    } else {
        sanitised
    }
}
