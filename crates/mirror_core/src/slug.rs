/// Filesystem-safe slug for a page title, used as the output file stem and
/// as the per-page image directory name.
///
/// Spaces become hyphens, then `/ ( ) \ '` are deleted and the result is
/// lower-cased. Distinct titles may collide; callers accept that.
pub fn sanitize_title(title: &str) -> String {
    title
        .replace(' ', "-")
        .chars()
        .filter(|c| !is_stripped(*c))
        .collect::<String>()
        .to_lowercase()
}

fn is_stripped(c: char) -> bool {
    matches!(c, '/' | '(' | ')' | '\\' | '\'')
}
