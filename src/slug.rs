/// Heading id derived from heading text.
///
/// Lowercases the text, replaces every maximal run of characters outside
/// `[a-z0-9]` with a single `-`, and strips leading/trailing hyphens.
/// Non-ASCII letters count as separators, so `"Über uns"` becomes `"ber-uns"`.
#[must_use]
pub fn heading_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !id.is_empty() {
                id.push('-');
            }
            pending_hyphen = false;
            id.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    id
}

/// Subsection id derived from an admin-supplied title when importing web
/// content: spaces and slashes become hyphens, nothing else is touched.
#[must_use]
pub fn import_id(title: &str) -> String {
    title.trim().to_lowercase().replace([' ', '/'], "-")
}
