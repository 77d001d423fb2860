use unicode_normalization::UnicodeNormalization;

/// Collapse runs of whitespace (non-breaking spaces included) to one space and trim
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase slug: accents stripped, runs of non-alphanumerics become one `-`.
/// Letters of non-Latin scripts are kept, lowercased.
pub fn slugify(value: &str) -> String {
    let folded: String = value
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
