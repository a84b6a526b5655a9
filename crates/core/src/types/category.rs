//! Category name normalization.

/// Title-case a category name for filtering.
///
/// Each whitespace-separated word gets an uppercase first letter and
/// lowercase rest; runs of whitespace collapse to a single space. Lookups
/// compare the normalized value case-insensitively against stored names,
/// so `"rones"`, `"RONES"` and `" Rones "` all select `Rones`.
///
/// ```
/// use bodegon_core::normalize_category_name;
///
/// assert_eq!(normalize_category_name("vinos TINTOS"), "Vinos Tintos");
/// ```
#[must_use]
pub fn normalize_category_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
