//! Display titles and identifier slugs.
//!
//! Albums, categories and photos all share two naming conversions:
//!
//! - [`humanize`]: for display. Hyphens and underscores become spaces, runs
//!   of separators collapse, and each word is capitalized.
//!   `fu-mountain` → "Fu Mountain", `IMG_0042` → "IMG 0042".
//! - [`slugify`]: for identifiers and directory names. Lowercased letters
//!   and digits joined by single hyphens. `Summer Trip 2024!` → `summer-trip-2024`.
//!
//! Non-ASCII letters survive [`humanize`] untouched, so `福山步道` stays
//! readable in titles. [`slugify`] keeps them too: dropping them would turn
//! a Chinese album name into an empty slug.

/// Convert an identifier or filename stem into a display title.
///
/// - `"fu-mountain"` → `"Fu Mountain"`
/// - `"photo_20250101_1"` → `"Photo 20250101 1"`
/// - `"IMG_0042"` → `"IMG 0042"` (existing capitals are kept)
/// - `"--"` → `""`
pub fn humanize(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert a human-readable name into a lowercase, hyphen-separated slug.
///
/// - Lowercases ASCII letters
/// - Replaces every run of non-alphanumeric characters with one dash
/// - Strips leading and trailing dashes
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    slug.trim_matches('-').to_string()
}
