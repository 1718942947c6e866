//! URL slugs shared by products and categories.

use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 4;

/// Lowercases and trims `input`, collapses every run of characters outside
/// `[a-z0-9]` into a single hyphen, and strips leading/trailing hyphens.
///
/// `slugify(slugify(x)) == slugify(x)` for every input.
#[must_use]
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Builds `slugify(name)-xxxx` where `xxxx` is four random `[a-z0-9]`
/// characters. Names that slugify to nothing fall back to `product`.
#[must_use]
pub fn generated_slug(name: &str) -> String {
    let base = slugify(name);
    let base = if base.is_empty() { "product" } else { &base };
    format!("{base}-{}", random_suffix())
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}
