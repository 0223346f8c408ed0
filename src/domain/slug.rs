//! URL-safe identifiers for blog posts.
//!
//! `slugify` transliterates non-ASCII letters (`é` becomes `e`), lowercases,
//! and collapses every other run of non-alphanumeric characters into a single
//! hyphen with no hyphen at either end. `ensure_unique` then probes the store
//! for `base`, `base-1`, `base-2`, ... in order.

use std::future::Future;

use rand::{distributions::Alphanumeric, Rng};

pub const MAX_SLUG_LENGTH: usize = 80;
pub const FALLBACK_SLUG: &str = "post";
/// Numeric suffixes tried before switching to a random one.
pub const MAX_NUMERIC_SUFFIX: u32 = 100;
const RANDOM_SUFFIX_LEN: usize = 6;

pub fn slugify(title: &str) -> String {
    let slug = ::slug::slugify(title);

    let truncated: String = slug.chars().take(MAX_SLUG_LENGTH).collect();
    let truncated = truncated.trim_end_matches('-');

    if truncated.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        truncated.to_string()
    }
}

/// Returns the first candidate for which `exists` is false. Probes run one at
/// a time since each answer decides whether another is needed.
pub async fn ensure_unique<F, Fut, E>(base: &str, exists: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    ensure_unique_bounded(base, MAX_NUMERIC_SUFFIX, exists).await
}

pub async fn ensure_unique_bounded<F, Fut, E>(
    base: &str,
    max_suffix: u32,
    mut exists: F,
) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    if !exists(base.to_string()).await? {
        return Ok(base.to_string());
    }

    for counter in 1..=max_suffix {
        let candidate = format!("{}-{}", base, counter);
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    // The unique index still guards the insert if this one collides too.
    let candidate = format!("{}-{}", base, random_suffix());
    tracing::warn!(
        base = %base,
        candidate = %candidate,
        "Numeric slug suffixes exhausted, using random suffix"
    );
    Ok(candidate)
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, collections::HashSet, convert::Infallible};

    #[test]
    fn punctuation_and_spacing_collapse() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("hello   world"), "hello-world");
        assert_eq!(slugify("  --Loyalty   Points--  "), "loyalty-points");
    }

    #[test]
    fn non_ascii_is_transliterated() {
        assert_eq!(slugify("Dubai Café & Bar — Opening!"), "dubai-cafe-bar-opening");
    }

    #[test]
    fn symbol_only_titles_fall_back() {
        assert_eq!(slugify("!!! ???"), FALLBACK_SLUG);
    }

    #[test]
    fn long_titles_are_truncated_without_trailing_hyphen() {
        let title = format!("{} end", "a".repeat(79));
        let slug = slugify(&title);
        assert_eq!(slug, "a".repeat(79));
        assert!(slug.len() <= MAX_SLUG_LENGTH);
    }

    #[actix_rt::test]
    async fn free_base_is_used_as_is() {
        let slug = ensure_unique("abc", |_| async { Ok::<_, Infallible>(false) }).await.unwrap();
        assert_eq!(slug, "abc");
    }

    #[actix_rt::test]
    async fn collisions_get_the_next_free_suffix() {
        let existing: HashSet<&str> = ["abc", "abc-1"].into_iter().collect();
        let probes = Cell::new(0);

        let slug = ensure_unique("abc", |candidate| {
            probes.set(probes.get() + 1);
            let taken = existing.contains(candidate.as_str());
            async move { Ok::<_, Infallible>(taken) }
        })
        .await
        .unwrap();

        assert_eq!(slug, "abc-2");
        assert_eq!(probes.get(), 3);
    }

    #[actix_rt::test]
    async fn exhausted_suffixes_switch_to_random() {
        let slug = ensure_unique_bounded("abc", 3, |_| async { Ok::<_, Infallible>(true) })
            .await
            .unwrap();

        let suffix = slug.strip_prefix("abc-").unwrap();
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[actix_rt::test]
    async fn probe_errors_propagate() {
        let result = ensure_unique("abc", |_| async { Err::<bool, _>("db down") }).await;
        assert_eq!(result, Err("db down"));
    }
}
