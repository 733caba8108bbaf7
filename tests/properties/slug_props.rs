use proptest::prelude::*;

use skillz::registry::{FALLBACK_SLUG, slugify};

proptest! {
    #[test]
    fn slugify_is_idempotent(name in ".{0,40}") {
        let slug = slugify(&name);
        prop_assert_eq!(slugify(&slug), slug.clone());
        prop_assert_eq!(slugify(&name), slug);
    }

    #[test]
    fn slugs_are_url_safe(name in ".{0,40}") {
        let slug = slugify(&name);
        prop_assert!(!slug.is_empty());
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    #[test]
    fn names_without_ascii_alphanumerics_fall_back(name in "[^a-zA-Z0-9]{0,20}") {
        prop_assert_eq!(slugify(&name), FALLBACK_SLUG);
    }
}
