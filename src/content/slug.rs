//! Slug normalization for URL path segments derived from free text.
//!
//! Slugs are lowercase `a-z0-9` joined by single hyphens. Diacritics are
//! removed by NFD decomposition, so Vietnamese titles keep their base letters.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block left behind by NFD decomposition.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Normalizes free text into a URL-safe slug.
///
/// Absent or blank input yields an empty string. Never fails; input with no
/// usable characters degrades to an empty string as well.
#[must_use]
pub fn normalize_slug(input: Option<&str>) -> String {
    let trimmed = input.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut slug = String::with_capacity(trimmed.len());
    let mut pending_dash = false;
    for ch in trimmed.to_lowercase().nfd() {
        if COMBINING_MARKS.contains(&ch) {
            continue;
        }
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_well_formed(slug: &str) {
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "unexpected character in {slug:?}"
        );
        assert!(!slug.starts_with('-'), "leading hyphen in {slug:?}");
        assert!(!slug.ends_with('-'), "trailing hyphen in {slug:?}");
        assert!(!slug.contains("--"), "doubled hyphen in {slug:?}");
    }

    #[test]
    fn empty_and_absent_input_yield_empty() {
        assert_eq!(normalize_slug(None), "");
        assert_eq!(normalize_slug(Some("")), "");
        assert_eq!(normalize_slug(Some("   \t ")), "");
    }

    #[test]
    fn strips_vietnamese_diacritics() {
        assert_eq!(normalize_slug(Some("Ẩm Thực 3D!")), "am-thuc-3d");
        assert_eq!(normalize_slug(Some("Khóa học Blender")), "khoa-hoc-blender");
        assert_eq!(normalize_slug(Some("Thư viện")), "thu-vien");
    }

    #[test]
    fn d_with_stroke_is_a_separator() {
        // U+0111 has no decomposition, so it is not reduced to `d`.
        assert_eq!(normalize_slug(Some("Đồ họa")), "o-hoa");
    }

    #[test]
    fn collapses_separator_runs_and_trims_edges() {
        assert_eq!(normalize_slug(Some("--Hello,   World!!--")), "hello-world");
        assert_eq!(normalize_slug(Some("a_b.c/d")), "a-b-c-d");
        assert_eq!(normalize_slug(Some("!!!")), "");
    }

    #[test]
    fn already_normalized_is_unchanged() {
        assert_eq!(normalize_slug(Some("am-thuc-3d")), "am-thuc-3d");
    }

    #[test]
    fn output_is_always_well_formed() {
        let samples = [
            "Ẩm Thực 3D!",
            "  spaced   out  ",
            "Ωmega → ∞",
            "MiXeD_Case-123",
            "日本語 title",
            "e\u{301}cole",
            "- - -",
            "tab\tnew\nline",
            "emoji 🎬 reel",
        ];
        for sample in samples {
            assert_well_formed(&normalize_slug(Some(sample)));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn any_input_yields_a_well_formed_slug(input in any::<String>()) {
            let slug = normalize_slug(Some(&input));
            assert_well_formed(&slug);
            prop_assert_eq!(normalize_slug(Some(&slug)), slug);
        }

        #[test]
        fn accented_and_astral_input_yields_a_well_formed_slug(
            input in "[a-zA-Z0-9 _.\\-\u{0300}-\u{036f}\u{0110}\u{0111}\u{1ea0}-\u{1ef9}\u{1f300}-\u{1f3ff}\u{20000}-\u{2000f}]{0,48}"
        ) {
            let slug = normalize_slug(Some(&input));
            assert_well_formed(&slug);
            prop_assert_eq!(normalize_slug(Some(&slug)), slug);
        }
    }
}
