//! Filename sanitization.

/// Replace characters that are invalid in filenames on common filesystems.
///
/// Each of `< > : " / \ | ? *` (plus NUL and other control characters)
/// becomes `_`; everything else, including spaces and `&`, is kept.
pub fn clean_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    #[test]
    fn test_clean_filename_example() {
        assert_eq!(clean_filename("Test:File*.pdf"), "Test_File_.pdf");
    }

    #[test]
    fn test_clean_filename_keeps_category_names() {
        assert_eq!(clean_filename("Floor & Area Drains"), "Floor & Area Drains");
        assert_eq!(clean_filename("fd-100"), "fd-100");
    }

    #[test]
    fn test_clean_filename_every_forbidden_char() {
        assert_eq!(clean_filename(r#"<>:"/\|?*"#), "_________");
    }

    proptest! {
        #[test]
        fn cleaned_names_have_no_forbidden_chars(name in ".*") {
            let cleaned = clean_filename(&name);
            prop_assert!(!cleaned.chars().any(|c| FORBIDDEN.contains(&c)));
            prop_assert_eq!(cleaned.chars().count(), name.chars().count());
        }

        #[test]
        fn clean_names_are_untouched(name in "[A-Za-z0-9 &._-]{0,40}") {
            prop_assert_eq!(clean_filename(&name), name);
        }
    }
}
