use preset_market::slug::{MAX_SLUG_LEN, slugify};

#[test]
fn test_simple_name() {
    assert_eq!(slugify("My Preset"), "my-preset");
}

#[test]
fn test_strips_punctuation_and_collapses_separators() {
    assert_eq!(slugify("Hello,   World!! -- v2"), "hello-world-v2");
    assert_eq!(slugify("snake_case stays"), "snake_case-stays");
}

#[test]
fn test_keeps_unicode_word_characters() {
    assert_eq!(slugify("夜间 主题"), "夜间-主题");
}

#[test]
fn test_is_deterministic_and_bounded() {
    let long_name = "Abc ".repeat(150);
    let slug = slugify(&long_name);
    assert_eq!(slug, slugify(&long_name));
    assert_eq!(slug.chars().count(), MAX_SLUG_LEN);
    assert!(
        slug.chars()
            .all(|c| c == '-' || c == '_' || c.is_alphanumeric() && !c.is_uppercase())
    );
}
