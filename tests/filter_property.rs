use proptest::prelude::*;

use onchange::watch::ChangeFilter;

fn filter(extensions: &[&str], ignore: &[&str]) -> ChangeFilter {
    let extensions: Vec<String> = extensions.iter().map(|s| s.to_string()).collect();
    let ignore: Vec<String> = ignore.iter().map(|s| s.to_string()).collect();
    ChangeFilter::new(&extensions, &ignore).expect("filter should compile")
}

#[test]
fn allowed_extension_qualifies() {
    let f = filter(&["rs"], &[]);
    assert!(f.is_qualifying("src/main.rs"));
}

#[test]
fn unlisted_extension_does_not_qualify() {
    let f = filter(&["rs"], &[]);
    assert!(!f.is_qualifying("src/main.py"));
}

#[test]
fn missing_extension_does_not_qualify() {
    let f = filter(&["rs"], &[]);
    assert!(!f.is_qualifying("Makefile"));
}

#[test]
fn hidden_basename_does_not_qualify() {
    let f = filter(&["rs"], &[]);
    assert!(!f.is_qualifying(".hidden.rs"));
    assert!(!f.is_qualifying("src/.hidden.rs"));
}

#[test]
fn ignore_glob_rejects_build_output() {
    let f = filter(&["rs"], &["target/**"]);
    assert!(!f.is_qualifying("target/debug/build/script.rs"));
    assert!(f.is_qualifying("src/main.rs"));
}

#[test]
fn extension_entries_may_carry_a_leading_dot() {
    let f = filter(&[".rs"], &[]);
    assert!(f.is_qualifying("src/main.rs"));
}

#[test]
fn extension_matching_is_case_insensitive() {
    let f = filter(&["rs"], &[]);
    assert!(f.is_qualifying("SRC/MAIN.RS"));
}

proptest! {
    // Hidden files never qualify, whatever their extension, even when the
    // extension is in the allow-list.
    #[test]
    fn hidden_basename_never_qualifies(
        stem in "[a-z]{1,8}",
        ext in "[a-z]{1,4}",
        dir in "[a-z]{1,8}",
    ) {
        let f = filter(&[ext.as_str()], &[]);
        let hidden = format!(".{stem}.{ext}");

        prop_assert!(!f.is_qualifying(&hidden));
        let nested = format!("{}/{}", dir, hidden);
        prop_assert!(!f.is_qualifying(&nested));
    }

    // A visible file with an allow-listed extension qualifies when no
    // ignore pattern is configured.
    #[test]
    fn visible_allowed_extension_always_qualifies(
        stem in "[a-z]{1,8}",
        ext in "[a-z]{1,4}",
    ) {
        let f = filter(&[ext.as_str()], &[]);
        let name = format!("{}.{}", stem, ext);
        prop_assert!(f.is_qualifying(&name));
    }
}
