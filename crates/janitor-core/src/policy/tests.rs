use super::*;
use chrono::TimeZone;

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn policy(language_filter: bool, accepted: &[&str]) -> PolicyConfig {
    PolicyConfig {
        accepted_languages: accepted.iter().map(|s| s.to_string()).collect(),
        language_filter,
        collection_name: Some("Keepers".to_string()),
        dry_run: true,
    }
}

fn history(entries: &[(&str, DateTime<Utc>)]) -> WatchHistory {
    let mut history = WatchHistory::new();
    for (title, at) in entries {
        history.record(*title, *at);
    }
    history
}

#[test]
fn test_parse_added() {
    assert_eq!(parse_added("2024-01-01T00:00:00Z").unwrap(), utc(2024, 1, 1));
    assert!(parse_added("2024-01-01").is_err());
    assert!(parse_added("2024-01-01T00:00:00.123Z").is_err());
}

#[test]
fn test_watched_after_added_is_unmonitored() {
    let movie = ManagedMovie::new(1, "Alpha")
        .with_added("2024-01-01T00:00:00Z")
        .with_language("English");
    let history = history(&[("Alpha", utc(2024, 2, 1))]);

    let (action, warning) = decide(&movie, &history, &ProtectedSet::empty(), &policy(false, &[]));
    assert_eq!(
        action,
        Action::Unmonitor {
            viewed_at: utc(2024, 2, 1),
            added_at: utc(2024, 1, 1),
        }
    );
    assert!(warning.is_none());
}

#[test]
fn test_unmonitor_wins_over_language_and_protection() {
    let movie = ManagedMovie::new(1, "Alpha")
        .with_added("2024-01-01T00:00:00Z")
        .with_language("German");
    let history = history(&[("Alpha", utc(2024, 2, 1))]);
    let protected = ProtectedSet::new("Keepers", ["Alpha"]);

    let (action, _) = decide(&movie, &history, &protected, &policy(true, &["English"]));
    assert!(matches!(action, Action::Unmonitor { .. }));
}

#[test]
fn test_watched_before_added_is_not_unmonitored() {
    let movie = ManagedMovie::new(1, "Alpha").with_added("2024-03-01T00:00:00Z");
    let history = history(&[("Alpha", utc(2024, 2, 1))]);

    let (action, _) = decide(&movie, &history, &ProtectedSet::empty(), &policy(false, &[]));
    assert_eq!(action, Action::Keep(KeepReason::Retained));
}

#[test]
fn test_missing_added_skips_unmonitor() {
    let movie = ManagedMovie::new(1, "Alpha");
    let history = history(&[("Alpha", utc(2024, 2, 1))]);

    let (action, warning) = decide(&movie, &history, &ProtectedSet::empty(), &policy(false, &[]));
    assert_eq!(action, Action::Keep(KeepReason::Retained));
    assert!(warning.is_none());
}

#[test]
fn test_bad_added_warns_and_falls_through() {
    let movie = ManagedMovie::new(1, "Alpha")
        .with_added("01/01/2024")
        .with_language("German");
    let history = history(&[("Alpha", utc(2024, 2, 1))]);

    let (action, warning) = decide(&movie, &history, &ProtectedSet::empty(), &policy(true, &["English"]));
    assert_eq!(
        action,
        Action::Delete {
            reason: DeleteReason::Language {
                language: "German".to_string()
            },
            options: DeleteOptions::PURGE,
        }
    );
    assert!(warning.unwrap().contains("Alpha"));
}

#[test]
fn test_protected_is_kept_regardless_of_state() {
    let protected = ProtectedSet::new("Keepers", ["Beta"]);
    let cases = [
        ManagedMovie::new(2, "Beta").with_monitored(false).with_language("French"),
        ManagedMovie::new(2, "Beta").with_monitored(true).with_language("French"),
        ManagedMovie::new(2, "Beta").with_monitored(false),
    ];

    for movie in &cases {
        let (action, _) = decide(movie, &WatchHistory::new(), &protected, &policy(true, &["English"]));
        assert_eq!(action, Action::Keep(KeepReason::Protected), "{:?}", movie);
    }
}

#[test]
fn test_unmonitored_is_deleted_independent_of_language_filter() {
    let movie = ManagedMovie::new(3, "Gamma")
        .with_monitored(false)
        .with_language("English");

    for filter in [false, true] {
        let (action, _) = decide(&movie, &WatchHistory::new(), &ProtectedSet::empty(), &policy(filter, &["English"]));
        match action {
            Action::Delete { reason, options } => {
                assert_eq!(reason, DeleteReason::Unmonitored);
                assert!(options.delete_files);
                assert!(!options.add_import_exclusion);
            }
            other => panic!("expected delete, got {:?}", other),
        }
    }
}

#[test]
fn test_unmonitored_and_wrong_language_is_deleted_once_as_unmonitored() {
    let movies = vec![ManagedMovie::new(4, "Delta")
        .with_monitored(false)
        .with_language("Korean")];

    let plan = plan(&movies, &WatchHistory::new(), &ProtectedSet::empty(), &policy(true, &["English"]));
    let deletions: Vec<_> = plan.deletions().collect();
    assert_eq!(deletions.len(), 1);
    assert!(matches!(
        deletions[0].action,
        Action::Delete { reason: DeleteReason::Unmonitored, .. }
    ));
}

#[test]
fn test_language_filter_off_never_deletes_for_language() {
    let movies = vec![
        ManagedMovie::new(5, "Epsilon").with_language("Korean"),
        ManagedMovie::new(6, "Zeta"),
    ];

    let plan = plan(&movies, &WatchHistory::new(), &ProtectedSet::empty(), &policy(false, &[]));
    assert_eq!(plan.deletions().count(), 0);
}

#[test]
fn test_language_filter_on() {
    let movies = vec![
        ManagedMovie::new(5, "Epsilon").with_language("Korean"),
        ManagedMovie::new(6, "Zeta").with_language("English"),
        ManagedMovie::new(7, "Eta"),
    ];

    let plan = plan(&movies, &WatchHistory::new(), &ProtectedSet::empty(), &policy(true, &["English"]));
    let deleted: Vec<(&str, String)> = plan
        .deletions()
        .map(|d| match &d.action {
            Action::Delete { reason, .. } => (d.movie.title.as_str(), reason.to_string()),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        deleted,
        vec![
            ("Epsilon", "language not accepted (Korean)".to_string()),
            ("Eta", "language not accepted (Unknown)".to_string()),
        ]
    );
}

#[test]
fn test_plan_marks_protected_once_per_entry() {
    let movies = vec![
        ManagedMovie::new(1, "Alpha").with_added("2024-01-01T00:00:00Z"),
        ManagedMovie::new(2, "Beta").with_monitored(false),
        ManagedMovie::new(3, "Gamma").with_monitored(false),
    ];
    let history = history(&[("Alpha", utc(2024, 2, 1))]);
    let protected = ProtectedSet::new("Keepers", ["Alpha", "Beta", "Not In Radarr"]);

    let plan = plan(&movies, &history, &protected, &policy(false, &[]));
    let protected_titles: Vec<&str> = plan.protected().map(|d| d.movie.title.as_str()).collect();
    assert_eq!(protected_titles, vec!["Alpha", "Beta"]);
    assert_eq!(plan.unmonitors().count(), 1);
    assert_eq!(plan.deletions().count(), 1);
    assert_eq!(plan.decisions.len(), 3);
    assert!(plan.warnings.is_empty());
}
