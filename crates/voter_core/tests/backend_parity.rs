use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use voter_core::{
    Clock, DocumentVoterRepository, FixedClock, InMemoryDocumentStore, JsonFileVoterRepository,
    PollRecordInput, VoterInput, VoterRepository,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 8, 25, 55).unwrap()
}

fn vote_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, day, 12, 0, 0).unwrap()
}

/// Drives one repository through every contract operation and records each
/// outcome in a backend-neutral form.
fn run_scenario(repo: &dyn VoterRepository) -> Vec<String> {
    let mut outcomes = Vec::new();
    let mut record = |label: &str, outcome: String| outcomes.push(format!("{label}: {outcome}"));

    record("all_empty", format!("{:?}", repo.get_all_voters()));
    record("get_missing", format!("{:?}", repo.get_single_voter(1).map_err(|e| e.category())));

    for (id, name) in [(2, "Pat"), (1, "Sam"), (3, "Lee")] {
        let input = VoterInput::new(id, name, format!("{}@example.com", name.to_lowercase()));
        record("create", format!("{:?}", repo.create_voter(&input)));
    }
    record(
        "create_dup",
        format!("{}", repo.create_voter(&VoterInput::new(1, "Sam", "x@example.com")).unwrap_err()),
    );
    record(
        "update",
        format!("{:?}", repo.update_voter_info(&VoterInput::new(1, "Samuel", "samuel@example.com"))),
    );
    record(
        "update_missing",
        format!("{}", repo.update_voter_info(&VoterInput::new(9, "N", "n@example.com")).unwrap_err()),
    );

    record("history_none", format!("{}", repo.get_voter_history(1).unwrap_err()));
    for poll_id in [3, 1, 2] {
        let input = PollRecordInput::new(poll_id, poll_id * 10, vote_date(poll_id as u32));
        record("history_create", format!("{:?}", repo.create_voter_history(1, poll_id, &input)));
    }
    record(
        "history_dup",
        format!(
            "{}",
            repo.create_voter_history(1, 2, &PollRecordInput::new(2, 5, vote_date(4)))
                .unwrap_err()
        ),
    );
    record(
        "history_missing_voter",
        format!(
            "{}",
            repo.create_voter_history(9, 1, &PollRecordInput::new(1, 1, vote_date(1)))
                .unwrap_err()
        ),
    );
    record(
        "history_update",
        format!(
            "{:?}",
            repo.update_voter_history_info(1, 2, &PollRecordInput::new(2, 21, vote_date(5)))
        ),
    );
    record(
        "history_update_missing",
        format!(
            "{}",
            repo.update_voter_history_info(1, 8, &PollRecordInput::new(8, 1, vote_date(5)))
                .unwrap_err()
        ),
    );
    record("history_delete", format!("{:?}", repo.delete_single_voter_poll(1, 3)));
    record("history_delete_missing", format!("{}", repo.delete_single_voter_poll(1, 3).unwrap_err()));
    record("history", format!("{:?}", repo.get_voter_history(1)));
    record("event", format!("{:?}", repo.get_single_event(1, 2)));
    record("event_missing", format!("{}", repo.get_single_event(1, 7).unwrap_err()));

    record("delete", format!("{:?}", repo.delete_single_voter(2)));
    record("delete_missing", format!("{}", repo.delete_single_voter(2).unwrap_err()));
    record("all", format!("{:?}", repo.get_all_voters()));
    record("delete_all", format!("{:?}", repo.delete_all_voters()));
    record("all_after_clear", format!("{:?}", repo.get_all_voters()));
    outcomes
}

#[test]
fn snapshot_and_document_backends_agree() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
    let dir = tempfile::tempdir().unwrap();
    let snapshot =
        JsonFileVoterRepository::open_with_clock(dir.path().join("Data"), clock.clone()).unwrap();
    let document = DocumentVoterRepository::with_clock(InMemoryDocumentStore::new(), clock);

    let from_snapshot = run_scenario(&snapshot);
    let from_document = run_scenario(&document);

    assert_eq!(from_snapshot.len(), from_document.len());
    for (left, right) in from_snapshot.iter().zip(&from_document) {
        assert_eq!(left, right);
    }
}

#[test]
fn both_backends_serve_through_boxed_contract() {
    let dir = tempfile::tempdir().unwrap();
    let repos: Vec<Box<dyn VoterRepository + Send + Sync>> = vec![
        Box::new(JsonFileVoterRepository::open(dir.path().join("Data")).unwrap()),
        Box::new(DocumentVoterRepository::new(InMemoryDocumentStore::new())),
    ];

    for repo in &repos {
        repo.create_voter(&VoterInput::new(4, "Sam", "sam@example.com"))
            .unwrap();
        repo.create_voter_history(4, 1, &PollRecordInput::new(1, 2, vote_date(1)))
            .unwrap();
        let voter = repo.get_single_voter(4).unwrap();
        assert_eq!(voter.history[&1].vote_id, 2);
        assert!(voter.modified >= voter.created);
    }
}
