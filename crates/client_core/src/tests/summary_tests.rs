use super::*;
use chrono::{Datelike, Timelike};
use serde_json::json;

fn payload(value: Value) -> SummaryPayload {
    serde_json::from_value(value).expect("summary payload")
}

#[test]
fn empty_payload_normalizes_to_defaults() {
    let summary = normalize_summary(payload(json!({})));
    assert_eq!(summary, EventSummary::default());
}

#[test]
fn slots_accept_aliases_and_loose_counts() {
    let summary = normalize_summary(payload(json!({
        "slots": [
            {
                "slot_id": 7,
                "start_time": "2024-06-01T18:00:00Z",
                "end_time": "2024-06-01T20:00:00Z",
                "yes_votes": "3",
                "no_votes": -2,
                "isWinning": 1,
                "user_choice": "YES"
            },
            {"slot_id": "s2", "yes": 2.9, "no": null, "is_winning": false}
        ]
    })));

    let first = &summary.slots[0];
    assert_eq!(first.id.as_str(), "7");
    assert_eq!(first.yes_votes, 3);
    assert_eq!(first.no_votes, 0);
    assert!(first.is_winning);
    assert_eq!(first.user_choice, Some(SlotChoice::Yes));
    assert_eq!(first.start_time.map(|t| t.hour()), Some(18));

    let second = &summary.slots[1];
    assert_eq!(second.id.as_str(), "s2");
    assert_eq!(second.yes_votes, 2);
    assert_eq!(second.no_votes, 0);
    assert!(!second.is_winning);
    assert_eq!(second.user_choice, None);
    assert_eq!(second.start_time, None);
}

#[test]
fn poll_defaults_question_and_poll_id() {
    let summary = normalize_summary(payload(json!({
        "poll_results": [
            {"choice_id": 1, "text": "Library", "location": "Campus", "votes": 4},
            {"choice_id": "2", "text": "Cafe", "votes": "1"}
        ]
    })));

    let poll = summary.poll.expect("poll");
    assert_eq!(poll.poll_id.as_str(), DEFAULT_POLL_ID);
    assert_eq!(poll.question, DEFAULT_POLL_QUESTION);
    assert_eq!(poll.choices[0].id.as_str(), "1");
    assert_eq!(poll.choices[1].id.as_str(), "2");
    assert_eq!(poll.choices[1].location, "");
    assert_eq!(poll.choices[1].votes, 1);
    assert_eq!(poll.my_choice, None);
}

#[test]
fn entries_without_ids_are_dropped() {
    let summary = normalize_summary(payload(json!({
        "slots": [
            {"start_time": "2024-06-01T18:00:00Z", "yes_votes": 4},
            {"slot_id": 3, "yes_votes": 1}
        ],
        "winning_slot": {"yes_votes": 4},
        "poll_results": [
            {"text": "Nowhere", "votes": 9, "user_voted": true},
            {"choice_id": 8, "text": "Cafe", "votes": 2}
        ]
    })));

    let ids: Vec<&str> = summary.slots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["3"]);
    assert!(summary.winning_slot.is_none());
    let poll = summary.poll.expect("poll");
    assert_eq!(poll.choices.len(), 1);
    assert_eq!(poll.choices[0].id, ChoiceId::new("8"));
    assert_eq!(poll.my_choice, None);
}

#[test]
fn empty_poll_results_mean_no_poll() {
    let summary = normalize_summary(payload(json!({"poll_results": [], "poll_id": 4})));
    assert!(summary.poll.is_none());
}

#[test]
fn poll_id_prefers_nested_poll_object() {
    let summary = normalize_summary(payload(json!({
        "poll": {"poll_id": 12, "question": "Where?"},
        "poll_id": 3,
        "poll_results": [{"choice_id": 1, "text": "A", "votes": 0}]
    })));
    let poll = summary.poll.expect("poll");
    assert_eq!(poll.poll_id.as_str(), "12");
    assert_eq!(poll.question, "Where?");
}

#[test]
fn my_vote_takes_precedence_over_per_choice_flags() {
    let summary = normalize_summary(payload(json!({
        "my_vote": {"choice_id": 2},
        "poll_results": [
            {"choice_id": 1, "text": "A", "votes": 1, "user_voted": true},
            {"choice_id": 2, "text": "B", "votes": 1}
        ]
    })));
    assert_eq!(summary.poll.expect("poll").my_choice, Some(ChoiceId::new("2")));
}

#[test]
fn per_choice_flag_marks_selection_only_when_strictly_true() {
    let summary = normalize_summary(payload(json!({
        "poll_results": [
            {"choice_id": 1, "text": "A", "user_choice": "yes"},
            {"choice_id": 2, "text": "B", "user_choice": true}
        ]
    })));
    assert_eq!(summary.poll.expect("poll").my_choice, Some(ChoiceId::new("2")));
}

#[test]
fn expenses_normalize_balances_in_both_shapes() {
    let summary = normalize_summary(payload(json!({
        "expenses": {
            "items": [
                {
                    "expense_id": 5,
                    "user_id": "user_a",
                    "amount": "12.5",
                    "notes": "  Pizza ",
                    "created_at": "2024-02-03T10:00:00Z"
                },
                {"amount": -4, "weight": "abc"}
            ],
            "balances": {
                "alice": {"balance": 15.0},
                "bob": -3.25,
                "carol": {"balance": null}
            },
            "total": "27.5"
        }
    })));

    let ledger = summary.expenses;
    assert_eq!(ledger.total, Decimal::new(275, 1));
    assert_eq!(ledger.items[0].id.as_str(), "5");
    assert_eq!(ledger.items[0].amount, Decimal::new(125, 1));
    assert_eq!(ledger.items[0].notes, "Pizza");
    assert_eq!(ledger.items[0].weight, Decimal::ONE);
    assert_eq!(ledger.items[1].amount, Decimal::ZERO);
    assert_eq!(ledger.items[1].payer, None);
    assert_eq!(ledger.items[1].weight, Decimal::ONE);

    let balances: Vec<(&str, Decimal)> = ledger
        .balances
        .iter()
        .map(|(who, bal)| (who.as_str(), *bal))
        .collect();
    assert_eq!(
        balances,
        [
            ("alice", Decimal::from(15)),
            ("bob", Decimal::new(-325, 2)),
            ("carol", Decimal::ZERO)
        ]
    );
}

#[test]
fn string_amounts_are_exact() {
    let summary = normalize_summary(payload(json!({
        "expenses": {
            "items": [{"expense_id": 1, "amount": "90071992547409.99", "weight": 0.5}],
            "total": "0,10"
        }
    })));

    let ledger = summary.expenses;
    assert_eq!(ledger.items[0].amount.to_string(), "90071992547409.99");
    assert_eq!(ledger.items[0].weight, Decimal::new(5, 1));
    assert_eq!(ledger.total, Decimal::new(1, 1));
}

#[test]
fn winning_slot_and_event_info_are_normalized() {
    let summary = normalize_summary(payload(json!({
        "event": {"event_id": 99, "title": "Study night", "created_at": "2024-04-01T08:00:00Z"},
        "winning_slot": {"slot_id": "s1", "start_time": "2024-04-05T17:00", "yes_votes": 6}
    })));

    assert_eq!(summary.event.event_id, Some(EventId::new("99")));
    assert_eq!(summary.event.title.as_deref(), Some("Study night"));
    let winner = summary.winning_slot.expect("winning slot");
    assert_eq!(winner.yes_votes, 6);
    assert_eq!(winner.start_time.map(|t| t.day()), Some(5));
}

#[test]
fn parse_timestamp_accepts_common_shapes() {
    assert!(parse_timestamp("2024-01-02T10:30:00+03:00").is_some());
    assert!(parse_timestamp("2024-01-02T10:30").is_some());
    assert!(parse_timestamp("2024-01-02T10:30:15.250").is_some());
    assert!(parse_timestamp("2024-01-02 10:30").is_some());
    assert!(parse_timestamp("2024-01-02").is_some());
    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("next tuesday").is_none());

    let offset = parse_timestamp("2024-01-02T10:30:00+03:00").expect("offset");
    assert_eq!(offset.hour(), 7);
}
