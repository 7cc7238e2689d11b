use super::*;
use crate::summary::{ExpenseLedger, PollState, Slot};
use shared::domain::PollId;

fn choice(id: &str, text: &str, votes: u32) -> PollChoice {
    PollChoice {
        id: ChoiceId::new(id),
        text: text.to_string(),
        location: String::new(),
        votes,
    }
}

fn slot(id: &str, yes: u32, no: u32) -> Slot {
    Slot {
        id: SlotId::new(id),
        start_time: None,
        end_time: None,
        yes_votes: yes,
        no_votes: no,
        is_winning: false,
        user_choice: None,
    }
}

fn summary_with(choices: Vec<PollChoice>, slots: Vec<Slot>, total: Decimal) -> EventSummary {
    EventSummary {
        poll: Some(PollState {
            poll_id: PollId::new("1"),
            question: "Where?".into(),
            choices,
            my_choice: None,
        }),
        slots,
        expenses: ExpenseLedger {
            total,
            ..ExpenseLedger::default()
        },
        ..EventSummary::default()
    }
}

#[test]
fn percentages_round_and_handle_zero_total() {
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(2, 3), 67);
    assert_eq!(percentage(0, 0), 0);
    assert_eq!(percentage(5, 5), 100);
}

#[test]
fn first_listed_choice_wins_ties() {
    let choices = vec![choice("1", "A", 2), choice("2", "B", 3), choice("3", "C", 3)];
    assert_eq!(winning_choice(&choices).map(|c| c.id.as_str()), Some("2"));
    assert!(winning_choice(&[]).is_none());

    let untouched = vec![choice("1", "A", 0), choice("2", "B", 0)];
    assert_eq!(winning_choice(&untouched).map(|c| c.id.as_str()), Some("1"));
}

#[test]
fn participation_rate_is_capped() {
    assert_eq!(participation_rate(0), 40);
    assert_eq!(participation_rate(5), 65);
    assert_eq!(participation_rate(11), 95);
    assert_eq!(participation_rate(u32::MAX), 95);
}

#[test]
fn analytics_from_summary() {
    let summary = summary_with(
        vec![choice("1", "Library", 3), choice("2", "Cafe", 1)],
        vec![slot("s1", 3, 1), slot("s2", 0, 0)],
        Decimal::from(90),
    );

    let analytics = Analytics::from_summary(&summary, 3);
    assert_eq!(analytics.total_votes, 4);
    assert_eq!(analytics.total_slots, 2);
    assert_eq!(analytics.participation_rate, 60);
    assert_eq!(analytics.total_expense, Decimal::from(90));
    assert_eq!(analytics.average_expense_per_participant, Decimal::from(30));
    assert_eq!(analytics.winning_choice, Some(ChoiceId::new("1")));
    assert_eq!(analytics.poll_data[0].percentage, 75);
    assert_eq!(analytics.poll_data[1].percentage, 25);
    assert_eq!(analytics.slot_data[0].yes_percentage, 75);
    assert_eq!(analytics.slot_data[1].yes_percentage, 0);
}

#[test]
fn analytics_without_poll_or_participants() {
    let analytics = Analytics::from_summary(&EventSummary::default(), 0);
    assert_eq!(analytics.total_votes, 0);
    assert_eq!(analytics.participation_rate, 40);
    assert_eq!(analytics.average_expense_per_participant, Decimal::ZERO);
    assert!(analytics.poll_data.is_empty());
    assert!(analytics.winning_choice.is_none());
}

#[test]
fn average_expense_keeps_cents() {
    let summary = summary_with(Vec::new(), Vec::new(), Decimal::new(1001, 2));
    let analytics = Analytics::from_summary(&summary, 2);
    assert_eq!(analytics.average_expense_per_participant, Decimal::new(5005, 3));
}
