use std::sync::Arc;

use serde_json::{json, Value};
use shared::domain::{EventId, UserId};

use super::*;
use crate::{
    balance::{BalanceClass, CurrencyFormatter},
    error::{NoticeSeverity, ValidationError},
    test_support::{FakeEventApi, Failure},
};

fn ledger() -> Value {
    json!({
        "expenses": {
            "items": [
                {"expense_id": 1, "user_id": "alice", "amount": 30, "notes": "Pizza",
                 "created_at": "2024-05-01T10:00:00Z"},
                {"expense_id": 2, "user_id": "bob", "amount": "12,5", "notes": "Drinks",
                 "created_at": "2024-05-02T10:00:00Z"},
            ],
            "balances": {"alice": {"balance": 15.0}, "bob": {"balance": -3.25}, "carol": 0},
            "total": 42.5
        }
    })
}

async fn splitter(api: &Arc<FakeEventApi>) -> ExpenseSplitter {
    let ctx = BoardContext::new(api.clone(), EventId::new("42"), UserId::new("user_1"));
    let splitter = ExpenseSplitter::new(
        ctx,
        BalancePresenter::new(CurrencyFormatter::new("tr-TR", "₺")),
    );
    splitter.refresh().await.expect("initial refresh");
    splitter
}

#[tokio::test]
async fn expenses_are_listed_newest_first() {
    let api = Arc::new(FakeEventApi::new(ledger()));
    let splitter = splitter(&api).await;

    let views = splitter.expenses().await;
    let notes: Vec<&str> = views.iter().map(|v| v.expense.notes.as_str()).collect();
    assert_eq!(notes, ["Drinks", "Pizza"]);
    assert_eq!(views[0].amount_text, "₺12,50");
    assert_eq!(splitter.total_text().await, "₺42,50");
}

#[tokio::test]
async fn balances_are_classified_by_sign() {
    let api = Arc::new(FakeEventApi::new(ledger()));
    let splitter = splitter(&api).await;

    let lines = splitter.balances().await;
    let summary: Vec<(&str, BalanceClass)> = lines
        .iter()
        .map(|line| (line.participant.as_str(), line.class))
        .collect();
    assert_eq!(
        summary,
        [
            ("alice", BalanceClass::Credit),
            ("bob", BalanceClass::Debt),
            ("carol", BalanceClass::Even),
        ]
    );
    assert_eq!(lines[0].text, "+₺15,00 to receive");
    assert_eq!(lines[1].text, "₺3,25 to pay");
}

#[tokio::test]
async fn valid_draft_is_sent_cleared_and_refreshed() {
    let api = Arc::new(FakeEventApi::new(json!({})));
    let splitter = splitter(&api).await;
    let fetches = api.summary_fetches();
    let mut draft = ExpenseDraft::new("12,50", " Pizza ", "");

    splitter.submit(&mut draft).await.expect("submit");

    let sent = api.expenses.lock().expect("log").clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].amount, rust_decimal::Decimal::new(125, 1));
    assert_eq!(sent[0].notes, "Pizza");
    assert_eq!(sent[0].weight, rust_decimal::Decimal::ONE);
    assert_eq!(sent[0].user_id, UserId::new("user_1"));
    assert_eq!(draft, ExpenseDraft::default());
    assert_eq!(api.summary_fetches(), fetches + 1);
    assert!(!splitter.is_submitting().await);
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_server() {
    let api = Arc::new(FakeEventApi::new(json!({})));
    let splitter = splitter(&api).await;
    let mut events = splitter.ctx.subscribe_events();
    let mut draft = ExpenseDraft::new("0", "x", "");

    let err = splitter.submit(&mut draft).await.expect_err("invalid");

    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::InvalidAmount)
    ));
    assert!(api.expenses.lock().expect("log").is_empty());
    assert_eq!(draft.amount, "0");
    match events.try_recv().expect("notice") {
        DashboardEvent::Notice { feature, notice } => {
            assert_eq!(feature, Feature::Expenses);
            assert_eq!(notice.severity, NoticeSeverity::Inline);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn rejected_expense_keeps_the_draft() {
    let api = Arc::new(FakeEventApi::new(ledger()));
    let splitter = splitter(&api).await;
    api.fail_writes(Some(Failure::Status(500)));
    let mut draft = ExpenseDraft::new("5", "Snacks", "0.5");

    let err = splitter.submit(&mut draft).await.expect_err("server failure");

    assert!(matches!(err, ClientError::Server { .. }));
    assert!(err.notice().retryable);
    assert_eq!(draft.notes, "Snacks");
    assert_eq!(splitter.ledger().await.items.len(), 2);
    assert!(!splitter.is_submitting().await);
}
