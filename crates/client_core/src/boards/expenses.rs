use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{BoardContext, DashboardEvent, Feature};
use crate::{
    balance::{BalanceLine, BalancePresenter},
    drafts::ExpenseDraft,
    error::ClientError,
    ordering::sort_newest_first,
    summary::{normalize_summary, EventSummary, Expense, ExpenseLedger},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseView {
    pub expense: Expense,
    pub amount_text: String,
}

#[derive(Debug, Default)]
struct ExpenseBoardState {
    ledger: ExpenseLedger,
    submitting: bool,
}

/// Shared expenses and per-participant balances. Balances are computed by
/// the server; new expenses only show up after the next refresh.
pub struct ExpenseSplitter {
    ctx: BoardContext,
    presenter: BalancePresenter,
    state: Mutex<ExpenseBoardState>,
}

impl ExpenseSplitter {
    pub fn new(ctx: BoardContext, presenter: BalancePresenter) -> Self {
        Self {
            ctx,
            presenter,
            state: Mutex::new(ExpenseBoardState::default()),
        }
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let payload = self.ctx.api.fetch_summary(&self.ctx.event_id).await?;
        self.apply_summary(&normalize_summary(payload)).await;
        Ok(())
    }

    pub async fn apply_summary(&self, summary: &EventSummary) {
        self.state.lock().await.ledger = summary.expenses.clone();
        self.ctx.publish(DashboardEvent::SummaryRefreshed {
            feature: Feature::Expenses,
        });
    }

    /// Validates and records the draft, clearing it once the server has
    /// accepted it.
    pub async fn submit(&self, draft: &mut ExpenseDraft) -> Result<(), ClientError> {
        let valid = {
            let mut state = self.state.lock().await;
            let valid = draft
                .validate(state.submitting)
                .map_err(|err| self.fail(err.into()))?;
            state.submitting = true;
            valid
        };

        let request = valid.into_request(self.ctx.user_id.clone());
        let result = self.ctx.api.add_expense(&self.ctx.event_id, &request).await;
        self.state.lock().await.submitting = false;

        if let Err(err) = result {
            warn!(error = %err, "adding expense failed");
            return Err(self.fail(err));
        }
        info!(amount = %request.amount, weight = %request.weight, "expense recorded");
        draft.clear();
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "refresh after adding expense failed");
            self.ctx.notify(Feature::Expenses, err.notice());
        }
        Ok(())
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.submitting
    }

    pub fn presenter(&self) -> &BalancePresenter {
        &self.presenter
    }

    pub async fn ledger(&self) -> ExpenseLedger {
        self.state.lock().await.ledger.clone()
    }

    /// Expenses newest first.
    pub async fn expenses(&self) -> Vec<ExpenseView> {
        let mut items = self.state.lock().await.ledger.items.clone();
        sort_newest_first(&mut items);
        items
            .into_iter()
            .map(|expense| ExpenseView {
                amount_text: self.presenter.currency().format(expense.amount),
                expense,
            })
            .collect()
    }

    pub async fn balances(&self) -> Vec<BalanceLine> {
        let state = self.state.lock().await;
        self.presenter.lines(&state.ledger.balances)
    }

    pub async fn total_text(&self) -> String {
        let total = self.state.lock().await.ledger.total;
        self.presenter.currency().format(total)
    }

    fn fail(&self, err: ClientError) -> ClientError {
        self.ctx.notify(Feature::Expenses, err.notice());
        err
    }
}

#[cfg(test)]
#[path = "../tests/expenses_tests.rs"]
mod tests;
