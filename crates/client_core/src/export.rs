//! Plain-text event report for sharing outside the app.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    analytics::{percentage, winning_choice},
    balance::BalancePresenter,
    summary::{EventSummary, Slot},
};

const HEAVY_RULE: &str = "=======================================";
const LIGHT_RULE: &str = "---------------------------------------";

/// Facts about the event that the summary payload does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub title: String,
    pub event_id: String,
    pub moderator: String,
    pub participant_count: usize,
    pub invite_link: String,
}

pub struct SummaryReport<'a> {
    summary: &'a EventSummary,
    header: &'a ReportHeader,
    presenter: &'a BalancePresenter,
}

impl<'a> SummaryReport<'a> {
    pub fn new(
        summary: &'a EventSummary,
        header: &'a ReportHeader,
        presenter: &'a BalancePresenter,
    ) -> Self {
        Self {
            summary,
            header,
            presenter,
        }
    }

    fn winning_slot(&self) -> Option<&'a Slot> {
        self.summary
            .winning_slot
            .as_ref()
            .or_else(|| self.summary.slots.iter().find(|slot| slot.is_winning))
    }

    fn write_slots(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "TIME SLOTS")?;
        let Some(slot) = self.winning_slot() else {
            return writeln!(f, "   No slots yet\n");
        };
        writeln!(f, "Winning slot:")?;
        match slot.start_time {
            Some(start) => writeln!(f, "   {}", start.format("%A, %d %B %Y"))?,
            None => writeln!(f, "   date not set")?,
        }
        writeln!(
            f,
            "   {} - {}",
            clock(slot.start_time),
            clock(slot.end_time)
        )?;
        writeln!(f, "   {} attending\n", slot.yes_votes)
    }

    fn write_poll(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "MEETING PLACE POLL")?;
        let Some(poll) = self.summary.poll.as_ref() else {
            return writeln!(f, "   No poll started yet\n");
        };
        let total = poll
            .choices
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.votes));
        let winner = winning_choice(&poll.choices).map(|c| &c.id);

        writeln!(f, "{}", poll.question)?;
        for choice in &poll.choices {
            let marker = if Some(&choice.id) == winner { "*" } else { "-" };
            writeln!(f, "   {marker} {}", choice.text)?;
            if !choice.location.is_empty() {
                writeln!(f, "      {}", choice.location)?;
            }
            writeln!(
                f,
                "      {} votes ({}%)",
                choice.votes,
                percentage(choice.votes, total)
            )?;
        }
        writeln!(f, "\n   Total: {total} votes\n")
    }

    fn write_expenses(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "EXPENSES")?;
        let ledger = &self.summary.expenses;
        if ledger.total <= Decimal::ZERO && ledger.items.is_empty() {
            return writeln!(f, "   No expenses yet");
        }
        let currency = self.presenter.currency();

        writeln!(f, "Total spent: {}\n", currency.format(ledger.total))?;
        writeln!(f, "   Items:")?;
        for item in &ledger.items {
            writeln!(f, "      - {}: {}", item.notes, currency.format(item.amount))?;
            if let Some(payer) = &item.payer {
                writeln!(f, "        (paid by {payer})")?;
            }
        }
        writeln!(f, "\n   Balances:")?;
        for line in self.presenter.lines(&ledger.balances) {
            writeln!(f, "      [{}] {}: {}", line.class.as_str(), line.participant, line.text)?;
        }
        Ok(())
    }
}

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header;
        writeln!(f, "{HEAVY_RULE}")?;
        writeln!(f, "       EVENT SUMMARY")?;
        writeln!(f, "{HEAVY_RULE}\n")?;
        writeln!(f, "Event: {}", header.title)?;
        writeln!(f, "ID: {}", header.event_id)?;
        writeln!(f, "Moderator: {}", header.moderator)?;
        writeln!(f, "Created: {}", timestamp(self.summary.event.created_at))?;
        writeln!(f, "Participants: {}\n", header.participant_count)?;

        self.write_slots(f)?;
        self.write_poll(f)?;
        self.write_expenses(f)?;

        writeln!(f, "\n{HEAVY_RULE}")?;
        writeln!(f, "Invite link: {}", header.invite_link)?;
        writeln!(f, "{HEAVY_RULE}")
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{LIGHT_RULE}")?;
    writeln!(f, "{title}")?;
    writeln!(f, "{LIGHT_RULE}")
}

fn clock(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string())
}

fn timestamp(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "unknown".to_string(),
        |t| t.format("%d.%m.%Y %H:%M UTC").to_string(),
    )
}

pub fn export_text(
    summary: &EventSummary,
    header: &ReportHeader,
    presenter: &BalancePresenter,
) -> String {
    SummaryReport::new(summary, header, presenter).to_string()
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
