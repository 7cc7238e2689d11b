use std::collections::{BTreeMap, HashMap};

use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally(BTreeMap<String, u32>);

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts<K: Into<String>>(counts: impl IntoIterator<Item = (K, u32)>) -> Self {
        Self(counts.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn count(&self, category: &str) -> u32 {
        self.0.get(category).copied().unwrap_or(0)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    pub fn total(&self) -> u32 {
        self.0.values().fold(0u32, |acc, v| acc.saturating_add(*v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn increment(&mut self, category: &str) {
        let count = self.0.entry(category.to_string()).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn decrement(&mut self, category: &str) {
        if let Some(count) = self.0.get_mut(category) {
            *count = count.saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ballot {
    pub tally: Tally,
    pub selection: Option<String>,
}

impl Ballot {
    pub fn new(tally: Tally, selection: Option<String>) -> Self {
        Self { tally, selection }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackSnapshot {
    tally: Tally,
    selection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub ballot: Ballot,
    pub snapshot: RollbackSnapshot,
}

/// Prior selection loses one vote (floored at zero), `category` gains one.
pub fn apply(ballot: &Ballot, category: &str) -> Applied {
    let snapshot = RollbackSnapshot {
        tally: ballot.tally.clone(),
        selection: ballot.selection.clone(),
    };

    let mut tally = ballot.tally.clone();
    if let Some(prior) = ballot.selection.as_deref() {
        tally.decrement(prior);
    }
    tally.increment(category);

    Applied {
        ballot: Ballot {
            tally,
            selection: Some(category.to_string()),
        },
        snapshot,
    }
}

pub fn rollback(snapshot: RollbackSnapshot) -> Ballot {
    Ballot {
        tally: snapshot.tally,
        selection: snapshot.selection,
    }
}

#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct VoteTicket {
    group: String,
    category: String,
}

impl VoteTicket {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BeginVote {
    Started(VoteTicket),
    AlreadyInFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    Restored,
    /// A refresh replaced the ballot while the vote was pending.
    Superseded,
}

#[derive(Debug)]
struct PendingVote {
    snapshot: RollbackSnapshot,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct VoteReconciler {
    ballots: BTreeMap<String, Ballot>,
    pending: HashMap<String, PendingVote>,
    generation: u64,
}

impl VoteReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ballot(&self, group: &str) -> Option<&Ballot> {
        self.ballots.get(group)
    }

    pub fn is_in_flight(&self, group: &str) -> bool {
        self.pending.contains_key(group)
    }

    /// Selection the server has accepted for `group`. While a vote is
    /// pending this is the selection from before it.
    pub fn settled_selection(&self, group: &str) -> Option<&str> {
        match self.pending.get(group) {
            Some(pending) => pending.snapshot.selection.as_deref(),
            None => self
                .ballots
                .get(group)
                .and_then(|ballot| ballot.selection.as_deref()),
        }
    }

    pub fn track(&mut self, group: impl Into<String>, ballot: Ballot) {
        self.ballots.entry(group.into()).or_insert(ballot);
    }

    pub fn replace_all(&mut self, ballots: impl IntoIterator<Item = (String, Ballot)>) {
        self.ballots = ballots.into_iter().collect();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn begin(&mut self, group: &str, category: &str) -> Result<BeginVote, ValidationError> {
        if self.pending.contains_key(group) {
            return Ok(BeginVote::AlreadyInFlight);
        }

        let ballot = self
            .ballots
            .get_mut(group)
            .ok_or_else(|| ValidationError::UnknownVoteTarget(group.to_string()))?;
        if !ballot.tally.contains(category) {
            return Err(ValidationError::UnknownVoteCategory {
                target: group.to_string(),
                category: category.to_string(),
            });
        }

        let Applied {
            ballot: next,
            snapshot,
        } = apply(ballot, category);
        *ballot = next;

        self.pending.insert(
            group.to_string(),
            PendingVote {
                snapshot,
                generation: self.generation,
            },
        );

        Ok(BeginVote::Started(VoteTicket {
            group: group.to_string(),
            category: category.to_string(),
        }))
    }

    pub fn confirm(&mut self, ticket: VoteTicket) {
        self.pending.remove(&ticket.group);
        // counts may be stale after a refresh; the selection is not
        if let Some(ballot) = self.ballots.get_mut(&ticket.group) {
            ballot.selection = Some(ticket.category);
        }
    }

    pub fn abort(&mut self, ticket: VoteTicket) -> RollbackOutcome {
        let Some(pending) = self.pending.remove(&ticket.group) else {
            return RollbackOutcome::Superseded;
        };
        if pending.generation != self.generation {
            return RollbackOutcome::Superseded;
        }
        match self.ballots.get_mut(&ticket.group) {
            Some(ballot) => {
                *ballot = rollback(pending.snapshot);
                RollbackOutcome::Restored
            }
            None => RollbackOutcome::Superseded,
        }
    }
}

#[cfg(test)]
#[path = "tests/voting_tests.rs"]
mod tests;
