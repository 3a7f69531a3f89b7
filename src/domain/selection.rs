//! Ticket selections and their merge invariant.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A single selection (event outcome) on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Identifier of the sport event.
    pub event_id: String,
    /// Identifier of the selected outcome within the event.
    pub id: String,
    /// Odds for the selection, in the trading engine's fixed-point format.
    pub odds: i64,
    /// Promotionally boosted odds, when offered.
    pub boosted_odds: Option<i64>,
    /// Whether the selection is a banker in system bets.
    pub is_banker: bool,
}

impl Selection {
    pub fn new(
        event_id: impl Into<String>,
        id: impl Into<String>,
        odds: i64,
        is_banker: bool,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            id: id.into(),
            odds,
            boosted_odds: None,
            is_banker,
        }
    }

    /// Set boosted odds on the selection.
    #[must_use]
    pub fn with_boosted_odds(mut self, boosted_odds: i64) -> Self {
        self.boosted_odds = Some(boosted_odds);
        self
    }

    /// Whether `other` targets the same (event, outcome) pair.
    fn same_key(&self, other: &Self) -> bool {
        self.event_id == other.event_id && self.id == other.id
    }

    /// Whether `other` is field-identical in odds, boosted odds and banker flag.
    fn same_terms(&self, other: &Self) -> bool {
        self.odds == other.odds
            && self.boosted_odds == other.boosted_odds
            && self.is_banker == other.is_banker
    }
}

/// Accumulates the selections of one ticket, enforcing the merge invariant.
///
/// No two entries may share `(event_id, id)` unless they are field-identical;
/// an identical duplicate is absorbed (idempotent add), a conflicting one is
/// rejected. Insertion order is preserved because it is significant for
/// downstream serialization.
#[derive(Debug, Clone, Default)]
pub struct SelectionAggregator {
    selections: Vec<Selection>,
}

impl SelectionAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selection, absorbing identical duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ConflictingSelection`] when an existing
    /// entry shares the `(event_id, id)` key but differs in odds, boosted
    /// odds or the banker flag.
    pub fn add(&mut self, selection: Selection) -> Result<(), ValidationError> {
        if let Some(existing) = self.selections.iter().find(|s| s.same_key(&selection)) {
            if existing.same_terms(&selection) {
                return Ok(());
            }
            return Err(ValidationError::ConflictingSelection {
                event_id: selection.event_id,
                id: selection.id,
            });
        }
        self.selections.push(selection);
        Ok(())
    }

    /// Accumulated selections in insertion order.
    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Consume the aggregator, yielding the selections in insertion order.
    #[must_use]
    pub fn into_selections(self) -> Vec<Selection> {
        self.selections
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}
