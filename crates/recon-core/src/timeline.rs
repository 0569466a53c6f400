//! Versioned "as-of" history of patient-level facts.
//!
//! Patient-level history (social, surgical, family history, ...) is captured
//! once per reviewing contact as an append-only log of snapshot rows. A
//! `HistoryTimeline` is that log in true chronological order.
//!
//! The only way to build a timeline is [`HistoryTimeline::from_unordered`],
//! which sorts. Database row order is not stable across re-exports, so no
//! constructor accepts a sequence that is merely assumed to be ordered.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Serialize;
use std::cmp::Ordering;

use crate::ids::Csn;

/// One versioned capture of a patient-level fact.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct HistorySnapshot<T> {
    /// The snapshot's own contact.
    pub csn: Csn,
    /// The clinical contact during which this snapshot was reviewed or
    /// edited, when it differs from the snapshot's own contact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_csn: Option<Csn>,
    pub contact_date: NaiveDate,
    pub payload: T,
}

impl<T> HistorySnapshot<T> {
    /// Whether this snapshot belongs to `csn`, either as its own contact or
    /// as the contact it was reviewed during.
    #[must_use]
    pub fn matches_contact(&self, csn: Csn) -> bool {
        self.csn == csn || self.reviewed_csn == Some(csn)
    }

    /// Chronological order: contact date, ties broken by the snapshot's own
    /// numeric CSN.
    fn chronological(&self, other: &Self) -> Ordering {
        self.contact_date
            .cmp(&other.contact_date)
            .then_with(|| self.csn.cmp(&other.csn))
    }
}

/// Chronologically ordered snapshots of one fact type for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct HistoryTimeline<T> {
    snapshots: Vec<HistorySnapshot<T>>,
}

impl<T> Default for HistoryTimeline<T> {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }
}

impl<T> HistoryTimeline<T> {
    /// Build a timeline from snapshots in any order.
    ///
    /// The sort is stable, so two snapshots sharing both date and CSN keep
    /// their relative input order.
    #[must_use]
    pub fn from_unordered(mut snapshots: Vec<HistorySnapshot<T>>) -> Self {
        snapshots.sort_by(HistorySnapshot::chronological);
        Self { snapshots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistorySnapshot<T>> {
        self.snapshots.iter()
    }

    /// The chronologically first snapshot: the baseline every later
    /// snapshot is compared against.
    #[must_use]
    pub fn baseline(&self) -> Option<&HistorySnapshot<T>> {
        self.snapshots.first()
    }

    /// Payload of the chronologically last snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.latest_snapshot().map(|s| &s.payload)
    }

    #[must_use]
    pub fn latest_snapshot(&self) -> Option<&HistorySnapshot<T>> {
        self.snapshots.last()
    }

    /// The snapshot recorded for, or reviewed during, contact `csn`.
    ///
    /// If several snapshots match, the chronologically latest one wins.
    #[must_use]
    pub fn as_of_encounter(&self, csn: Csn) -> Option<&HistorySnapshot<T>> {
        self.snapshots.iter().rev().find(|s| s.matches_contact(csn))
    }

    /// The latest snapshot dated on or before `date`.
    #[must_use]
    pub fn as_of_date(&self, date: NaiveDate) -> Option<&HistorySnapshot<T>> {
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.contact_date <= date)
    }

    /// Collapse runs of snapshots whose meaningful content is unchanged.
    ///
    /// `same` compares a snapshot's payload with the last kept one. The
    /// baseline is always kept. This is a view for display; the timeline
    /// itself is untouched.
    pub fn collapse_unchanged<F>(&self, mut same: F) -> Vec<&HistorySnapshot<T>>
    where
        F: FnMut(&T, &T) -> bool,
    {
        let mut kept: Vec<&HistorySnapshot<T>> = Vec::with_capacity(self.snapshots.len());
        for snapshot in &self.snapshots {
            match kept.last() {
                Some(prev) if same(&prev.payload, &snapshot.payload) => {}
                _ => kept.push(snapshot),
            }
        }
        kept
    }

    /// Transform every payload while keeping order.
    #[must_use]
    pub fn map<U, F>(self, mut f: F) -> HistoryTimeline<U>
    where
        F: FnMut(T) -> U,
    {
        HistoryTimeline {
            snapshots: self
                .snapshots
                .into_iter()
                .map(|s| HistorySnapshot {
                    csn: s.csn,
                    reviewed_csn: s.reviewed_csn,
                    contact_date: s.contact_date,
                    payload: f(s.payload),
                })
                .collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a HistoryTimeline<T> {
    type Item = &'a HistorySnapshot<T>;
    type IntoIter = std::slice::Iter<'a, HistorySnapshot<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
