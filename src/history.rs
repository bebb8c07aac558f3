//! Bounded most-recent-first transaction logs.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{TransactionEvent, TransactionKind};

/// Default number of retained events per category.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Categories with their own history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HistoryCategory {
    Payment,
    OfferCreate,
}

impl HistoryCategory {
    /// History category for a transaction kind; `Other` is not logged.
    pub fn from_kind(kind: TransactionKind) -> Option<Self> {
        match kind {
            TransactionKind::Payment => Some(Self::Payment),
            TransactionKind::OfferCreate => Some(Self::OfferCreate),
            TransactionKind::Other => None,
        }
    }

    pub fn all() -> [HistoryCategory; 2] {
        [Self::Payment, Self::OfferCreate]
    }
}

/// Two fixed-capacity logs, newest first. Pushing past capacity evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    payments: VecDeque<Arc<TransactionEvent>>,
    offers: VecDeque<Arc<TransactionEvent>>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            payments: VecDeque::with_capacity(capacity + 1),
            offers: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn log(&self, category: HistoryCategory) -> &VecDeque<Arc<TransactionEvent>> {
        match category {
            HistoryCategory::Payment => &self.payments,
            HistoryCategory::OfferCreate => &self.offers,
        }
    }

    fn log_mut(&mut self, category: HistoryCategory) -> &mut VecDeque<Arc<TransactionEvent>> {
        match category {
            HistoryCategory::Payment => &mut self.payments,
            HistoryCategory::OfferCreate => &mut self.offers,
        }
    }

    /// Prepend an event, evicting the oldest one when over capacity.
    pub fn push(&mut self, category: HistoryCategory, event: Arc<TransactionEvent>) {
        let capacity = self.capacity;
        let log = self.log_mut(category);
        log.push_front(event);
        while log.len() > capacity {
            log.pop_back();
        }
    }

    /// Current contents, most recent first.
    pub fn snapshot(&self, category: HistoryCategory) -> Vec<Arc<TransactionEvent>> {
        self.log(category).iter().cloned().collect()
    }

    pub fn iter(&self, category: HistoryCategory) -> impl Iterator<Item = &TransactionEvent> {
        self.log(category).iter().map(|event| event.as_ref())
    }

    /// Events of both categories, payments first.
    pub fn iter_all(&self) -> impl Iterator<Item = &TransactionEvent> {
        self.iter(HistoryCategory::Payment)
            .chain(self.iter(HistoryCategory::OfferCreate))
    }

    pub fn len(&self, category: HistoryCategory) -> usize {
        self.log(category).len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty() && self.offers.is_empty()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(hash: &str) -> Arc<TransactionEvent> {
        let mut event = TransactionEvent::new(TransactionKind::Payment);
        event.hash = Some(hash.to_string());
        Arc::new(event)
    }

    fn hashes(buffer: &HistoryBuffer, category: HistoryCategory) -> Vec<String> {
        buffer
            .iter(category)
            .map(|e| e.hash.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_most_recent_first() {
        let mut buffer = HistoryBuffer::with_capacity(5);
        for hash in ["a", "b", "c"] {
            buffer.push(HistoryCategory::Payment, payment(hash));
        }
        assert_eq!(hashes(&buffer, HistoryCategory::Payment), vec!["c", "b", "a"]);
        assert_eq!(buffer.len(HistoryCategory::OfferCreate), 0);
    }

    #[test]
    fn test_bounded_to_last_capacity_pushes() {
        let capacity = 4;
        for pushes in [0usize, 1, 4, 5, 23] {
            let mut buffer = HistoryBuffer::with_capacity(capacity);
            for i in 0..pushes {
                buffer.push(HistoryCategory::Payment, payment(&i.to_string()));
            }

            assert_eq!(buffer.len(HistoryCategory::Payment), pushes.min(capacity));

            let expected: Vec<String> = (0..pushes)
                .rev()
                .take(capacity)
                .map(|i| i.to_string())
                .collect();
            assert_eq!(hashes(&buffer, HistoryCategory::Payment), expected);
        }
    }

    #[test]
    fn test_categories_are_independent() {
        let mut buffer = HistoryBuffer::with_capacity(2);
        buffer.push(HistoryCategory::Payment, payment("p1"));
        for i in 0..5 {
            let mut offer = TransactionEvent::new(TransactionKind::OfferCreate);
            offer.hash = Some(format!("o{}", i));
            buffer.push(HistoryCategory::OfferCreate, Arc::new(offer));
        }

        assert_eq!(hashes(&buffer, HistoryCategory::Payment), vec!["p1"]);
        assert_eq!(hashes(&buffer, HistoryCategory::OfferCreate), vec!["o4", "o3"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut buffer = HistoryBuffer::with_capacity(3);
        buffer.push(HistoryCategory::Payment, payment("a"));
        let snapshot = buffer.snapshot(HistoryCategory::Payment);

        buffer.push(HistoryCategory::Payment, payment("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(HistoryCategory::Payment), 2);
    }

    #[test]
    fn test_other_has_no_category() {
        assert_eq!(HistoryCategory::from_kind(TransactionKind::Other), None);
        assert_eq!(
            HistoryCategory::from_kind(TransactionKind::OfferCreate),
            Some(HistoryCategory::OfferCreate)
        );
    }
}
