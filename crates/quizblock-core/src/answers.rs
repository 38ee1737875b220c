//! Learner answers keyed by question position.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::AnswerValue;

/// At most one answer per position; a later write replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerStore {
    entries: BTreeMap<usize, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `position`, returning the answer it replaced.
    pub fn record(&mut self, position: usize, value: AnswerValue) -> Option<AnswerValue> {
        self.entries.insert(position, value)
    }

    pub fn get(&self, position: usize) -> Option<&AnswerValue> {
        self.entries.get(&position)
    }

    pub fn has_answer(&self, position: usize) -> bool {
        self.entries.contains_key(&position)
    }

    /// Selected option id at `position`, if the answer there is a choice.
    pub fn choice(&self, position: usize) -> Option<&str> {
        match self.entries.get(&position) {
            Some(AnswerValue::Choice(id)) => Some(id),
            _ => None,
        }
    }

    /// Free text at `position`, if the answer there is text.
    pub fn text(&self, position: usize) -> Option<&str> {
        match self.entries.get(&position) {
            Some(AnswerValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AnswerValue)> {
        self.entries.iter().map(|(p, v)| (*p, v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
