use std::collections::HashMap;

/// In-memory answer state for one attempt: question id -> selected option
/// (1-based). Selecting again overwrites; there is no multi-select.
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    selections: HashMap<i64, i32>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, question_id: i64, option: i32) {
        self.selections.insert(question_id, option);
    }

    pub fn selected(&self, question_id: i64) -> Option<i32> {
        self.selections.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<i64, i32> {
        &self.selections
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reselection_overwrites_the_previous_choice() {
        let mut sheet = AnswerSheet::new();
        sheet.select(5, 1);
        sheet.select(5, 3);
        assert_eq!(sheet.selected(5), Some(3));
        assert_eq!(sheet.answered_count(), 1);
    }

    #[test]
    fn unanswered_questions_have_no_entry() {
        let sheet = AnswerSheet::new();
        assert!(sheet.is_empty());
        assert_eq!(sheet.selected(1), None);
    }
}
