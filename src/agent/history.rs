use crate::providers::{MessageRole, ProviderMessage};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

/// Today's conversation, shared by the coach and proactive outreach.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
    day: Option<NaiveDate>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) {
        self.entries.push(HistoryEntry {
            role,
            content: content.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }

    /// Drops everything; returns how many entries were cleared.
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        self.day = None;
        cleared
    }

    /// Start fresh when the local date changes.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) {
        if self.day == Some(today) {
            return;
        }
        if let Some(previous) = self.day {
            tracing::info!(%previous, %today, "new day, clearing conversation history");
        }
        self.entries.clear();
        self.day = Some(today);
    }

    pub fn provider_messages(&self) -> Vec<ProviderMessage> {
        self.entries
            .iter()
            .map(|entry| match entry.role {
                MessageRole::User => ProviderMessage::user(entry.content.clone()),
                MessageRole::Assistant => ProviderMessage::assistant(entry.content.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn resets_only_when_the_date_changes() {
        let mut history = ConversationHistory::new();
        history.reset_if_new_day(day(19));
        history.push(MessageRole::User, "[09:00] gm");
        history.reset_if_new_day(day(19));
        assert_eq!(history.len(), 1);

        history.reset_if_new_day(day(20));
        assert!(history.is_empty());
    }

    #[test]
    fn recent_is_a_tail_window() {
        let mut history = ConversationHistory::new();
        for i in 0..5 {
            history.push(MessageRole::User, format!("m{i}"));
        }
        let tail: Vec<&str> = history.recent(2).iter().map(|e| e.content.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(history.recent(10).len(), 5);
        assert_eq!(history.clear(), 5);
        assert_eq!(history.provider_messages().len(), 0);
    }
}
