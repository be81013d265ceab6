use super::history::HistoryEntry;
use crate::config::PersonaConfig;
use crate::providers::MessageRole;
use crate::state::PersistedState;
use chrono::{DateTime, Days, Local, Utc};
use std::fmt::Write;

/// Conversation lines shown to the orchestrator
pub const RECENT_LINES: usize = 10;

/// Profile note for the correspondent: `memory/<name>.md`, or
/// `memory/profile.md` when no name is configured.
pub fn profile_path(persona: &PersonaConfig) -> String {
    let name = persona.user_name.trim();
    if name.is_empty() {
        "memory/profile.md".to_string()
    } else {
        format!("memory/{name}.md")
    }
}

pub fn daily_path(date: chrono::NaiveDate) -> String {
    format!("memory/timeline/daily/{}.md", date.format("%Y-%m-%d"))
}

/// Minimal context for one orchestrator turn; the model reads the rest
/// through tools.
pub fn build_tick_context(
    persona: &PersonaConfig,
    recent: &[HistoryEntry],
    state: &PersistedState,
    now: DateTime<Local>,
) -> String {
    let mut sections = vec![format!("User: {}", persona.summary())];

    if recent.is_empty() {
        sections.push("Recent conversation: None yet today".to_string());
    } else {
        let mut convo =
            String::from("Recent conversation (today) - CHECK THIS TO AVOID REPEATING YOURSELF:");
        for entry in recent {
            let speaker = match entry.role {
                MessageRole::Assistant => "Spark",
                MessageRole::User => persona.display_name(),
            };
            let _ = write!(convo, "\n- {speaker}: {}", entry.content);
        }
        sections.push(convo);
    }

    let today = now.date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    sections.push(format!(
        "Current time: {} ({})",
        now.format("%Y-%m-%dT%H:%M:%S"),
        now.format("%A")
    ));
    sections.push(format!("Today's date: {}", today.format("%Y-%m-%d")));
    sections.push(format!("Yesterday's date: {}", yesterday.format("%Y-%m-%d")));

    let now_utc: DateTime<Utc> = now.with_timezone(&Utc);
    sections.push(match state.minutes_since_interaction(now_utc) {
        Some(minutes) => format!("Last user reply: {minutes} min ago"),
        None => "Last user reply: None (never replied)".to_string(),
    });
    sections.push(format!(
        "Unanswered proactive messages: {}",
        state.unanswered_count
    ));
    if let Some(stuck) = &state.stuck_on {
        sections.push(format!("User previously stuck on: {stuck}"));
    }
    if let Some(focus) = &state.current_focus {
        sections.push(format!("Today's focus: {focus}"));
    }

    sections.push(format!(
        "FILES TO READ (use workspace_read):\n\
         - {} <- MUST READ. Their profile, patterns, guilt triggers.\n\
         - memory/spark/protocol.md <- Your personality\n\
         - memory/spark/learned.md <- What you've learned\n\
         - {} <- Today's plan\n\
         - {} <- Yesterday\n\
         - memory/timeline/perspective.md <- Their goals",
        profile_path(persona),
        daily_path(today),
        daily_path(yesterday),
    ));

    sections.join("\n\n")
}

pub fn tick_user_message(context: &str) -> String {
    format!(
        "Context:\n\n{context}\n\n\
         First, use workspace_read to read the profile and other relevant files. \
         Then decide if you should send a message."
    )
}
