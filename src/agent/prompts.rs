//! Prompt text for the orchestrator, the coach fallback and session commands.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_STYLE: &str = "Text like a friend who roasts. Mean, direct, no filter.";

pub const FALLBACK_COACH_PROMPT: &str = "You are Spark, a proactive coach.\n\
Read memory/spark/protocol.md to understand how to behave.\n\
If that file doesn't exist, be helpful and concise.";

pub const INTRO_MESSAGE: &str = "heyy i'm spark\n\n\
here to help u get stuff done without the stress\n\n\
things i can do:\n\
/schedule - plan ur day\n\
/checkin - quick check in\n\
/startup - morning kickoff\n\
/midcheck - how's it going\n\
/wrapup - end of day reflection\n\
/focus - pick one thing\n\
/clear - fresh start\n\n\
or just msg me";

const ORCHESTRATOR_PROMPT: &str = r#"You're Spark - the accountability friend who actually knows this person.

## Your tools

You have `workspace_read` to read their notes. USE IT. Don't guess, actually read.
The context lists the files you must read before deciding.

If the recent conversation says plans changed, trust the conversation over the files.

## Step 1: infer before you act

Form a hypothesis about what they are doing right now: sleeping, in deep work,
busy with life, slacking, stuck, or unclear. Raw silence time is not meaningful
silence time. Factor in sleep and normal routines.

## Step 2: check what you already said

Read the recent conversation. Never repeat a message or an angle you already used.

## Step 3: decide

- Doing something important: don't interrupt.
- Probably slacking: hold them accountable, that's your job.
- Might be stuck: check in helpfully.
- Not sure: a gentle check beats an aggressive assumption.
- An agreed deadline that hasn't passed yet means should_message is false.

## Style
- {style}
- Text like a real friend, not a bot
- Reference their specific context

## Output format

Think out loud briefly (situation, deadline check, angles already used, fresh
angle, decision), then end with exactly one JSON object:

{"should_message": true/false, "hypothesis": "your read on their state", "message": "your message or null"}

The message must be a single string; use \n for line breaks.{format_hint}"#;

/// System prompt for one orchestrator turn.
pub fn orchestrator_prompt(style: &str, format_hint: &str) -> String {
    let style = if style.trim().is_empty() {
        DEFAULT_STYLE
    } else {
        style.trim()
    };
    ORCHESTRATOR_PROMPT
        .replace("{style}", style)
        .replace("{format_hint}", format_hint)
}

/// Canned session flows run through the coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Startup,
    Midcheck,
    Wrapup,
    Focus,
    Schedule,
    Checkin,
}

impl SessionCommand {
    pub const ALL: [Self; 6] = [
        Self::Startup,
        Self::Midcheck,
        Self::Wrapup,
        Self::Focus,
        Self::Schedule,
        Self::Checkin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Midcheck => "midcheck",
            Self::Wrapup => "wrapup",
            Self::Focus => "focus",
            Self::Schedule => "schedule",
            Self::Checkin => "checkin",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::Startup => {
                "Session startup.\n\n\
                 1. Read core context: the user profile, now.md and the most recent daily file.\n\
                 2. Output a brief summary: today's priorities, open threads, current focus or mood.\n\
                 3. Ask: \"What would you like to focus on today?\"\n\n\
                 Keep it concise. 3-5 bullet points max."
            }
            Self::Midcheck => {
                "Mid-session check.\n\n\
                 1. Check the focus set earlier today and read today's daily file if it exists.\n\
                 2. Ask how it's going and whether anything is blocking them.\n\
                 3. Based on the answer, offer to log progress, adjust focus, or take a break.\n\n\
                 Keep it casual and brief."
            }
            Self::Wrapup => {
                "Session wrapup.\n\n\
                 1. Read today's daily file: what got done, what is still open.\n\
                 2. Ask what went well and what carries over to tomorrow.\n\
                 3. Append a wrapup section with a summary to today's daily file.\n\
                 4. Ask for thoughts on tomorrow's focus.\n\n\
                 Concise but meaningful."
            }
            Self::Focus => {
                "Help set today's focus.\n\n\
                 1. Check now.md and what happened yesterday.\n\
                 2. Ask: \"What's the ONE thing you want to focus on today?\"\n\
                 3. Once decided, write the focus to today's daily file and offer a concrete first step.\n\n\
                 One focus, one next step."
            }
            Self::Schedule => {
                "Help plan today's schedule.\n\n\
                 1. Check the current time with current_time.\n\
                 2. Ask what they want to accomplish today.\n\
                 3. Build a realistic schedule: 90-120 min deep work blocks, 15 min breaks, lunch, buffer.\n\
                 4. Write it to today's daily file (memory/timeline/daily/YYYY-MM-DD.md) as:\n\n\
                 ## Schedule\n\n\
                 - [ ] 09:00 - 10:30 | Task\n\
                 - [ ] 10:30 - 10:45 | Break\n\n\
                 ## Check-ins\n\n\
                 5. Confirm the plan and ask for adjustments."
            }
            Self::Checkin => {
                "Quick check-in.\n\n\
                 1. Get the current time and today's schedule.\n\
                 2. Ask: \"How's it going? Any blockers?\"\n\
                 3. Done: mark the block complete. Stuck: offer specific help. Need time: adjust the schedule.\n\
                 4. Append the check-in under ## Check-ins in today's daily file as `HH:MM | what they said`.\n\
                 5. Say what's next on the schedule.\n\n\
                 Brief and supportive."
            }
        }
    }
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| format!("Unknown command: {name}"))
    }
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_prompt_fills_placeholders() {
        let prompt = orchestrator_prompt("", "\n\nHINT");
        assert!(prompt.contains(DEFAULT_STYLE));
        assert!(prompt.ends_with("HINT"));
        assert!(!prompt.contains("{style}"));
        assert!(prompt.contains(r#"{"should_message": true/false"#));

        assert!(orchestrator_prompt("supportive coach", "").contains("- supportive coach"));
    }

    #[test]
    fn session_commands_parse_by_name() {
        assert_eq!("Wrapup".parse(), Ok(SessionCommand::Wrapup));
        assert!("dance".parse::<SessionCommand>().is_err());
        for command in SessionCommand::ALL {
            assert!(!command.prompt().is_empty());
            assert_eq!(command.name().parse(), Ok(command));
        }
        assert_eq!(SessionCommand::Checkin.to_string(), "/checkin");
    }
}
