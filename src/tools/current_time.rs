use super::traits::{Tool, ToolFuture};
use super::types::ToolResult;
use chrono::{DateTime, Local, TimeZone};
use serde_json::json;

/// Local wall-clock time, so the model never has to guess the date.
pub struct CurrentTimeTool;

pub(crate) fn describe_time<Tz: TimeZone>(now: &DateTime<Tz>) -> serde_json::Value
where
    Tz::Offset: std::fmt::Display,
{
    json!({
        "datetime": now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "date": now.format("%Y-%m-%d").to_string(),
        "time": now.format("%H:%M").to_string(),
        "weekday": now.format("%A").to_string(),
    })
}

impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current local date, time and weekday."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn execute(&self, _args: serde_json::Value) -> ToolFuture<'_> {
        Box::pin(async move { Ok(ToolResult::ok(describe_time(&Local::now()).to_string())) })
    }
}
