//! Reminder list and its capabilities

use super::{optional_str, required_str, required_u64, Capability};
use crate::clock::Clock;
use crate::types::{payload, ToolArgs, ToolResult};
use crate::{PawpalError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// A single reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Sequential id, starting at 1
    pub id: u64,
    /// What to do
    pub title: String,
    /// When, as given by the user
    pub time: String,
    /// Optional detail
    pub description: String,
    /// Creation time (RFC 3339)
    pub created_at: String,
    /// Whether it has been completed
    pub completed: bool,
}

/// Mutex-guarded reminder list
#[derive(Debug, Default)]
pub struct ReminderBook {
    reminders: Mutex<Vec<Reminder>>,
}

impl ReminderBook {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Vec<Reminder>>> {
        self.reminders
            .lock()
            .map_err(|_| PawpalError::poisoned("reminders"))
    }

    /// Append a reminder and return it
    pub fn add(
        &self,
        title: &str,
        time: &str,
        description: &str,
        now: DateTime<Local>,
    ) -> Result<Reminder> {
        let mut reminders = self.guard()?;
        let reminder = Reminder {
            id: reminders.len() as u64 + 1,
            title: title.to_string(),
            time: time.to_string(),
            description: description.to_string(),
            created_at: now.to_rfc3339(),
            completed: false,
        };
        reminders.push(reminder.clone());
        Ok(reminder)
    }

    /// Reminders not yet completed, in creation order
    pub fn pending(&self) -> Result<Vec<Reminder>> {
        Ok(self
            .guard()?
            .iter()
            .filter(|r| !r.completed)
            .cloned()
            .collect())
    }

    /// Mark `id` completed; `None` when there is no such reminder
    pub fn complete(&self, id: u64) -> Result<Option<Reminder>> {
        let mut reminders = self.guard()?;
        Ok(reminders.iter_mut().find(|r| r.id == id).map(|r| {
            r.completed = true;
            r.clone()
        }))
    }
}

/// `add_reminder{title, time, description?}`
pub struct AddReminderCapability {
    book: Arc<ReminderBook>,
    clock: Arc<dyn Clock>,
}

impl AddReminderCapability {
    /// Create over a shared book
    pub fn new(book: Arc<ReminderBook>, clock: Arc<dyn Clock>) -> Self {
        Self { book, clock }
    }
}

impl Capability for AddReminderCapability {
    fn name(&self) -> &str {
        "add_reminder"
    }

    fn description(&self) -> &str {
        "Add a reminder with a title and time"
    }

    fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let title = required_str(args, "title")?;
        let time = required_str(args, "time")?;
        let description = optional_str(args, "description")?.unwrap_or_default();

        let reminder = self.book.add(title, time, description, self.clock.now())?;
        let message = format!("已添加提醒：{}，时间：{}", reminder.title, reminder.time);
        Ok(ToolResult::ok(payload(serde_json::to_value(&reminder)?), message))
    }
}

/// `get_reminders`
pub struct GetRemindersCapability {
    book: Arc<ReminderBook>,
}

impl GetRemindersCapability {
    /// Create over a shared book
    pub fn new(book: Arc<ReminderBook>) -> Self {
        Self { book }
    }
}

impl Capability for GetRemindersCapability {
    fn name(&self) -> &str {
        "get_reminders"
    }

    fn description(&self) -> &str {
        "List reminders that are not completed"
    }

    fn execute(&self, _args: &ToolArgs) -> Result<ToolResult> {
        let pending = self.book.pending()?;
        let message = format!("您有{}个待办提醒", pending.len());
        Ok(ToolResult::ok(payload(json!({ "reminders": pending })), message))
    }
}

/// `complete_reminder{id}`
pub struct CompleteReminderCapability {
    book: Arc<ReminderBook>,
}

impl CompleteReminderCapability {
    /// Create over a shared book
    pub fn new(book: Arc<ReminderBook>) -> Self {
        Self { book }
    }
}

impl Capability for CompleteReminderCapability {
    fn name(&self) -> &str {
        "complete_reminder"
    }

    fn description(&self) -> &str {
        "Mark a reminder as completed"
    }

    fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let id = required_u64(args, "id")?;
        match self.book.complete(id)? {
            Some(reminder) => {
                let message = format!("已完成提醒：{}", reminder.title);
                Ok(ToolResult::ok(payload(serde_json::to_value(&reminder)?), message))
            }
            None => Ok(ToolResult::failure("未找到指定提醒")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[test]
    fn test_ids_are_sequential() {
        let book = ReminderBook::new();
        let first = book.add("a", "9:00", "", Local::now()).unwrap();
        let second = book.add("b", "10:00", "", Local::now()).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_completed_are_hidden() {
        let book = Arc::new(ReminderBook::new());
        book.add("a", "9:00", "", Local::now()).unwrap();
        book.add("b", "10:00", "", Local::now()).unwrap();

        let complete = CompleteReminderCapability::new(book.clone());
        let result = complete.execute(&payload(json!({"id": 1}))).unwrap();
        assert!(result.success);
        assert_eq!(result.message, "已完成提醒：a");

        let list = GetRemindersCapability::new(book)
            .execute(&ToolArgs::new())
            .unwrap();
        let pending = list.data["reminders"].as_array().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["title"], json!("b"));
        assert_eq!(list.message, "您有1个待办提醒");
    }

    #[test]
    fn test_complete_unknown_id() {
        let complete = CompleteReminderCapability::new(Arc::new(ReminderBook::new()));
        let result = complete.execute(&payload(json!({"id": 42}))).unwrap();
        assert!(!result.success);
    }

    #[test]
    fn test_add_requires_title_and_time() {
        let add = AddReminderCapability::new(Arc::new(ReminderBook::new()), Arc::new(SystemClock));
        assert!(add.execute(&payload(json!({"time": "9:00"}))).is_err());
        assert!(add.execute(&payload(json!({"title": "喝水"}))).is_err());

        let result = add
            .execute(&payload(json!({"title": "喝水", "time": "9:00", "description": "一杯"})))
            .unwrap();
        assert_eq!(result.text("description"), Some("一杯"));
        assert_eq!(result.message, "已添加提醒：喝水，时间：9:00");
    }
}
