//! Task list

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{AppError, Result};

/// A single task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

/// In-memory task list
pub struct TaskList {
    next_id: AtomicU64,
    items: RwLock<Vec<TaskItem>>,
}

impl TaskList {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            items: RwLock::new(Vec::new()),
        }
    }

    /// Add a task; whitespace-only text is rejected
    pub fn add(&self, text: &str) -> Result<TaskItem> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("Task text is empty".to_string()));
        }

        let task = TaskItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            text: text.to_string(),
            completed: false,
        };
        self.items.write().push(task.clone());
        Ok(task)
    }

    /// Toggle completion state
    pub fn toggle(&self, id: u64) -> Result<TaskItem> {
        let mut items = self.items.write();
        match items.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                Ok(task.clone())
            }
            None => Err(AppError::NotFound(format!("Task {}", id))),
        }
    }

    /// All tasks in insertion order
    pub fn list(&self) -> Vec<TaskItem> {
        self.items.read().clone()
    }
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_list() {
        let tasks = TaskList::new();
        let a = tasks.add("review merge request").unwrap();
        let b = tasks.add("  water the plants  ").unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.text, "water the plants");

        let list = tasks.list();
        assert_eq!(list.len(), 2);
        assert!(!list[0].completed);
    }

    #[test]
    fn test_empty_text_rejected() {
        let tasks = TaskList::new();
        assert!(tasks.add("   ").is_err());
        assert!(tasks.list().is_empty());
    }

    #[test]
    fn test_toggle() {
        let tasks = TaskList::new();
        let task = tasks.add("stretch").unwrap();

        assert!(tasks.toggle(task.id).unwrap().completed);
        assert!(!tasks.toggle(task.id).unwrap().completed);
    }

    #[test]
    fn test_toggle_unknown_id() {
        let tasks = TaskList::new();
        assert!(matches!(tasks.toggle(99), Err(AppError::NotFound(_))));
    }
}
