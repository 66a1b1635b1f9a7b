//! Ordered todo list. Items live in an arena keyed by a stable [`TodoId`];
//! the wire actions address them by position, which is resolved against the
//! current order at call time.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TodoId(u64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "todo-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: TodoId,
    /// Envelope id of the `todo_add` that created the item.
    pub name: String,
    pub text: String,
    pub by: String,
    /// Unix epoch seconds.
    pub deadline: i64,
    pub done: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("todo index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown todo item {0}")]
    UnknownItem(TodoId),
}

#[derive(Debug, Default)]
pub struct TodoList {
    items: HashMap<TodoId, TodoItem>,
    order: Vec<TodoId>,
    next_id: u64,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        by: impl Into<String>,
        deadline: i64,
    ) -> TodoId {
        let id = TodoId(self.next_id);
        self.next_id += 1;
        self.items.insert(
            id,
            TodoItem {
                id,
                name: name.into(),
                text: text.into(),
                by: by.into(),
                deadline,
                done: false,
            },
        );
        self.order.push(id);
        id
    }

    /// Marks the item currently at `index` as done. Marking twice is a no-op.
    pub fn mark_done(&mut self, index: usize) -> Result<TodoId, TodoError> {
        let id = self.resolve(index)?;
        self.mark_done_by_id(id)?;
        Ok(id)
    }

    /// Removes the item at `index`; later items shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<TodoItem, TodoError> {
        let id = self.resolve(index)?;
        self.remove_by_id(id)
    }

    pub fn mark_done_by_id(&mut self, id: TodoId) -> Result<(), TodoError> {
        let item = self.items.get_mut(&id).ok_or(TodoError::UnknownItem(id))?;
        item.done = true;
        Ok(())
    }

    pub fn remove_by_id(&mut self, id: TodoId) -> Result<TodoItem, TodoError> {
        let item = self.items.remove(&id).ok_or(TodoError::UnknownItem(id))?;
        self.order.retain(|entry| *entry != id);
        Ok(item)
    }

    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.get(&id)
    }

    pub fn index_of(&self, id: TodoId) -> Option<usize> {
        self.order.iter().position(|entry| *entry == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TodoItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }

    fn resolve(&self, index: usize) -> Result<TodoId, TodoError> {
        self.order
            .get(index)
            .copied()
            .ok_or(TodoError::IndexOutOfRange {
                index,
                len: self.order.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(list: &TodoList) -> Vec<&str> {
        list.iter().map(|item| item.text.as_str()).collect()
    }

    #[test]
    fn add_then_done_then_delete() {
        let mut list = TodoList::new();
        list.add("t1", "Buy milk", "alice", 1_700_000_000);
        list.add("t2", "Call Bob", "bob", 1_700_100_000);

        list.mark_done(0).unwrap();
        let done: Vec<_> = list.iter().map(|item| item.done).collect();
        assert_eq!(done, [true, false]);

        let removed = list.remove(0).unwrap();
        assert_eq!(removed.name, "t1");
        assert_eq!(texts(&list), ["Call Bob"]);
    }

    #[test]
    fn index_equal_to_len_is_out_of_range() {
        let mut list = TodoList::new();
        list.add("a", "one", "", 0);
        assert_eq!(
            list.mark_done(1),
            Err(TodoError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            list.remove(1).unwrap_err(),
            TodoError::IndexOutOfRange { index: 1, len: 1 }
        );
        assert_eq!(texts(&list), ["one"]);
        assert!(!list.iter().any(|item| item.done));
    }

    #[test]
    fn indices_are_resolved_after_earlier_deletes() {
        let mut list = TodoList::new();
        list.add("a", "a", "", 0);
        list.add("b", "b", "", 0);
        list.add("c", "c", "", 0);

        list.remove(0).unwrap();
        let id = list.mark_done(0).unwrap();
        assert_eq!(list.get(id).map(|item| item.text.as_str()), Some("b"));
        assert!(!list.iter().any(|item| item.text == "c" && item.done));
    }

    #[test]
    fn identity_and_index_views_agree() {
        let mut list = TodoList::new();
        let a = list.add("a", "a", "", 0);
        let b = list.add("b", "b", "", 0);
        let c = list.add("c", "c", "", 0);
        let d = list.add("d", "d", "", 0);

        list.remove_by_id(b).unwrap();
        list.remove(1).unwrap();
        assert_eq!(list.index_of(a), Some(0));
        assert_eq!(list.index_of(c), None);
        assert_eq!(list.index_of(d), Some(1));

        list.mark_done(1).unwrap();
        assert!(list.get(d).unwrap().done);
        assert_eq!(list.mark_done_by_id(c), Err(TodoError::UnknownItem(c)));
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut list = TodoList::new();
        let first = list.add("x", "x", "", 0);
        list.clear();
        assert!(list.is_empty());
        let second = list.add("x", "x", "", 0);
        assert_ne!(first, second);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn marking_done_twice_is_harmless() {
        let mut list = TodoList::new();
        list.add("x", "x", "", 0);
        list.mark_done(0).unwrap();
        list.mark_done(0).unwrap();
        assert!(list.iter().all(|item| item.done));
    }
}
