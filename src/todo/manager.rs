//! The to-do engine: owns the task collection and writes it through to
//! the key-value store after every mutation.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use ulid::Ulid;

use crate::clock::{Clock, DayWindow, DAY_MS};
use crate::config::TodosConfig;
use crate::error::{Error, Result};
use crate::storage::{self, KeyValueStore};
use crate::todo::model::{
    normalize_repeat, ReconcileReport, RepeatInterval, TodoEdit, TodoFilter, TodoItem, TodoStats,
    ToggleOutcome,
};
use crate::todo::recurrence;

/// In-memory task collection backed by a [`KeyValueStore`].
///
/// Unknown ids are never errors: the affected operation returns `None` and
/// leaves the store untouched. If a write fails, the collection is rolled
/// back to its state before the operation and the error is returned.
#[derive(Debug)]
pub struct TodoManager<S, C> {
    store: S,
    clock: C,
    config: TodosConfig,
    todos: Vec<TodoItem>,
    filter: TodoFilter,
}

impl<S: KeyValueStore, C: Clock> TodoManager<S, C> {
    pub fn new(store: S, clock: C, config: TodosConfig) -> Self {
        let filter = config.default_filter;
        Self {
            store,
            clock,
            config,
            todos: Vec::new(),
            filter,
        }
    }

    pub fn config(&self) -> &TodosConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Load the collection and catch up missed occurrences.
    pub fn init(&mut self) -> Result<ReconcileReport> {
        self.load()?;
        self.reconcile()
    }

    /// Replace the in-memory collection with the stored one (empty if the
    /// key was never written).
    pub fn load(&mut self) -> Result<()> {
        let todos: Option<Vec<TodoItem>> =
            storage::load_json(&self.store, &self.config.storage_key)?;
        self.todos = todos.unwrap_or_default();
        tracing::debug!(
            key = %self.config.storage_key,
            count = self.todos.len(),
            "loaded todos"
        );
        Ok(())
    }

    /// Every task, in insertion order
    pub fn todos(&self) -> &[TodoItem] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&TodoItem> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn current_filter(&self) -> TodoFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: TodoFilter) {
        self.filter = filter;
    }

    /// Tasks of the currently selected filter tab
    pub fn current_view(&self) -> Vec<&TodoItem> {
        self.filtered(self.filter)
    }

    pub fn day_window(&self) -> DayWindow {
        DayWindow::containing(&self.clock.now())
    }

    pub fn filtered(&self, filter: TodoFilter) -> Vec<&TodoItem> {
        let window = self.day_window();
        let mut view: Vec<&TodoItem> = self
            .todos
            .iter()
            .filter(|todo| in_view(todo, filter, &window))
            .collect();

        match filter {
            TodoFilter::Today => view.sort_by(|left, right| match (left.due_date, right.due_date) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => right.created_at.cmp(&left.created_at),
            }),
            TodoFilter::Upcoming => view.sort_by_key(|todo| todo.due_date),
            TodoFilter::Completed => view.sort_by(|left, right| right.updated_at.cmp(&left.updated_at)),
        }
        view
    }

    pub fn stats(&self) -> TodoStats {
        let window = self.day_window();
        let mut stats = TodoStats {
            total: self.todos.len(),
            ..TodoStats::default()
        };
        for todo in &self.todos {
            if todo.completed {
                stats.completed += 1;
                continue;
            }
            match todo.due_date {
                None => stats.today += 1,
                Some(due) if window.contains(due) => stats.today += 1,
                Some(due) if due >= window.end => stats.upcoming += 1,
                Some(_) => stats.overdue += 1,
            }
        }
        stats
    }

    /// Append a new task. Returns `None` without touching the store if
    /// `text` is blank.
    pub fn add_task(
        &mut self,
        text: &str,
        due_date: Option<DateTime<Utc>>,
        repeat_interval: RepeatInterval,
        custom_repeat_days: Option<u32>,
    ) -> Result<Option<TodoItem>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let custom_repeat_days = normalize_repeat(repeat_interval, custom_repeat_days)?;

        let now = self.clock.now_utc();
        let todo = TodoItem {
            id: self.fresh_id(&HashSet::new()),
            text: text.to_string(),
            completed: false,
            created_at: now,
            updated_at: now,
            due_date,
            repeat_interval,
            custom_repeat_days,
            last_completed_date: None,
        };

        self.mutate(|todos| {
            todos.push(todo.clone());
            Ok(())
        })?;
        tracing::debug!(id = %todo.id, repeat = %todo.repeat_interval, "todo added");
        Ok(Some(todo))
    }

    /// Flip completion. Completing a repeating task stamps
    /// `last_completed_date` and appends its next occurrence.
    pub fn toggle_complete(&mut self, id: &str) -> Result<Option<ToggleOutcome>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let now = self.clock.now_utc();
        let tz = self.clock.now().timezone();
        let next_id = self.fresh_id(&HashSet::new());

        let outcome = self.mutate(|todos| {
            let todo = &mut todos[index];
            todo.completed = !todo.completed;
            todo.updated_at = now;

            let mut next = None;
            if todo.completed && todo.is_repeating() {
                todo.last_completed_date = Some(now);
                next = recurrence::next_occurrence(todo, next_id, now, &tz);
            }
            let task = todo.clone();
            if let Some(next) = &next {
                todos.push(next.clone());
            }
            Ok(ToggleOutcome { task, next })
        })?;

        if let Some(next) = &outcome.next {
            tracing::debug!(
                parent = %outcome.task.id,
                id = %next.id,
                due = ?next.due_date,
                "generated next occurrence"
            );
        }
        Ok(Some(outcome))
    }

    /// Change text, due date or repeat rule of a task. Never generates an
    /// occurrence.
    pub fn edit_task(&mut self, id: &str, edit: TodoEdit) -> Result<Option<TodoItem>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        if let Some(text) = &edit.text {
            if text.trim().is_empty() {
                return Err(Error::InvalidArgument("text cannot be empty".to_string()));
            }
        }
        let repeat = match edit.repeat {
            Some((interval, days)) => Some((interval, normalize_repeat(interval, days)?)),
            None => None,
        };

        let now = self.clock.now_utc();
        let updated = self.mutate(|todos| {
            let todo = &mut todos[index];
            if let Some(text) = edit.text {
                todo.text = text;
            }
            if let Some(due_date) = edit.due_date {
                todo.due_date = due_date;
            }
            if let Some((interval, days)) = repeat {
                todo.repeat_interval = interval;
                todo.custom_repeat_days = days;
            }
            todo.updated_at = now;
            Ok(todo.clone())
        })?;
        Ok(Some(updated))
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Option<TodoItem>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        let removed = self.mutate(|todos| Ok(todos.remove(index)))?;
        tracing::debug!(id = %removed.id, "todo deleted");
        Ok(Some(removed))
    }

    /// Remove completed tasks last updated at least `days` days ago.
    ///
    /// Always writes the collection, even when nothing matched. An age
    /// reaching past the earliest representable instant matches nothing.
    pub fn clear_completed_older_than(&mut self, days: u32) -> Result<usize> {
        let cutoff = self
            .clock
            .now_utc()
            .checked_sub_signed(Duration::milliseconds(i64::from(days) * DAY_MS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.mutate(|todos| {
            let before = todos.len();
            todos.retain(|todo| !todo.completed || todo.updated_at > cutoff);
            Ok(before - todos.len())
        })?;
        tracing::debug!(removed, days, "cleared completed todos");
        Ok(removed)
    }

    /// [`Self::clear_completed_older_than`] with the configured age
    pub fn clear_completed(&mut self) -> Result<usize> {
        self.clear_completed_older_than(self.config.clear_after_days)
    }

    /// Regenerate the occurrence of every repeating task that was completed
    /// and whose due date has passed, unless an incomplete task with the
    /// same text already exists. Writes once if anything was added.
    pub fn reconcile(&mut self) -> Result<ReconcileReport> {
        let now = self.clock.now_utc();
        let tz = self.clock.now().timezone();

        let pending_texts: HashSet<&str> = self
            .todos
            .iter()
            .filter(|todo| !todo.completed)
            .map(|todo| todo.text.as_str())
            .collect();

        let mut taken: HashSet<String> = HashSet::new();
        let mut generated = Vec::new();
        for todo in &self.todos {
            let missed = todo.is_repeating()
                && todo.completed
                && todo.last_completed_date.is_some()
                && todo.due_date.is_some_and(|due| due < now);
            if !missed || pending_texts.contains(todo.text.as_str()) {
                continue;
            }
            let id = self.fresh_id(&taken);
            if let Some(next) = recurrence::next_occurrence(todo, id, now, &tz) {
                taken.insert(next.id.clone());
                generated.push(next);
            }
        }

        if generated.is_empty() {
            return Ok(ReconcileReport::default());
        }

        let batch = generated.clone();
        self.mutate(|todos| {
            todos.extend(batch);
            Ok(())
        })?;
        tracing::info!(count = generated.len(), "regenerated missed occurrences");
        Ok(ReconcileReport { generated })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id == id)
    }

    /// Id unused by the collection and by `reserved`
    fn fresh_id(&self, reserved: &HashSet<String>) -> String {
        loop {
            let id = format!(
                "{}-{}",
                self.config.id_prefix,
                Ulid::new().to_string().to_lowercase()
            );
            if !reserved.contains(&id) && self.position(&id).is_none() {
                return id;
            }
        }
    }

    /// Apply `change` to the collection and write it through. On any
    /// failure the previous collection is restored.
    fn mutate<T, F>(&mut self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<TodoItem>) -> Result<T>,
    {
        let snapshot = self.todos.clone();
        let result = change(&mut self.todos).and_then(|value| {
            storage::save_json(&self.store, &self.config.storage_key, &self.todos)?;
            Ok(value)
        });
        if let Err(err) = &result {
            tracing::warn!(error = %err, "persist failed; restoring previous todos");
            self.todos = snapshot;
        }
        result
    }
}

fn in_view(todo: &TodoItem, filter: TodoFilter, window: &DayWindow) -> bool {
    match filter {
        TodoFilter::Today => !todo.completed && todo.due_date.map_or(true, |due| window.contains(due)),
        TodoFilter::Upcoming => !todo.completed && todo.due_date.is_some_and(|due| due >= window.end),
        TodoFilter::Completed => todo.completed,
    }
}
