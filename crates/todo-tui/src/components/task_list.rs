use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use todo_core::Task;

pub const EMPTY_PLACEHOLDER: &str = "No tasks yet. Add one above to get started!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlightKind {
    Toggle,
    Delete,
}

/// Ids with a request outstanding, per operation kind.
#[derive(Debug, Default)]
struct InFlight {
    toggling: HashSet<String>,
    deleting: HashSet<String>,
}

impl InFlight {
    fn set(&mut self, kind: InFlightKind) -> &mut HashSet<String> {
        match kind {
            InFlightKind::Toggle => &mut self.toggling,
            InFlightKind::Delete => &mut self.deleting,
        }
    }

    fn contains(&self, kind: InFlightKind, id: &str) -> bool {
        match kind {
            InFlightKind::Toggle => self.toggling.contains(id),
            InFlightKind::Delete => self.deleting.contains(id),
        }
    }
}

/// Row selection and per-row request state for the task list.
///
/// The tasks themselves are borrowed from the page controller on every call.
pub struct TaskListView {
    list_state: ListState,
    selected_id: Option<String>,
    in_flight: InFlight,
}

impl Default for TaskListView {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskListView {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
            selected_id: None,
            in_flight: InFlight::default(),
        }
    }

    /// Returns the currently highlighted task, if any.
    pub fn selected_task<'a>(&self, tasks: &'a [Task]) -> Option<&'a Task> {
        tasks.get(self.list_state.selected()?)
    }

    /// Re-anchor the selection after the collection was replaced: stay on the
    /// same task id when it still exists, otherwise keep the row index within
    /// bounds.
    pub fn sync(&mut self, tasks: &[Task]) {
        if tasks.is_empty() {
            self.list_state.select(None);
            self.selected_id = None;
            return;
        }
        let by_id = self
            .selected_id
            .as_deref()
            .and_then(|id| tasks.iter().position(|t| t.id == id));
        let idx = match by_id {
            Some(idx) => idx,
            None => self
                .list_state
                .selected()
                .unwrap_or(0)
                .min(tasks.len() - 1),
        };
        self.select(tasks, idx);
    }

    fn select(&mut self, tasks: &[Task], idx: usize) {
        self.list_state.select(Some(idx));
        self.selected_id = tasks.get(idx).map(|t| t.id.clone());
    }

    /// Mark `id` as having a request of `kind` outstanding. Returns `false`
    /// when one is already outstanding, in which case the control is disabled
    /// and nothing should be sent.
    pub fn begin(&mut self, kind: InFlightKind, id: &str) -> bool {
        self.in_flight.set(kind).insert(id.to_string())
    }

    pub fn finish(&mut self, kind: InFlightKind, id: &str) {
        self.in_flight.set(kind).remove(id);
    }

    pub fn is_in_flight(&self, kind: InFlightKind, id: &str) -> bool {
        self.in_flight.contains(kind, id)
    }

    pub fn handle_key(&mut self, key: KeyEvent, tasks: &[Task]) {
        if tasks.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if current + 1 < tasks.len() {
                    self.select(tasks, current + 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if current > 0 {
                    self.select(tasks, current - 1);
                }
            }
            // Jump to first/last
            KeyCode::Char('g') | KeyCode::Home => self.select(tasks, 0),
            KeyCode::Char('G') | KeyCode::End => self.select(tasks, tasks.len() - 1),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, tasks: &[Task], area: Rect) {
        let block = Block::default()
            .title(" Tasks ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if tasks.is_empty() {
            let placeholder = Paragraph::new(EMPTY_PLACEHOLDER)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let items: Vec<ListItem> = tasks.iter().map(|task| self.row(task)).collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn row<'a>(&self, task: &'a Task) -> ListItem<'a> {
        let toggling = self.is_in_flight(InFlightKind::Toggle, &task.id);
        let deleting = self.is_in_flight(InFlightKind::Delete, &task.id);

        let checkbox = match (toggling, task.completed) {
            (true, _) => Span::styled("[~] ", Style::default().fg(Color::Yellow)),
            (false, true) => Span::styled("[x] ", Style::default().fg(Color::Green)),
            (false, false) => Span::raw("[ ] "),
        };
        let title_style = if task.completed {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default()
        };

        let mut spans = vec![checkbox, Span::styled(task.title.as_str(), title_style)];
        if deleting {
            spans.push(Span::styled(
                "  Deleting...",
                Style::default().fg(Color::Red),
            ));
        }
        ListItem::new(Line::from(spans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn make_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: format!("Task {id}"),
            completed: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter().map(|id| make_task(id)).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn empty_list_has_no_selection() {
        let mut view = TaskListView::new();
        view.sync(&[]);
        assert!(view.selected_task(&[]).is_none());
    }

    #[test]
    fn sync_selects_first_row() {
        let t = tasks(&["a", "b"]);
        let mut view = TaskListView::new();
        view.sync(&t);
        assert_eq!(view.selected_task(&t).unwrap().id, "a");
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let t = tasks(&["a", "b", "c"]);
        let mut view = TaskListView::new();
        view.sync(&t);

        view.handle_key(key(KeyCode::Char('k')), &t);
        assert_eq!(view.selected_task(&t).unwrap().id, "a");

        view.handle_key(key(KeyCode::Char('G')), &t);
        assert_eq!(view.selected_task(&t).unwrap().id, "c");

        view.handle_key(key(KeyCode::Down), &t);
        assert_eq!(view.selected_task(&t).unwrap().id, "c");

        view.handle_key(key(KeyCode::Char('g')), &t);
        view.handle_key(key(KeyCode::Char('j')), &t);
        assert_eq!(view.selected_task(&t).unwrap().id, "b");
    }

    #[test]
    fn sync_follows_task_id_across_reorder() {
        let mut view = TaskListView::new();
        let before = tasks(&["a", "b", "c"]);
        view.sync(&before);
        view.handle_key(key(KeyCode::Char('j')), &before);

        let after = tasks(&["c", "a", "b"]);
        view.sync(&after);
        assert_eq!(view.selected_task(&after).unwrap().id, "b");
    }

    #[test]
    fn sync_clamps_when_selected_task_disappears() {
        let mut view = TaskListView::new();
        let before = tasks(&["a", "b", "c"]);
        view.sync(&before);
        view.handle_key(key(KeyCode::Char('G')), &before);

        let after = tasks(&["a"]);
        view.sync(&after);
        assert_eq!(view.selected_task(&after).unwrap().id, "a");
    }

    #[test]
    fn in_flight_is_tracked_per_row() {
        let mut view = TaskListView::new();
        assert!(view.begin(InFlightKind::Toggle, "a"));
        assert!(view.begin(InFlightKind::Toggle, "b"));
        assert!(view.is_in_flight(InFlightKind::Toggle, "a"));
        assert!(view.is_in_flight(InFlightKind::Toggle, "b"));

        view.finish(InFlightKind::Toggle, "a");
        assert!(!view.is_in_flight(InFlightKind::Toggle, "a"));
        assert!(view.is_in_flight(InFlightKind::Toggle, "b"));
    }

    #[test]
    fn second_request_on_same_row_is_refused() {
        let mut view = TaskListView::new();
        assert!(view.begin(InFlightKind::Delete, "a"));
        assert!(!view.begin(InFlightKind::Delete, "a"));
        // Kinds are independent.
        assert!(view.begin(InFlightKind::Toggle, "a"));
    }
}
