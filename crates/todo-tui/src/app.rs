use std::future::Future;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use todo_core::{Task, TaskCounts, UserProfile};
use todo_service::{ServiceError, TaskApi};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::components::task_form::{FormAction, TaskForm};
use crate::components::task_list::{InFlightKind, TaskListView};
use crate::controller::{LoadState, PageController};

/// What the app is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// List navigation
    Normal,
    /// Typing a new task title
    NewTask,
}

/// Why the event loop should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    /// Clear the stored session, then exit.
    SignOut,
}

/// Completion of a request issued by the app, delivered on the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    Fetched(Result<Vec<Task>, ServiceError>),
    Created(Result<Task, ServiceError>),
    Toggled {
        id: String,
        result: Result<Task, ServiceError>,
    },
    Deleted {
        id: String,
        result: Result<(), ServiceError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Toggle,
    Delete,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Toggle => "update",
            Mutation::Delete => "delete",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Mutation::Create => "Failed to add task.",
            Mutation::Toggle => "Failed to update task.",
            Mutation::Delete => "Failed to delete task.",
        }
    }

    fn success_message(self) -> Option<&'static str> {
        match self {
            Mutation::Create => Some("Task added"),
            Mutation::Toggle => None,
            Mutation::Delete => Some("Task deleted"),
        }
    }
}

/// Result of a create/update/delete, reported through `App::complete`.
#[derive(Debug)]
pub struct MutationOutcome {
    pub mutation: Mutation,
    pub task_id: Option<String>,
    pub result: Result<(), ServiceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One-line message shown in the status bar until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }
}

pub struct App {
    api: Arc<dyn TaskApi>,
    profile: Option<UserProfile>,
    runtime: Handle,
    /// Cancelled when the app shuts down; every spawned request observes it.
    cancel: CancellationToken,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    /// Spawned requests whose event has not been handled yet.
    outstanding: usize,
    controller: PageController,
    list: TaskListView,
    form: TaskForm,
    mode: Mode,
    notice: Option<Notice>,
    outcome: Option<Outcome>,
}

impl App {
    /// Build the page for an authenticated session and start the first load.
    pub fn new(api: Arc<dyn TaskApi>, profile: Option<UserProfile>, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let mut app = Self {
            api,
            profile,
            runtime,
            cancel: CancellationToken::new(),
            events_tx,
            events_rx,
            outstanding: 0,
            controller: PageController::new(),
            list: TaskListView::new(),
            form: TaskForm::new(),
            mode: Mode::Normal,
            notice: None,
            outcome: None,
        };
        app.refresh();
        app
    }

    // -- Accessors --

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_input_mode(&self) -> bool {
        self.mode == Mode::NewTask
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        self.controller.tasks()
    }

    pub fn load_state(&self) -> LoadState {
        self.controller.state()
    }

    pub fn counts(&self) -> TaskCounts {
        self.controller.counts()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.list.selected_task(self.controller.tasks())
    }

    pub fn is_toggling(&self, id: &str) -> bool {
        self.list.is_in_flight(InFlightKind::Toggle, id)
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.list.is_in_flight(InFlightKind::Delete, id)
    }

    pub fn form_input(&self) -> &str {
        self.form.input()
    }

    pub fn is_submitting(&self) -> bool {
        self.form.is_submitting()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // -- Requests --

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        self.outstanding += 1;
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                event = request => {
                    // The receiver is gone once the app is dropped.
                    let _ = tx.send(event);
                }
            }
        });
    }

    /// Re-fetch the full collection. Clears the load error.
    pub fn refresh(&mut self) {
        if self.is_shut_down() {
            return;
        }
        debug!("fetching tasks");
        self.controller.begin_fetch();
        let api = Arc::clone(&self.api);
        self.spawn(async move { AppEvent::Fetched(api.list().await) });
    }

    /// Row actions are only available while the list is on screen.
    fn rows_visible(&self) -> bool {
        !self.controller.is_loading()
    }

    fn toggle_selected(&mut self) {
        if !self.rows_visible() {
            return;
        }
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        if !self.list.begin(InFlightKind::Toggle, &task.id) {
            return;
        }
        let api = Arc::clone(&self.api);
        let update = task.toggle_update();
        self.spawn(async move {
            let result = api.update(&task.id, &update).await;
            AppEvent::Toggled {
                id: task.id,
                result,
            }
        });
    }

    fn delete_selected(&mut self) {
        if !self.rows_visible() {
            return;
        }
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        if !self.list.begin(InFlightKind::Delete, &id) {
            return;
        }
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete(&id).await;
            AppEvent::Deleted { id, result }
        });
    }

    fn submit_form(&mut self, create: todo_core::CreateTask) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { AppEvent::Created(api.create(&create).await) });
    }

    // -- Events --

    /// Apply a request completion. Ignored once the app has shut down.
    pub fn handle_event(&mut self, event: AppEvent) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.is_shut_down() {
            debug!("dropping late event after shutdown");
            return;
        }

        match event {
            AppEvent::Fetched(result) => {
                if let Err(ref e) = result {
                    error!("failed to load tasks: {e}");
                }
                self.controller.finish_fetch(result);
                self.list.sync(self.controller.tasks());
            }
            AppEvent::Created(result) => {
                let ok = result.is_ok();
                self.form.finish(ok);
                if ok && self.mode == Mode::NewTask {
                    self.mode = Mode::Normal;
                }
                self.complete(MutationOutcome {
                    mutation: Mutation::Create,
                    task_id: result.as_ref().ok().map(|t| t.id.clone()),
                    result: result.map(|_| ()),
                });
            }
            AppEvent::Toggled { id, result } => {
                self.list.finish(InFlightKind::Toggle, &id);
                self.complete(MutationOutcome {
                    mutation: Mutation::Toggle,
                    task_id: Some(id),
                    result: result.map(|_| ()),
                });
            }
            AppEvent::Deleted { id, result } => {
                self.list.finish(InFlightKind::Delete, &id);
                self.complete(MutationOutcome {
                    mutation: Mutation::Delete,
                    task_id: Some(id),
                    result,
                });
            }
        }
    }

    /// Single reporting point for mutations: success re-fetches, failure is
    /// logged and shown as a notice. The collection is never patched locally.
    fn complete(&mut self, outcome: MutationOutcome) {
        match outcome.result {
            Ok(()) => {
                if let Some(msg) = outcome.mutation.success_message() {
                    self.notice = Some(Notice::info(msg));
                }
                self.refresh();
            }
            Err(e) => {
                error!(
                    task_id = outcome.task_id.as_deref().unwrap_or("-"),
                    "failed to {} task: {e}",
                    outcome.mutation.verb()
                );
                self.notice = Some(Notice::error(outcome.mutation.failure_message()));
            }
        }
    }

    /// Drain completed requests without blocking. Returns true if any were
    /// applied.
    pub fn pump(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied = true;
        }
        applied
    }

    /// Block until no request is outstanding, including re-fetches triggered
    /// along the way. Returns false on timeout.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false
                }
            }
        }
        true
    }

    /// Cancel every outstanding request. Results that still arrive are
    /// dropped.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.outstanding = 0;
    }

    // -- Keys --

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.outcome = Some(Outcome::Quit);
            return;
        }
        self.notice = None;

        match self.mode {
            Mode::Normal => self.handle_normal(key),
            Mode::NewTask => match self.form.handle_key(key) {
                FormAction::None => {}
                FormAction::Cancel => self.mode = Mode::Normal,
                FormAction::Submit(create) => self.submit_form(create),
            },
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.outcome = Some(Outcome::Quit),
            KeyCode::Char('S') => self.outcome = Some(Outcome::SignOut),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('n') | KeyCode::Char('a') => self.mode = Mode::NewTask,
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            _ => self.list.handle_key(key, self.controller.tasks()),
        }
    }

    // -- Rendering --

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let banner_height = if self.controller.error().is_some() { 4 } else { 0 };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(banner_height),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, layout[0]);
        self.form
            .render(frame, layout[1], self.mode == Mode::NewTask);
        if let Some(msg) = self.controller.error() {
            render_error_banner(frame, msg, layout[2]);
        }
        if self.controller.is_loading() {
            let loading = Paragraph::new("Loading tasks...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, layout[3]);
        } else {
            self.list.render(frame, self.controller.tasks(), layout[3]);
        }
        let footer = Line::from(Span::styled(
            self.counts().to_string(),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(footer, layout[4]);
        self.render_status_bar(frame, layout[5]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut title = vec![Span::styled(
            " Todo App ",
            Style::default().bold().fg(Color::Cyan),
        )];
        if let Some(ref profile) = self.profile {
            title.push(Span::raw("| "));
            title.push(Span::styled(
                format!("Signed in as {}", profile.email),
                Style::default().fg(Color::Yellow),
            ));
        }
        let lines = vec![
            Line::from(title),
            Line::from(Span::styled(
                " Manage your tasks efficiently",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref notice) = self.notice {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            let line = Line::from(Span::styled(
                format!(" {}", notice.message),
                Style::default().fg(color),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints: &[(&str, &str)] = match self.mode {
            Mode::Normal => &[
                ("q", "quit"),
                ("j/k", "move"),
                ("n", "new"),
                ("space", "toggle"),
                ("d", "delete"),
                ("r", "refresh"),
                ("S", "sign out"),
            ],
            Mode::NewTask => &[("Enter", "add"), ("Esc", "cancel")],
        };

        let spans: Vec<Span> = hints
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!(" {key}"),
                        Style::default().fg(Color::Yellow).bold(),
                    ),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn render_error_banner(frame: &mut Frame, message: &str, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(vec![
            Span::styled("[r]", Style::default().fg(Color::Yellow).bold()),
            Span::styled(" Try again", Style::default().fg(Color::Red)),
        ]),
    ];
    let banner = Paragraph::new(lines).block(
        Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(banner, area);
}
