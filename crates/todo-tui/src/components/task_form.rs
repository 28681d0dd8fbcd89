use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use todo_core::CreateTask;

/// What a key press did to the form.
#[derive(Debug, PartialEq, Eq)]
pub enum FormAction {
    None,
    Cancel,
    Submit(CreateTask),
}

/// Single-line input for new task titles.
#[derive(Debug, Default)]
pub struct TaskForm {
    input: String,
    submitting: bool,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if self.submitting && key.code != KeyCode::Esc {
            return FormAction::None;
        }
        match key.code {
            KeyCode::Esc => FormAction::Cancel,
            KeyCode::Enter => match self.submit() {
                Some(create) => FormAction::Submit(create),
                None => FormAction::None,
            },
            KeyCode::Backspace => {
                self.input.pop();
                FormAction::None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                FormAction::None
            }
            _ => FormAction::None,
        }
    }

    /// Validate and lock the form. `None` when the title is blank or a
    /// submission is already running.
    pub fn submit(&mut self) -> Option<CreateTask> {
        if self.submitting {
            return None;
        }
        let create = CreateTask::new(&self.input).ok()?;
        self.submitting = true;
        Some(create)
    }

    /// Unlock after the create request settles. The input is only cleared on
    /// success so a failed title can be resubmitted.
    pub fn finish(&mut self, success: bool) {
        self.submitting = false;
        if success {
            self.input.clear();
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let border = if focused { Color::Cyan } else { Color::DarkGray };
        let title = if self.submitting {
            " Adding... "
        } else {
            " New task "
        };
        let body = if self.input.is_empty() && !focused {
            Line::from(Span::styled(
                "Press n to add a task",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(self.input.as_str())
        };
        let paragraph = Paragraph::new(body).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(form: &mut TaskForm, code: KeyCode) -> FormAction {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(form: &mut TaskForm, s: &str) {
        for c in s.chars() {
            press(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_and_backspace_edit_input() {
        let mut form = TaskForm::new();
        type_str(&mut form, "abc");
        press(&mut form, KeyCode::Backspace);
        assert_eq!(form.input(), "ab");
    }

    #[test]
    fn enter_submits_trimmed_title() {
        let mut form = TaskForm::new();
        type_str(&mut form, "  Buy milk ");
        let action = press(&mut form, KeyCode::Enter);
        assert_eq!(
            action,
            FormAction::Submit(CreateTask {
                title: "Buy milk".into()
            })
        );
        assert!(form.is_submitting());
    }

    #[test]
    fn blank_title_does_not_submit() {
        let mut form = TaskForm::new();
        type_str(&mut form, "   ");
        assert_eq!(press(&mut form, KeyCode::Enter), FormAction::None);
        assert!(!form.is_submitting());
    }

    #[test]
    fn second_submit_is_ignored_while_submitting() {
        let mut form = TaskForm::new();
        type_str(&mut form, "x");
        assert!(form.submit().is_some());
        assert!(form.submit().is_none());
    }

    #[test]
    fn success_clears_input_failure_keeps_it() {
        let mut form = TaskForm::new();
        type_str(&mut form, "x");
        form.submit();
        form.finish(false);
        assert_eq!(form.input(), "x");
        assert!(!form.is_submitting());

        form.submit();
        form.finish(true);
        assert_eq!(form.input(), "");
    }

    #[test]
    fn input_is_locked_while_submitting() {
        let mut form = TaskForm::new();
        type_str(&mut form, "x");
        press(&mut form, KeyCode::Enter);
        type_str(&mut form, "yz");
        press(&mut form, KeyCode::Backspace);
        assert_eq!(form.input(), "x");
        assert_eq!(press(&mut form, KeyCode::Enter), FormAction::None);
    }

    #[test]
    fn esc_cancels() {
        let mut form = TaskForm::new();
        assert_eq!(press(&mut form, KeyCode::Esc), FormAction::Cancel);
    }
}
