use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::calculator::{Calculator, Field, QueryParams};
use crate::clipboard::{Copier, CopyOutcome};
use crate::config::AppConfig;

/// How long the copy confirmation stays on screen
pub const FEEDBACK_DURATION: Duration = Duration::from_secs(2);

pub const MSG_COPIED: &str = "✓ 복사되었습니다!";
pub const MSG_COPY_FAILED: &str = "복사 실패";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyFeedback {
    Copied,
    Failed,
}

impl CopyFeedback {
    pub fn message(self) -> &'static str {
        match self {
            CopyFeedback::Copied => MSG_COPIED,
            CopyFeedback::Failed => MSG_COPY_FAILED,
        }
    }
}

pub struct App {
    pub calculator: Calculator,
    pub focus: Field,
    pub popup: Popup,
    pub config: AppConfig,

    // Transient copy feedback (success clears itself after FEEDBACK_DURATION)
    pub copy_feedback: Option<CopyFeedback>,
    pub feedback_time: Option<Instant>,

    copier: Arc<Copier>,
    copy_tx: mpsc::UnboundedSender<(u64, CopyOutcome)>,
    copy_rx: mpsc::UnboundedReceiver<(u64, CopyOutcome)>,
    // Bumped on reset; outcomes of copies started before it are dropped
    reset_generation: u64,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let copier = Copier::from_config(&config.clipboard);
        Self::with_copier(config, copier)
    }

    pub fn with_copier(config: AppConfig, copier: Copier) -> Self {
        let (copy_tx, copy_rx) = mpsc::unbounded_channel();
        Self {
            calculator: Calculator::new(),
            focus: Field::Length,
            popup: Popup::None,
            config,
            copy_feedback: None,
            feedback_time: None,
            copier: Arc::new(copier),
            copy_tx,
            copy_rx,
            reset_generation: 0,
        }
    }

    /// One-time population from startup parameters
    pub fn hydrate(&mut self, params: &QueryParams) {
        self.calculator.hydrate(params);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup == Popup::Help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')
            ) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('u') {
                self.calculator.set_raw(self.focus, String::new());
            }
            return Ok(());
        }

        match key.code {
            // Field navigation
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),

            // Editing (same character set a number input accepts)
            KeyCode::Char(c) if is_number_char(c) => self.calculator.push_char(self.focus, c),
            KeyCode::Backspace | KeyCode::Delete => self.calculator.pop_char(self.focus),

            // Buttons
            KeyCode::Enter | KeyCode::Char('c') => {
                self.copy_result();
            }
            KeyCode::Char('r') => self.reset(),

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    /// Clear inputs, errors, result and copy feedback
    pub fn reset(&mut self) {
        self.calculator.reset();
        self.reset_generation += 1;
        self.copy_feedback = None;
        self.feedback_time = None;
    }

    /// Start a background copy of the current result.
    /// Returns false (and touches no clipboard) when there is no result.
    pub fn copy_result(&mut self) -> bool {
        let Some(text) = self.calculator.copy_text() else {
            return false;
        };

        tracing::info!("Copying {} to clipboard", text);
        let copier = Arc::clone(&self.copier);
        let tx = self.copy_tx.clone();
        let generation = self.reset_generation;
        tokio::spawn(async move {
            let outcome = copier.copy(text).await;
            let _ = tx.send((generation, outcome));
        });
        true
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        while let Ok((generation, outcome)) = self.copy_rx.try_recv() {
            if generation != self.reset_generation {
                tracing::debug!("Dropping copy outcome from before reset");
                continue;
            }
            self.apply_copy_outcome(outcome, now);
        }
        self.expire_feedback(now);
    }

    fn apply_copy_outcome(&mut self, outcome: CopyOutcome, now: Instant) {
        match outcome {
            CopyOutcome::Succeeded { backend } => {
                tracing::info!("Copied result using {} clipboard", backend);
                self.copy_feedback = Some(CopyFeedback::Copied);
                self.feedback_time = Some(now);
                if self.config.notifications {
                    let body = self.calculator.status_text();
                    if let Err(e) = notify("rubecalc", &body) {
                        tracing::warn!("Notification failed: {}", e);
                    }
                }
            }
            CopyOutcome::Failed => {
                // Stays until the next copy or reset
                self.copy_feedback = Some(CopyFeedback::Failed);
                self.feedback_time = None;
            }
        }
    }

    fn expire_feedback(&mut self, now: Instant) {
        if let Some(time) = self.feedback_time {
            if now.duration_since(time) >= FEEDBACK_DURATION {
                self.copy_feedback = None;
                self.feedback_time = None;
            }
        }
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+')
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("accessories-calculator")
        .show()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::ResultStatus;
    use crate::clipboard::tests::RecordingBackend;
    use std::sync::atomic::Ordering;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn test_app(succeed: bool) -> (App, Arc<std::sync::atomic::AtomicUsize>) {
        let backend = RecordingBackend::new("test", succeed);
        let calls = backend.calls.clone();
        let app = App::with_copier(AppConfig::default(), Copier::new(Box::new(backend), None));
        (app, calls)
    }

    fn fill(app: &mut App) {
        type_text(app, "10");
        press(app, KeyCode::Tab);
        type_text(app, "5");
        press(app, KeyCode::Tab);
        type_text(app, "20");
    }

    async fn wait_for_feedback(app: &mut App) {
        for _ in 0..200 {
            app.tick();
            if app.copy_feedback.is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("copy never finished");
    }

    #[test]
    fn test_typing_recomputes_each_key() {
        let (mut app, _) = test_app(true);
        fill(&mut app);
        assert_eq!(app.calculator.status_text(), "필요 루베: 10.00");

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.calculator.raw(Field::Thickness), "2");
        assert_eq!(app.calculator.status_text(), "필요 루베: 1.00");
    }

    #[test]
    fn test_non_numeric_keys_are_not_typed() {
        let (mut app, _) = test_app(true);
        type_text(&mut app, "1x2");
        assert_eq!(app.calculator.raw(Field::Length), "12");
    }

    #[test]
    fn test_focus_navigation() {
        let (mut app, _) = test_app(true);
        assert_eq!(app.focus, Field::Length);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.focus, Field::Width);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.focus, Field::Thickness);
    }

    #[test]
    fn test_ctrl_u_clears_focused_field() {
        let (mut app, _) = test_app(true);
        fill(&mut app);
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(app.calculator.raw(Field::Thickness), "");
        assert_eq!(app.calculator.raw(Field::Length), "10");
        assert_eq!(app.calculator.result(), None);
    }

    #[test]
    fn test_copy_without_result_is_noop() {
        let (mut app, calls) = test_app(true);
        type_text(&mut app, "10");
        assert!(!app.copy_result());
        press(&mut app, KeyCode::Enter);
        app.tick();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.copy_feedback, None);
    }

    #[tokio::test]
    async fn test_copy_success_shows_feedback() {
        let (mut app, calls) = test_app(true);
        fill(&mut app);
        press(&mut app, KeyCode::Char('c'));
        wait_for_feedback(&mut app).await;

        assert_eq!(app.copy_feedback, Some(CopyFeedback::Copied));
        assert_eq!(app.copy_feedback.map(CopyFeedback::message), Some(MSG_COPIED));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_copy_failure_shows_feedback() {
        let (mut app, _) = test_app(false);
        fill(&mut app);
        assert!(app.copy_result());
        wait_for_feedback(&mut app).await;
        assert_eq!(app.copy_feedback, Some(CopyFeedback::Failed));
    }

    #[test]
    fn test_copied_feedback_expires() {
        let (mut app, _) = test_app(true);
        let start = Instant::now();
        app.apply_copy_outcome(CopyOutcome::Succeeded { backend: "test" }, start);

        app.expire_feedback(start + Duration::from_millis(1999));
        assert_eq!(app.copy_feedback, Some(CopyFeedback::Copied));

        app.expire_feedback(start + FEEDBACK_DURATION);
        assert_eq!(app.copy_feedback, None);
    }

    #[test]
    fn test_failed_feedback_persists() {
        let (mut app, _) = test_app(false);
        let start = Instant::now();
        app.apply_copy_outcome(CopyOutcome::Failed, start);
        app.expire_feedback(start + Duration::from_secs(60));
        assert_eq!(app.copy_feedback, Some(CopyFeedback::Failed));
    }

    #[test]
    fn test_reset_key_clears_everything() {
        let (mut app, _) = test_app(true);
        type_text(&mut app, "-1");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "5");
        app.apply_copy_outcome(CopyOutcome::Failed, Instant::now());

        press(&mut app, KeyCode::Char('r'));
        for field in Field::ALL {
            assert_eq!(app.calculator.raw(field), "");
            assert_eq!(app.calculator.error_text(field), None);
        }
        assert_eq!(app.calculator.status(), ResultStatus::Idle);
        assert!(!app.calculator.can_copy());
        assert_eq!(app.copy_feedback, None);
    }

    #[tokio::test]
    async fn test_copy_finishing_after_reset_is_ignored() {
        let (mut app, calls) = test_app(true);
        fill(&mut app);
        assert!(app.copy_result());
        app.reset();

        for _ in 0..200 {
            if calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.tick();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.copy_feedback, None);
        assert_eq!(app.calculator.result(), None);
    }

    #[tokio::test]
    async fn test_copy_after_reset_still_reports() {
        let (mut app, _) = test_app(true);
        fill(&mut app);
        app.reset();
        app.focus = Field::Length;
        fill(&mut app);
        assert!(app.copy_result());
        wait_for_feedback(&mut app).await;
        assert_eq!(app.copy_feedback, Some(CopyFeedback::Copied));
    }

    #[test]
    fn test_help_popup_swallows_keys() {
        let (mut app, _) = test_app(true);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.popup, Popup::Help);
        type_text(&mut app, "12");
        assert_eq!(app.calculator.raw(Field::Length), "");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn test_hydrate_once_at_startup() {
        let (mut app, _) = test_app(true);
        app.hydrate(&QueryParams::parse("length=2&width=3&thickness=0.5&unit=m"));
        assert_eq!(app.calculator.copy_text().as_deref(), Some("3.00"));
    }
}
