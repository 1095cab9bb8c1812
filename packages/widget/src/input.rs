//! Debounced text input.
//!
//! Typing restarts an inactivity timer and only the text present when the
//! timer expires is submitted. An explicit submit (Enter) skips the wait.

use std::time::Duration;

use location_insight_widget_models::WidgetConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::controller::QueryController;

/// One event from a search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The box now contains this text.
    Text(String),
    /// The user pressed Enter.
    Submit,
}

/// Turns a stream of [`InputEvent`]s into location submissions.
#[derive(Debug)]
pub struct DebouncedInput {
    events: mpsc::Receiver<InputEvent>,
    debounce: Duration,
    text: String,
    deadline: Option<Instant>,
}

impl DebouncedInput {
    /// Debounces `events` with an explicit inactivity window.
    #[must_use]
    pub const fn new(events: mpsc::Receiver<InputEvent>, debounce: Duration) -> Self {
        Self {
            events,
            debounce,
            text: String::new(),
            deadline: None,
        }
    }

    /// Debounces `events` with the config's `debounceMs` window.
    #[must_use]
    pub const fn from_config(events: mpsc::Receiver<InputEvent>, config: &WidgetConfig) -> Self {
        Self::new(events, config.debounce())
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Waits for the next text that should be submitted.
    ///
    /// Returns `None` once the event channel is closed. Text still waiting
    /// on the timer at that point is returned first.
    pub async fn next_submission(&mut self) -> Option<String> {
        loop {
            let event = match self.deadline {
                Some(deadline) => {
                    tokio::select! {
                        event = self.events.recv() => event,
                        () = tokio::time::sleep_until(deadline) => {
                            self.deadline = None;
                            return Some(self.text.clone());
                        }
                    }
                }
                None => self.events.recv().await,
            };

            match event {
                Some(InputEvent::Text(text)) => {
                    self.text = text;
                    self.deadline = Some(Instant::now() + self.debounce);
                }
                Some(InputEvent::Submit) => {
                    self.deadline = None;
                    return Some(self.text.clone());
                }
                None => return self.deadline.take().map(|_| self.text.clone()),
            }
        }
    }
}

/// Feeds debounced submissions into `controller` until the input closes.
///
/// Each submission runs on its own task so that a slow pipeline never
/// delays the next keystroke; the controller drops whichever results have
/// been superseded.
pub fn spawn_input_driver(controller: QueryController, mut input: DebouncedInput) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(text) = input.next_submission().await {
            log::debug!("Submitting '{text}' from input");
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.submit(&text).await;
            });
        }
        log::debug!("Input closed");
    })
}
