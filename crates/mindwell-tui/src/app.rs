use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use mindwell_core::prompt::greeting;
use mindwell_core::{Config, Engine, EngineError, FailureKind, OpenAIClient, Reply, ReplySource, SetupError};

pub type SubmitTask = JoinHandle<Result<Option<Reply>, EngineError>>;
pub type ProbeTask = JoinHandle<Result<(), SetupError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
    /// Local status lines that never came from the model.
    Notice,
}

/// A line in the chat pane. Unlike the engine's history this includes
/// greetings, fallbacks and notices.
#[derive(Debug, Clone)]
pub struct DisplayMessage {
    pub sender: Sender,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ApiStatus {
    pub message: String,
    pub is_error: bool,
}

pub struct App {
    pub should_quit: bool,
    pub engine: Arc<Engine<OpenAIClient>>,
    pub model: String,

    // Chat state
    pub messages: Vec<DisplayMessage>,
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    pub submit_task: Option<SubmitTask>,
    pub pending_follow_ups: Vec<(Instant, String)>,
    pub greeted: bool,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    pub probe_task: Option<ProbeTask>,
    pub api_status: Option<ApiStatus>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let engine = Arc::new(Engine::from_config(config));

        // A key in the environment is trusted for the session, like a stored one.
        if let Some(key) = Config::session_key_from_env() {
            engine.set_credential(key);
        }

        let mut app = Self {
            should_quit: false,
            model: config.model.clone(),
            show_api_key_input: !engine.is_ready(),
            engine,

            messages: Vec::new(),
            input: String::new(),
            cursor: 0,
            submit_task: None,
            pending_follow_ups: Vec::new(),
            greeted: false,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            api_key_input: String::new(),
            api_key_input_cursor: 0,
            probe_task: None,
            api_status: None,
        };
        app.greet_if_new();
        app
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    pub fn is_waiting(&self) -> bool {
        self.submit_task.is_some()
    }

    pub fn is_probing(&self) -> bool {
        self.probe_task.is_some()
    }

    pub fn push_message(&mut self, sender: Sender, content: impl Into<String>) {
        self.messages.push(DisplayMessage {
            sender,
            content: content.into(),
        });
        self.scroll_chat_to_bottom();
    }

    /// Show a greeting the first time the chat opens with an empty history.
    pub fn greet_if_new(&mut self) {
        if !self.greeted && self.is_ready() && self.engine.history().is_empty() {
            self.greeted = true;
            self.push_message(Sender::Bot, greeting());
        }
    }

    pub fn open_api_key_input(&mut self) {
        self.show_api_key_input = true;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        self.api_status = None;
    }

    pub fn close_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    /// Send the current input through the engine in the background.
    pub fn submit_input(&mut self) {
        if !self.is_ready() {
            self.open_api_key_input();
            return;
        }

        let text = self.input.trim().to_string();
        if text.is_empty() || self.is_waiting() {
            return;
        }

        self.input.clear();
        self.cursor = 0;
        self.push_message(Sender::User, text.clone());

        let engine = Arc::clone(&self.engine);
        self.submit_task = Some(tokio::spawn(async move { engine.submit(&text).await }));
        self.scroll_chat_to_bottom();
    }

    /// Probe the typed key in the background; it is stored only if the probe passes.
    pub fn start_probe(&mut self) {
        if self.is_probing() {
            return;
        }
        let key = self.api_key_input.clone();
        let engine = Arc::clone(&self.engine);
        self.api_status = Some(ApiStatus {
            message: "Testing connection...".to_string(),
            is_error: false,
        });
        self.probe_task = Some(tokio::spawn(async move { engine.configure(&key).await }));
    }

    /// Drop the conversation and start fresh. The key stays configured.
    pub fn reset_conversation(&mut self) {
        if self.is_waiting() {
            return;
        }
        self.engine.reset();
        self.messages.clear();
        self.pending_follow_ups.clear();
        self.chat_scroll = 0;
        self.greeted = false;
        self.greet_if_new();
    }

    /// Called on every tick: advance the animation and collect finished work.
    pub async fn tick(&mut self) {
        if self.is_waiting() || self.is_probing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        self.poll_submit().await;
        self.poll_probe().await;
        self.release_follow_ups();
    }

    async fn poll_submit(&mut self) {
        let finished = self.submit_task.as_ref().is_some_and(|t| t.is_finished());
        if !finished {
            return;
        }
        let Some(task) = self.submit_task.take() else {
            return;
        };

        match task.await {
            Ok(Ok(Some(reply))) => {
                let rejected_key = matches!(
                    reply.source,
                    ReplySource::Fallback(FailureKind::Unauthorized)
                        | ReplySource::CrisisFallback(FailureKind::Unauthorized)
                );
                self.push_message(Sender::Bot, reply.text);
                if rejected_key {
                    // The session key stopped working; ask for a new one.
                    self.engine.forget_credential();
                    self.open_api_key_input();
                }
                if let Some(follow_up) = reply.follow_up {
                    self.pending_follow_ups
                        .push((Instant::now() + follow_up.delay, follow_up.text));
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(EngineError::NotConfigured)) => {
                self.push_message(Sender::Notice, EngineError::NotConfigured.to_string());
                self.open_api_key_input();
            }
            // The input is locked while a reply is pending, so this is not worth showing.
            Ok(Err(EngineError::AlreadyProcessing)) => {}
            Err(e) => {
                tracing::error!(error = %e, "submit task failed");
                self.push_message(Sender::Notice, "Something went wrong sending that message.");
            }
        }
    }

    async fn poll_probe(&mut self) {
        let finished = self.probe_task.as_ref().is_some_and(|t| t.is_finished());
        if !finished {
            return;
        }
        let Some(task) = self.probe_task.take() else {
            return;
        };

        match task.await {
            Ok(Ok(())) => {
                self.api_status = Some(ApiStatus {
                    message: "API connection successful! You can now chat with MindWell AI.".to_string(),
                    is_error: false,
                });
                self.close_api_key_input();
                self.greet_if_new();
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "API key check failed");
                self.api_status = Some(ApiStatus {
                    message: err.status_message(),
                    is_error: true,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "probe task failed");
                self.api_status = Some(ApiStatus {
                    message: "Connection test failed. Please try again.".to_string(),
                    is_error: true,
                });
            }
        }
    }

    fn release_follow_ups(&mut self) {
        let now = Instant::now();
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_follow_ups)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.pending_follow_ups = waiting;
        for (_, text) in due {
            self.push_message(Sender::Bot, text);
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.total_chat_lines().saturating_sub(self.visible_chat_height());
        self.chat_scroll = (self.chat_scroll + lines).min(max);
    }

    /// Scroll chat to bottom so the newest message (or "Typing...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();
        let visible_height = self.visible_chat_height();
        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in &self.messages {
            total_lines = total_lines.saturating_add(1); // Sender line
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count / wrap_width + 1 };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.is_waiting() {
            total_lines = total_lines.saturating_add(2); // "MindWell:" + "Typing..."
        }
        total_lines
    }
}
