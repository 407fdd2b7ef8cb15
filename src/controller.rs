use crate::capture::{CapturedImage, ScreenGrabber};
use crate::draw::{DrawInput, PathCollection};
use crate::gemini::worker::Notify;
use crate::gemini::{ModelClient, QueryRequest, QueryWorker, WorkerEvent, WorkerMessage};
use crate::settings::{AppConfig, QueryPolicy};
use crate::typewriter::Typewriter;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Clear,
    Minimize,
    Ask,
    AskWithScreenshot,
    Quit,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 5] = [
        MenuCommand::Clear,
        MenuCommand::Minimize,
        MenuCommand::Ask,
        MenuCommand::AskWithScreenshot,
        MenuCommand::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuCommand::Clear => "Clear",
            MenuCommand::Minimize => "Minimize",
            MenuCommand::Ask => "Ask",
            MenuCommand::AskWithScreenshot => "Ask with screenshot",
            MenuCommand::Quit => "Quit",
        }
    }
}

/// What the window layer has to do after a controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEffect {
    None,
    Redraw,
    Minimize,
    Quit,
    PromptOpened,
    /// Empty or cancelled prompt; nothing was started.
    Aborted,
    QueryStarted(u64),
    /// A query is still streaming and the policy refuses a second one.
    Rejected,
    CaptureFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Empty,
    Streaming,
    /// Stop was pressed; the worker has not reported back yet.
    Stopping,
    Done,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptState {
    pub text: String,
    pub with_screenshot: bool,
}

pub struct Controller<C: ModelClient + ?Sized, G: ScreenGrabber> {
    config: AppConfig,
    client: Arc<C>,
    grabber: G,
    notify: Notify,
    draw: DrawInput,
    image: Option<CapturedImage>,
    prompt: Option<PromptState>,
    typewriter: Typewriter,
    status: ResponseStatus,
    response_visible: bool,
    active: Option<QueryWorker>,
    current_query: Option<u64>,
    next_query_id: u64,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
}

impl<C: ModelClient + ?Sized, G: ScreenGrabber> Controller<C, G> {
    pub fn new(config: AppConfig, client: Arc<C>, grabber: G, notify: Notify) -> Self {
        let (tx, rx) = channel();
        let typewriter = Typewriter::new(Duration::from_millis(config.reveal_rate_ms));
        Self {
            config,
            client,
            grabber,
            notify,
            draw: DrawInput::default(),
            image: None,
            prompt: None,
            typewriter,
            status: ResponseStatus::Empty,
            response_visible: false,
            active: None,
            current_query: None,
            next_query_id: 1,
            tx,
            rx,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn paths(&self) -> &PathCollection {
        self.draw.paths()
    }

    pub fn draw_input(&mut self) -> &mut DrawInput {
        &mut self.draw
    }

    pub fn captured_image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn prompt(&self) -> Option<&PromptState> {
        self.prompt.as_ref()
    }

    pub fn prompt_mut(&mut self) -> Option<&mut PromptState> {
        self.prompt.as_mut()
    }

    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    pub fn typewriter_mut(&mut self) -> &mut Typewriter {
        &mut self.typewriter
    }

    pub fn status(&self) -> &ResponseStatus {
        &self.status
    }

    pub fn response_visible(&self) -> bool {
        self.response_visible
    }

    pub fn hide_response(&mut self) {
        self.response_visible = false;
    }

    /// A worker has been started and has not reported its terminal event yet.
    pub fn in_flight(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_query(&self) -> Option<u64> {
        self.current_query
    }

    pub fn handle_menu(&mut self, command: MenuCommand) -> ControllerEffect {
        tracing::debug!(?command, "menu command");
        match command {
            MenuCommand::Clear => {
                self.draw.clear();
                ControllerEffect::Redraw
            }
            MenuCommand::Minimize => ControllerEffect::Minimize,
            MenuCommand::Quit => {
                self.stop_query();
                ControllerEffect::Quit
            }
            MenuCommand::Ask => self.open_prompt(false),
            MenuCommand::AskWithScreenshot => match self.capture_screen() {
                Ok(()) => self.open_prompt(true),
                Err(err) => {
                    let msg = format!("Screen capture failed: {err:#}");
                    tracing::error!("{msg}");
                    ControllerEffect::CaptureFailed(msg)
                }
            },
        }
    }

    /// Grab the primary display, replacing any earlier capture.
    pub fn capture_screen(&mut self) -> anyhow::Result<()> {
        let image = self.grabber.grab_primary()?;
        self.image = Some(image);
        Ok(())
    }

    fn open_prompt(&mut self, with_screenshot: bool) -> ControllerEffect {
        self.prompt = Some(PromptState {
            text: self.config.default_prompt.clone(),
            with_screenshot,
        });
        self.draw.set_blocked(true);
        ControllerEffect::PromptOpened
    }

    pub fn cancel_prompt(&mut self) -> ControllerEffect {
        self.prompt = None;
        self.draw.set_blocked(false);
        tracing::debug!("prompt cancelled");
        ControllerEffect::Aborted
    }

    /// Confirm the open prompt with `text`. Blank input aborts silently.
    pub fn submit_prompt(&mut self, text: &str) -> ControllerEffect {
        let with_screenshot = self.prompt.take().map_or(false, |p| p.with_screenshot);
        self.draw.set_blocked(false);
        if text.trim().is_empty() {
            tracing::info!("no prompt provided; query aborted");
            return ControllerEffect::Aborted;
        }
        let image = if with_screenshot {
            self.image.clone()
        } else {
            None
        };
        self.start_query(text.to_string(), image)
    }

    /// Start one background query, clearing and showing the response view.
    pub fn start_query(&mut self, prompt: String, image: Option<CapturedImage>) -> ControllerEffect {
        if let Some(active) = self.active.take() {
            match self.config.query_policy {
                // A stopped worker no longer relays anything, so it does not
                // hold the slot; its late messages fail the query-id filter.
                QueryPolicy::Reject if !active.is_running() => {
                    tracing::info!(superseded = active.query_id(), "replacing stopped query");
                }
                QueryPolicy::Reject => {
                    tracing::info!(running = active.query_id(), "query rejected while another is streaming");
                    self.active = Some(active);
                    return ControllerEffect::Rejected;
                }
                QueryPolicy::Replace => {
                    tracing::info!(superseded = active.query_id(), "replacing running query");
                    active.stop();
                }
            }
        }

        let query_id = self.next_query_id;
        self.next_query_id += 1;
        let request = QueryRequest::new(prompt, image, &self.config);

        self.typewriter.clear();
        self.response_visible = true;
        self.current_query = Some(query_id);

        match QueryWorker::spawn(
            query_id,
            request,
            self.client.clone(),
            self.tx.clone(),
            self.notify.clone(),
        ) {
            Ok(worker) => {
                tracing::info!(query_id, model = %self.config.model_id, "query started");
                self.active = Some(worker);
                self.status = ResponseStatus::Streaming;
                ControllerEffect::QueryStarted(query_id)
            }
            Err(err) => {
                tracing::error!("{err:#}");
                self.status = ResponseStatus::Failed(format!("{err:#}"));
                ControllerEffect::None
            }
        }
    }

    /// Ask the running worker to stop relaying fragments.
    pub fn stop_query(&mut self) {
        if let Some(active) = &self.active {
            active.stop();
            if self.status == ResponseStatus::Streaming {
                self.status = ResponseStatus::Stopping;
            }
        }
    }

    /// Drain worker messages into the response buffer and run due reveal
    /// ticks. Returns `true` when anything visible changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(WorkerMessage { query_id, event }) => {
                    if Some(query_id) != self.current_query {
                        tracing::debug!(query_id, "dropping message from superseded query");
                        continue;
                    }
                    changed = true;
                    match event {
                        WorkerEvent::Fragment(text) => self.typewriter.append(&text, now),
                        WorkerEvent::Completed => {
                            self.active = None;
                            self.status = ResponseStatus::Done;
                        }
                        WorkerEvent::Failed(msg) => {
                            self.active = None;
                            self.status = ResponseStatus::Failed(msg);
                        }
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if self.typewriter.advance(now) > 0 {
            changed = true;
        }
        changed
    }

    /// When the window layer should wake up next for the reveal timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.typewriter.next_deadline()
    }
}
