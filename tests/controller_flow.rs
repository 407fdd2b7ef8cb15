use image::RgbaImage;
use ink_ask::capture::{CapturedImage, ScreenGrabber};
use ink_ask::controller::{Controller, ControllerEffect, MenuCommand, ResponseStatus};
use ink_ask::gemini::{GeminiError, ModelClient, QueryRequest};
use ink_ask::settings::{AppConfig, QueryPolicy};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
enum Script {
    /// Emit the given fragments.
    Fragments(&'static [&'static str]),
    /// Emit the prompt text once the gate opens.
    EchoAfterGate,
    /// Emit the first fragment, wait for the gate, emit the rest.
    SplitAtGate(&'static [&'static str]),
    Fail(u16),
}

struct FakeClient {
    script: Script,
    gate: Mutex<Receiver<()>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl FakeClient {
    fn new(script: Script) -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = channel();
        let client = Arc::new(Self {
            script,
            gate: Mutex::new(rx),
            requests: Mutex::new(Vec::new()),
        });
        (client, tx)
    }

    fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ModelClient for FakeClient {
    fn stream_generate(
        &self,
        request: &QueryRequest,
        on_fragment: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), GeminiError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script {
            Script::Fragments(fragments) => {
                for f in fragments {
                    if !on_fragment(f) {
                        break;
                    }
                }
                Ok(())
            }
            Script::EchoAfterGate => {
                let _ = self.gate.lock().unwrap().recv();
                on_fragment(&request.prompt);
                Ok(())
            }
            Script::SplitAtGate(fragments) => {
                on_fragment(fragments[0]);
                let _ = self.gate.lock().unwrap().recv();
                for f in &fragments[1..] {
                    if !on_fragment(f) {
                        break;
                    }
                }
                Ok(())
            }
            Script::Fail(status) => Err(GeminiError::Status {
                status,
                message: "API key not valid".into(),
            }),
        }
    }
}

struct FakeGrabber {
    fail: bool,
    grabs: usize,
}

impl ScreenGrabber for FakeGrabber {
    fn grab_primary(&mut self) -> anyhow::Result<CapturedImage> {
        if self.fail {
            anyhow::bail!("no display");
        }
        self.grabs += 1;
        CapturedImage::from_rgba(&RgbaImage::new(2 + self.grabs as u32, 2))
    }
}

fn controller(
    client: Arc<FakeClient>,
    policy: QueryPolicy,
    grab_fails: bool,
) -> Controller<FakeClient, FakeGrabber> {
    let config = AppConfig {
        query_policy: policy,
        ..AppConfig::default()
    };
    Controller::new(
        config,
        client,
        FakeGrabber {
            fail: grab_fails,
            grabs: 0,
        },
        Arc::new(|| {}),
    )
}

fn wait_until_idle(c: &mut Controller<FakeClient, FakeGrabber>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while c.in_flight() {
        assert!(Instant::now() < deadline, "worker did not finish");
        c.pump(Instant::now());
        sleep(Duration::from_millis(5));
    }
}

fn drain_reveal(c: &mut Controller<FakeClient, FakeGrabber>) {
    let mut at = Instant::now();
    loop {
        at += Duration::from_secs(1);
        c.pump(at);
        if !c.typewriter().is_revealing() {
            break;
        }
    }
}

#[test]
fn ask_with_screenshot_streams_into_the_buffer() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&["Hello", " world"]));
    let mut c = controller(client.clone(), QueryPolicy::Replace, false);

    assert_eq!(
        c.handle_menu(MenuCommand::AskWithScreenshot),
        ControllerEffect::PromptOpened
    );
    assert!(c.captured_image().is_some());
    assert!(c.prompt().unwrap().with_screenshot);

    assert_eq!(
        c.submit_prompt("Describe this image"),
        ControllerEffect::QueryStarted(1)
    );
    assert!(c.response_visible());
    wait_until_idle(&mut c);
    drain_reveal(&mut c);

    assert_eq!(c.status(), &ResponseStatus::Done);
    assert_eq!(c.typewriter().revealed(), "Hello world");
    assert_eq!(c.typewriter().html(), "<p>Hello world</p>\n");
    assert!(c.typewriter_mut().take_scroll_request());
    assert!(!c.typewriter().is_revealing());

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Describe this image");
    assert_eq!(requests[0].image.as_ref(), c.captured_image());
}

#[test]
fn plain_ask_sends_no_image() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&["ok"]));
    let mut c = controller(client.clone(), QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::AskWithScreenshot);
    c.submit_prompt("first");
    wait_until_idle(&mut c);

    c.handle_menu(MenuCommand::Ask);
    assert!(!c.prompt().unwrap().with_screenshot);
    c.submit_prompt("second");
    wait_until_idle(&mut c);

    let requests = client.requests();
    assert!(requests[0].image.is_some());
    assert!(requests[1].image.is_none());
}

#[test]
fn new_capture_replaces_previous_image() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&[]));
    let mut c = controller(client, QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::AskWithScreenshot);
    let first = c.captured_image().cloned().unwrap();
    c.cancel_prompt();
    c.handle_menu(MenuCommand::AskWithScreenshot);
    let second = c.captured_image().cloned().unwrap();
    assert_ne!(first.width(), second.width());
}

#[test]
fn cancelled_prompt_starts_nothing() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&["x"]));
    let mut c = controller(client.clone(), QueryPolicy::Replace, false);

    assert_eq!(c.handle_menu(MenuCommand::Ask), ControllerEffect::PromptOpened);
    assert_eq!(c.cancel_prompt(), ControllerEffect::Aborted);

    assert!(c.prompt().is_none());
    assert!(!c.response_visible());
    assert!(!c.in_flight());
    assert_eq!(c.current_query(), None);
    assert_eq!(c.status(), &ResponseStatus::Empty);
    sleep(Duration::from_millis(20));
    assert!(client.requests().is_empty());
}

#[test]
fn blank_prompt_aborts_silently() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&["x"]));
    let mut c = controller(client.clone(), QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("  \n\t "), ControllerEffect::Aborted);
    assert!(!c.response_visible());
    assert!(!c.in_flight());
    assert!(client.requests().is_empty());
}

#[test]
fn empty_stream_still_completes() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&[]));
    let mut c = controller(client, QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::Ask);
    c.submit_prompt("anything");
    wait_until_idle(&mut c);

    assert_eq!(c.status(), &ResponseStatus::Done);
    assert_eq!(c.typewriter().revealed(), "");
    assert!(!c.typewriter().is_revealing());
    assert_eq!(c.next_deadline(), None);
}

#[test]
fn remote_failure_is_a_terminal_error_state() {
    let (client, _gate) = FakeClient::new(Script::Fail(401));
    let mut c = controller(client, QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::Ask);
    c.submit_prompt("hi");
    wait_until_idle(&mut c);

    match c.status() {
        ResponseStatus::Failed(msg) => assert!(msg.contains("authentication failed"), "{msg}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(c.response_visible());
}

#[test]
fn capture_failure_is_reported_without_prompt() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&["x"]));
    let mut c = controller(client, QueryPolicy::Replace, true);
    match c.handle_menu(MenuCommand::AskWithScreenshot) {
        ControllerEffect::CaptureFailed(msg) => assert!(msg.contains("no display")),
        other => panic!("unexpected effect {other:?}"),
    }
    assert!(c.prompt().is_none());
    assert!(c.captured_image().is_none());
}

#[test]
fn reject_policy_keeps_running_query() {
    let (client, gate) = FakeClient::new(Script::EchoAfterGate);
    let mut c = controller(client.clone(), QueryPolicy::Reject, false);

    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("first"), ControllerEffect::QueryStarted(1));
    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("second"), ControllerEffect::Rejected);
    assert_eq!(c.current_query(), Some(1));

    gate.send(()).unwrap();
    wait_until_idle(&mut c);
    drain_reveal(&mut c);

    assert_eq!(c.typewriter().revealed(), "first");
    assert_eq!(client.requests().len(), 1);
}

#[test]
fn replace_policy_supersedes_running_query() {
    let (client, gate) = FakeClient::new(Script::EchoAfterGate);
    let mut c = controller(client.clone(), QueryPolicy::Replace, false);

    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("first"), ControllerEffect::QueryStarted(1));
    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("second"), ControllerEffect::QueryStarted(2));

    gate.send(()).unwrap();
    gate.send(()).unwrap();
    wait_until_idle(&mut c);
    // Let the superseded worker finish too, its messages must be ignored.
    let deadline = Instant::now() + Duration::from_secs(5);
    while client.requests().len() < 2 && Instant::now() < deadline {
        sleep(Duration::from_millis(5));
    }
    sleep(Duration::from_millis(20));
    drain_reveal(&mut c);

    assert_eq!(c.typewriter().revealed(), "second");
    assert_eq!(c.status(), &ResponseStatus::Done);
}

#[test]
fn stop_halts_relaying_but_still_completes() {
    let (client, gate) = FakeClient::new(Script::SplitAtGate(&["a", "b", "c"]));
    let mut c = controller(client, QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::Ask);
    c.submit_prompt("go");

    let deadline = Instant::now() + Duration::from_secs(5);
    while c.typewriter().pending_len() == 0 && c.typewriter().revealed().is_empty() {
        assert!(Instant::now() < deadline, "first fragment never arrived");
        c.pump(Instant::now());
        sleep(Duration::from_millis(5));
    }
    c.stop_query();
    gate.send(()).unwrap();
    wait_until_idle(&mut c);
    drain_reveal(&mut c);

    assert_eq!(c.status(), &ResponseStatus::Done);
    assert_eq!(c.typewriter().revealed(), "a");
}

#[test]
fn reject_policy_accepts_new_query_after_stop() {
    let (client, gate) = FakeClient::new(Script::SplitAtGate(&["a", "b"]));
    let mut c = controller(client.clone(), QueryPolicy::Reject, false);
    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("first"), ControllerEffect::QueryStarted(1));

    let deadline = Instant::now() + Duration::from_secs(5);
    while c.typewriter().pending_len() == 0 && c.typewriter().revealed().is_empty() {
        assert!(Instant::now() < deadline, "first fragment never arrived");
        c.pump(Instant::now());
        sleep(Duration::from_millis(5));
    }
    c.stop_query();
    c.pump(Instant::now());
    assert_eq!(c.status(), &ResponseStatus::Stopping);

    // The stopped worker is still blocked in its read.
    c.handle_menu(MenuCommand::Ask);
    assert_eq!(c.submit_prompt("second"), ControllerEffect::QueryStarted(2));
    assert_eq!(c.status(), &ResponseStatus::Streaming);
    assert_eq!(c.current_query(), Some(2));

    gate.send(()).unwrap();
    gate.send(()).unwrap();
    wait_until_idle(&mut c);
    drain_reveal(&mut c);

    assert_eq!(c.status(), &ResponseStatus::Done);
    assert_eq!(c.typewriter().revealed(), "ab");
    assert_eq!(client.requests().len(), 2);
    assert_eq!(client.requests()[1].prompt, "second");
}

#[test]
fn clear_menu_empties_drawing() {
    use eframe::egui::{PointerButton, Pos2};
    use ink_ask::draw::PointerSample;

    let (client, _gate) = FakeClient::new(Script::Fragments(&[]));
    let mut c = controller(client, QueryPolicy::Replace, false);
    let input = c.draw_input();
    input.handle(PointerSample::Press {
        button: PointerButton::Primary,
        pos: Pos2::new(0.0, 0.0),
    });
    input.handle(PointerSample::Move {
        pos: Pos2::new(4.0, 4.0),
        primary_down: true,
    });

    assert_eq!(c.handle_menu(MenuCommand::Clear), ControllerEffect::Redraw);
    assert!(c.paths().is_empty());
}

#[test]
fn window_commands_are_passed_through() {
    let (client, _gate) = FakeClient::new(Script::Fragments(&[]));
    let mut c = controller(client, QueryPolicy::Replace, false);
    assert_eq!(c.handle_menu(MenuCommand::Minimize), ControllerEffect::Minimize);
    assert_eq!(c.handle_menu(MenuCommand::Quit), ControllerEffect::Quit);
}

#[test]
fn prompt_blocks_drawing_until_closed() {
    use eframe::egui::{PointerButton, Pos2};
    use ink_ask::draw::PointerSample;

    let (client, _gate) = FakeClient::new(Script::Fragments(&[]));
    let mut c = controller(client, QueryPolicy::Replace, false);
    c.handle_menu(MenuCommand::Ask);
    let press = PointerSample::Press {
        button: PointerButton::Primary,
        pos: Pos2::new(1.0, 1.0),
    };
    assert!(!c.draw_input().handle(press));
    c.cancel_prompt();
    assert!(c.draw_input().handle(press));
}
