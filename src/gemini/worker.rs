use super::{ModelClient, QueryRequest};
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Fragment(String),
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMessage {
    pub query_id: u64,
    pub event: WorkerEvent,
}

pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Handle to one background streaming query.
pub struct QueryWorker {
    query_id: u64,
    running: Arc<AtomicBool>,
}

impl QueryWorker {
    /// Start a thread that performs exactly one request. Every fragment is
    /// sent as it arrives; the last message is always `Completed` or `Failed`.
    pub fn spawn<C: ModelClient + ?Sized>(
        query_id: u64,
        request: QueryRequest,
        client: Arc<C>,
        sender: Sender<WorkerMessage>,
        notify: Notify,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        thread::Builder::new()
            .name(format!("query-worker-{query_id}"))
            .spawn(move || {
                let send = |event: WorkerEvent| {
                    let _ = sender.send(WorkerMessage { query_id, event });
                    notify();
                };
                let mut relayed = 0usize;
                let result = client.stream_generate(&request, &mut |fragment| {
                    if !flag.load(Ordering::SeqCst) {
                        return false;
                    }
                    relayed += 1;
                    send(WorkerEvent::Fragment(fragment.to_string()));
                    true
                });
                flag.store(false, Ordering::SeqCst);
                match result {
                    Ok(()) => {
                        tracing::info!(query_id, relayed, "query completed");
                        send(WorkerEvent::Completed);
                    }
                    Err(err) => {
                        tracing::error!(query_id, relayed, "query failed: {err}");
                        send(WorkerEvent::Failed(err.to_string()));
                    }
                }
            })
            .map_err(|err| anyhow!("failed to spawn query worker thread: {err}"))?;

        Ok(Self { query_id, running })
    }

    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    /// Stop relaying fragments. The network read in progress is not
    /// interrupted; the worker still reports completion once it returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for QueryWorker {
    fn drop(&mut self) {
        // A detached worker stops relaying once its handle is gone.
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiError;
    use crate::settings::AppConfig;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    struct Echo;

    impl ModelClient for Echo {
        fn stream_generate(
            &self,
            request: &QueryRequest,
            on_fragment: &mut dyn FnMut(&str) -> bool,
        ) -> Result<(), GeminiError> {
            for word in request.prompt.split_inclusive(' ') {
                if !on_fragment(word) {
                    break;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn worker_reports_fragments_then_completion() {
        let (tx, rx) = channel();
        let request = QueryRequest::new("one two three", None, &AppConfig::default());
        let worker = QueryWorker::spawn(7, request, Arc::new(Echo), tx, Arc::new(|| {})).unwrap();
        assert_eq!(worker.query_id(), 7);

        let events: Vec<WorkerEvent> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .map(|m| {
                assert_eq!(m.query_id, 7);
                m.event
            })
            .collect();
        assert_eq!(
            events,
            vec![
                WorkerEvent::Fragment("one ".into()),
                WorkerEvent::Fragment("two ".into()),
                WorkerEvent::Fragment("three".into()),
                WorkerEvent::Completed,
            ]
        );
        assert!(!worker.is_running());
    }
}
