//! In-memory fakes for the command runner (testing only)
//!
//! `FakeRunner` records every command it is asked to run and answers with a
//! scripted [`CommandOutcome`]. The responder may also touch the filesystem
//! to stand in for what the real tool would have produced.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::runner::{CommandOutcome, CommandRunner, CommandSpec};
use crate::Result;

type Responder = Box<dyn Fn(&CommandSpec) -> CommandOutcome + Send + Sync>;

/// Recording command runner with scripted responses.
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responder: Responder,
}

impl FakeRunner {
    /// Every command exits 0.
    pub fn succeeding() -> Self {
        Self::with_responder(|_| CommandOutcome::success())
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&CommandSpec) -> CommandOutcome + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Commands seen so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Program names seen so far, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.program.clone())
            .collect()
    }
}

impl std::fmt::Debug for FakeRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeRunner")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        self.calls.lock().unwrap().push(spec.clone());
        Ok((self.responder)(spec))
    }
}
