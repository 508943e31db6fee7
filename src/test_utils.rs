//! Helpers shared by the integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::probe::{ProbeError, ReadinessProbe};

/// A predicate that turns true on its `k`-th evaluation and counts calls.
///
/// Clones share the counter, so a test can hand one clone to the poller and
/// inspect the other afterwards.
#[derive(Debug, Clone)]
pub struct FlipAfter {
    k: u32,
    calls: Arc<AtomicU32>,
}

impl FlipAfter {
    pub fn new(k: u32) -> Self {
        Self {
            k,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Never turns true.
    pub fn never() -> Self {
        Self::new(u32::MAX)
    }

    /// Evaluates the predicate, recording the call.
    pub fn check(&self) -> bool {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        n >= self.k
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A probe that replays a fixed script of results, then repeats the last one.
#[derive(Debug)]
pub struct ScriptedProbe {
    script: Mutex<VecDeque<ScriptedResult>>,
    last: Mutex<ScriptedResult>,
    calls: AtomicU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedResult {
    Ready,
    NotReady,
    Unreachable,
}

impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = ScriptedResult>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(ScriptedResult::NotReady),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadinessProbe for ScriptedProbe {
    async fn check(&self) -> Result<bool, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            *last
        };
        match next {
            ScriptedResult::Ready => Ok(true),
            ScriptedResult::NotReady => Ok(false),
            ScriptedResult::Unreachable => Err(ProbeError::InvalidUrl {
                url: "scripted://unreachable".to_string(),
                reason: "scripted failure".to_string(),
            }),
        }
    }

    fn target(&self) -> &str {
        "scripted"
    }
}

/// A loopback address nothing is listening on.
///
/// The port is taken from a listener that is immediately closed, so it is
/// free at the time of the call.
pub fn unused_local_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind an ephemeral port");
    listener.local_addr().expect("listener has no local address")
}
