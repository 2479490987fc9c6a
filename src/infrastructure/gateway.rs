use crate::domain::money::Amount;
use crate::domain::ports::PaymentGateway;
use crate::domain::ticket::TicketId;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// An in-process payment provider with predetermined answers.
///
/// Each call consumes the next scripted outcome; once the script runs out every
/// further call returns `fallback`. An optional latency simulates a slow
/// provider.
#[derive(Debug)]
pub struct ScriptedGateway {
    name: String,
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(
        name: impl Into<String>,
        script: impl IntoIterator<Item = bool>,
        fallback: bool,
    ) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn approving(name: impl Into<String>) -> Self {
        Self::new(name, std::iter::empty(), true)
    }

    pub fn declining(name: impl Into<String>) -> Self {
        Self::new(name, std::iter::empty(), false)
    }

    /// Declines the first `failures` calls, then approves.
    pub fn failing_first(name: impl Into<String>, failures: usize) -> Self {
        Self::new(name, std::iter::repeat_n(false, failures), true)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of attempts this gateway has served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> bool {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.pop_front().unwrap_or(self.fallback)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, ticket_id: TicketId, amount: Amount) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let approved = self.next_outcome();
        tracing::debug!(gateway = %self.name, %ticket_id, %amount, approved, "gateway answered");
        approved
    }
}
