//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use listguard::{
    CancellationToken, ExecutorError, ExecutorResult, ListDiscovery, ListRef, MakeListRequest,
    MemberMode, MembershipChange, OperationExecutor,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Executor that records every call and can be told to fail or stall.
#[derive(Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<String>>,
    members: HashMap<MemberMode, Vec<String>>,
    failing_modes: HashSet<MemberMode>,
    fail_make_list: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members(mut self, mode: MemberMode, members: &[&str]) -> Self {
        self.members
            .insert(mode, members.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn failing(mut self, mode: MemberMode) -> Self {
        self.failing_modes.insert(mode);
        self
    }

    pub fn failing_make_list(mut self) -> Self {
        self.fail_make_list = true;
        self
    }

    /// Make every call take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of executor calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Members of one class, or of every member class in order for `None`.
    fn members_of(&self, mode: Option<MemberMode>) -> Vec<String> {
        match mode {
            Some(mode) => self.members.get(&mode).cloned().unwrap_or_default(),
            None => MemberMode::MEMBER_MODES
                .iter()
                .filter_map(|m| self.members.get(m))
                .flatten()
                .cloned()
                .collect(),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn run(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _leave = LeaveOnDrop(&self.in_flight);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn mode_label(mode: Option<MemberMode>) -> String {
    mode.map(|m| m.to_string()).unwrap_or_else(|| "all".to_string())
}

struct LeaveOnDrop<'a>(&'a AtomicUsize);

impl Drop for LeaveOnDrop<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OperationExecutor for MockExecutor {
    async fn make_list(
        &self,
        request: &MakeListRequest,
        _cancel: &CancellationToken,
    ) -> ExecutorResult<String> {
        self.record(format!("make_list {}", request.list()));
        self.run().await;
        if self.fail_make_list {
            return Err(ExecutorError::new("list already exists")
                .with_output("mlmmj-make-ml: list already exists"));
        }
        Ok(format!("created {}", request.name))
    }

    async fn change_membership(
        &self,
        change: &MembershipChange,
        _cancel: &CancellationToken,
    ) -> ExecutorResult<String> {
        let kind = if change.is_unsubscribe() {
            "unsubscribe"
        } else {
            "subscribe"
        };
        self.record(format!("{} {}", kind, change.list()));
        self.run().await;
        Ok(format!("{} done", kind))
    }

    async fn list(
        &self,
        list: &ListRef,
        mode: Option<MemberMode>,
        _cancel: &CancellationToken,
    ) -> ExecutorResult<Vec<String>> {
        self.record(format!("list {} {}", list, mode_label(mode)));
        self.run().await;
        if let Some(mode) = mode.filter(|m| self.failing_modes.contains(m)) {
            return Err(ExecutorError::new(format!("{} query failed", mode)));
        }
        Ok(self.members_of(mode))
    }

    async fn count(
        &self,
        list: &ListRef,
        mode: Option<MemberMode>,
        _cancel: &CancellationToken,
    ) -> ExecutorResult<u64> {
        self.record(format!("count {} {}", list, mode_label(mode)));
        self.run().await;
        if let Some(mode) = mode.filter(|m| self.failing_modes.contains(m)) {
            return Err(ExecutorError::new(format!("{} count failed", mode)));
        }
        Ok(self.members_of(mode).len() as u64)
    }
}

/// Discovery with a fixed answer per spool.
#[derive(Default)]
pub struct MockDiscovery {
    spools: HashMap<String, (Duration, Result<Vec<String>, String>)>,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spool(mut self, spool: &str, lists: &[&str]) -> Self {
        self.spools.insert(
            spool.to_string(),
            (
                Duration::ZERO,
                Ok(lists.iter().map(|l| l.to_string()).collect()),
            ),
        );
        self
    }

    pub fn failing_spool(mut self, spool: &str, message: &str) -> Self {
        self.spools
            .insert(spool.to_string(), (Duration::ZERO, Err(message.to_string())));
        self
    }

    /// Delay the answer for an already configured spool.
    pub fn delayed(mut self, spool: &str, delay: Duration) -> Self {
        if let Some(entry) = self.spools.get_mut(spool) {
            entry.0 = delay;
        }
        self
    }
}

#[async_trait]
impl ListDiscovery for MockDiscovery {
    async fn list_names(&self, spool: &str) -> ExecutorResult<Vec<String>> {
        let Some((delay, result)) = self.spools.get(spool) else {
            return Ok(Vec::new());
        };
        if !delay.is_zero() {
            tokio::time::sleep(*delay).await;
        }
        result.clone().map_err(ExecutorError::new)
    }
}
