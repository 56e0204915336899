//! In-memory stand-ins for the remote review service and the subprocess runner.

use async_trait::async_trait;
use pipekit_core::automerge::{
    ChangeId, ChangeReviewClient, ChangeSnapshot, ChangeState, MergeResponse, TransportError,
};
use pipekit_core::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub fn open_snapshot(head_ref: &str) -> ChangeSnapshot {
    ChangeSnapshot {
        state: ChangeState::Open,
        head_ref: head_ref.to_string(),
        merged: false,
        draft: false,
    }
}

pub fn merged_ok() -> Result<MergeResponse, TransportError> {
    Ok(MergeResponse {
        merged: true,
        message: "Pull Request successfully merged".into(),
    })
}

/// Review client replaying queued results. An empty fetch queue yields an
/// open change at `"head-1"`; an empty merge queue yields a successful merge.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    fetches: Mutex<VecDeque<Result<ChangeSnapshot, TransportError>>>,
    merges: Mutex<VecDeque<Result<MergeResponse, TransportError>>>,
    fetch_calls: Mutex<u32>,
    merge_heads: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fetch(self, result: Result<ChangeSnapshot, TransportError>) -> Self {
        self.fetches.lock().unwrap().push_back(result);
        self
    }

    pub fn on_merge(self, result: Result<MergeResponse, TransportError>) -> Self {
        self.merges.lock().unwrap().push_back(result);
        self
    }

    pub fn fetch_calls(&self) -> u32 {
        *self.fetch_calls.lock().unwrap()
    }

    /// Head refs passed to `merge`, in call order.
    pub fn merge_heads(&self) -> Vec<String> {
        self.merge_heads.lock().unwrap().clone()
    }

    pub fn merge_calls(&self) -> usize {
        self.merge_heads.lock().unwrap().len()
    }
}

#[async_trait]
impl ChangeReviewClient for ScriptedClient {
    async fn fetch(&self, _change: ChangeId) -> Result<ChangeSnapshot, TransportError> {
        *self.fetch_calls.lock().unwrap() += 1;
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(open_snapshot("head-1")))
    }

    async fn merge(
        &self,
        _change: ChangeId,
        head_ref: &str,
    ) -> Result<MergeResponse, TransportError> {
        self.merge_heads.lock().unwrap().push(head_ref.to_string());
        self.merges.lock().unwrap().pop_front().unwrap_or_else(merged_ok)
    }
}

/// Command runner keyed by program name. Queued results are consumed in
/// order; programs with nothing queued succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    results: Mutex<HashMap<String, VecDeque<Result<CommandOutput, String>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` runs of `program` exit with code 1 and `detail` on stderr.
    pub fn fail(self, program: &str, times: usize, detail: &str) -> Self {
        {
            let mut results = self.results.lock().unwrap();
            let queue = results.entry(program.to_string()).or_default();
            for _ in 0..times {
                queue.push_back(Err(detail.to_string()));
            }
        }
        self
    }

    /// Command lines run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(program))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(spec.to_string());
        let next = self
            .results
            .lock()
            .unwrap()
            .get_mut(&spec.program)
            .and_then(|q| q.pop_front());
        match next {
            Some(Err(detail)) => Err(CommandError::Exit {
                command: spec.to_string(),
                code: Some(1),
                detail,
            }),
            Some(Ok(output)) => Ok(output),
            None => Ok(CommandOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }
}
