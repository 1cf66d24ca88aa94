use crate::*;
use std::{
    collections::{BTreeSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

enum Reply {
    Names(BTreeSet<String>),
    Fail,
    Hang,
}

struct Step {
    gate: Option<Arc<Notify>>,
    reply: Reply,
}

#[derive(Default)]
struct Script {
    keywords: Mutex<BTreeSet<String>>,
    keywords_hang: AtomicBool,
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

/// A [`MetadataSource`] answering each `fetch_schema_names` call with the next
/// scripted step. Clones share the script.
///
/// A gated step parks the fetch until its `Notify` fires, which lets tests
/// decide the order in which concurrent refreshes finish. An exhausted script
/// answers like a closed connection.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Script>,
}

fn names(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keywords the source advertises on every `fetch_keywords` call.
    pub fn with_keywords(self, keywords: &[&str]) -> Self {
        *self.script.keywords.lock().expect("script lock") = names(keywords);
        self
    }

    /// `fetch_keywords` never answers.
    pub fn with_hanging_keywords(self) -> Self {
        self.script.keywords_hang.store(true, Ordering::SeqCst);
        self
    }

    fn push(self, gate: Option<Arc<Notify>>, reply: Reply) -> Self {
        self.script
            .steps
            .lock()
            .expect("script lock")
            .push_back(Step { gate, reply });
        self
    }

    pub fn then_names(self, schema: &[&str]) -> Self {
        self.push(None, Reply::Names(names(schema)))
    }

    pub fn then_gated(self, gate: Arc<Notify>, schema: &[&str]) -> Self {
        self.push(Some(gate), Reply::Names(names(schema)))
    }

    pub fn then_fail(self) -> Self {
        self.push(None, Reply::Fail)
    }

    pub fn then_gated_fail(self, gate: Arc<Notify>) -> Self {
        self.push(Some(gate), Reply::Fail)
    }

    /// A fetch that never answers.
    pub fn then_hang(self) -> Self {
        self.push(None, Reply::Hang)
    }

    /// Number of `fetch_schema_names` calls that have started.
    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// Yield until at least `n` fetches have started.
    pub async fn started(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

impl MetadataSource for ScriptedSource {
    async fn fetch_schema_names(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        let step = self.script.steps.lock().expect("script lock").pop_front();
        self.script.calls.fetch_add(1, Ordering::SeqCst);

        let Some(step) = step else {
            return Err(MetadataError::Closed);
        };
        if let Some(gate) = step.gate {
            gate.notified().await;
        }
        match step.reply {
            Reply::Names(names) => Ok(names),
            Reply::Fail => Err(MetadataError::Closed),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn fetch_keywords(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        if self.script.keywords_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self.script.keywords.lock().expect("script lock").clone())
    }
}
