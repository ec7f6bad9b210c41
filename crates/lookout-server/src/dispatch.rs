use std::sync::Arc;

use lookout_core::PullRequestContext;
use lookout_review::pipeline::ReviewOrchestrator;

/// Hands a pull request off for review without waiting for it.
pub trait ReviewDispatcher: Send + Sync {
    /// Start reviewing `pr`; must return without awaiting the review.
    fn dispatch(&self, pr: PullRequestContext);
}

/// Runs each review as its own tokio task.
///
/// Tasks are detached; if the process exits, in-flight reviews are dropped.
pub struct OrchestratorDispatcher {
    orchestrator: Arc<ReviewOrchestrator>,
}

impl OrchestratorDispatcher {
    /// Must be called inside a tokio runtime, since dispatch spawns tasks.
    pub fn new(orchestrator: Arc<ReviewOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

impl ReviewDispatcher for OrchestratorDispatcher {
    fn dispatch(&self, pr: PullRequestContext) {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            orchestrator.process_pull_request(pr).await;
        });
    }
}
