//! The subset of the `pull_request` webhook payload the bot reads.

use lookout_core::PullRequestContext;
use serde::Deserialize;

/// Actions that trigger a review.
pub const REVIEWABLE_ACTIONS: [&str; 3] = ["opened", "synchronize", "reopened"];

/// Top level of a `pull_request` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// `opened`, `synchronize`, `closed`, ...
    pub action: String,
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
    /// Present when the event was delivered to a GitHub App installation.
    #[serde(default)]
    pub installation: Option<InstallationPayload>,
}

/// The `pull_request` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub user: AccountPayload,
    pub base: BranchPayload,
    pub head: BranchPayload,
}

/// `base` or `head` of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub sha: String,
}

/// The `repository` object.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub name: String,
    pub owner: AccountPayload,
}

/// A user or organization.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPayload {
    pub login: String,
}

/// The `installation` object.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationPayload {
    pub id: u64,
}

impl PullRequestEvent {
    /// Convert into the context the review pipeline works with.
    pub fn into_context(self) -> PullRequestContext {
        let pr = self.pull_request;
        PullRequestContext {
            owner: self.repository.owner.login,
            repo: self.repository.name,
            pr_number: pr.number,
            title: pr.title,
            description: pr.body.filter(|b| !b.trim().is_empty()),
            author_login: pr.user.login,
            base_ref: pr.base.git_ref,
            head_ref: pr.head.git_ref,
            commit_sha: pr.head.sha,
            installation_id: self.installation.map(|i| i.id),
        }
    }
}

/// Whether `action` should start a review.
pub fn is_reviewable_action(action: &str) -> bool {
    REVIEWABLE_ACTIONS.contains(&action)
}
