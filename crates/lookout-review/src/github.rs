use std::sync::Arc;

use async_trait::async_trait;
use lookout_core::{LookoutError, PullRequestContext};
use serde::Deserialize;

use crate::jwt::AppJwtIssuer;

const USER_AGENT: &str = "lookout-review-bot";

/// The hosting platform as seen by the review pipeline.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch the unified diff of the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] on network or API errors.
    async fn fetch_diff(&self, pr: &PullRequestContext) -> Result<String, LookoutError>;

    /// Post `body` as a top-level comment on the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] on network or API errors.
    async fn post_comment(&self, pr: &PullRequestContext, body: &str) -> Result<(), LookoutError>;

    /// Delete earlier comments whose body contains `marker`; returns how many.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] on network or API errors.
    async fn delete_previous_reviews(
        &self,
        pr: &PullRequestContext,
        marker: &str,
    ) -> Result<usize, LookoutError>;
}

/// GitHub REST client authenticating as a GitHub App.
///
/// Each call signs a fresh app JWT. When the pull request carries an
/// installation id the JWT is exchanged for an installation token first;
/// otherwise the JWT itself is the bearer token.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    issuer: Arc<AppJwtIssuer>,
}

#[derive(Deserialize)]
struct InstallationToken {
    token: String,
}

impl GitHubClient {
    /// Create a client for the API rooted at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] if the HTTP client cannot be built.
    pub fn new(api_url: &str, issuer: Arc<AppJwtIssuer>) -> Result<Self, LookoutError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookoutError::GitHub(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            issuer,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    async fn token(&self, pr: &PullRequestContext) -> Result<String, LookoutError> {
        let jwt = self.issuer.issue()?;
        let Some(installation_id) = pr.installation_id else {
            return Ok(jwt);
        };

        let response = self
            .http
            .post(self.url(&format!("/app/installations/{installation_id}/access_tokens")))
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&jwt)
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to request installation token: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookoutError::GitHub(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        let token: InstallationToken = response
            .json()
            .await
            .map_err(|e| LookoutError::GitHub(format!("invalid installation token response: {e}")))?;
        Ok(token.token)
    }

    async fn octocrab(&self, pr: &PullRequestContext) -> Result<octocrab::Octocrab, LookoutError> {
        let token = self.token(pr).await?;
        octocrab::Octocrab::builder()
            .base_uri(self.api_url.as_str())
            .map_err(|e| LookoutError::GitHub(format!("invalid API url {}: {e}", self.api_url)))?
            .personal_token(token)
            .build()
            .map_err(|e| LookoutError::GitHub(format!("failed to create GitHub client: {e}")))
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn fetch_diff(&self, pr: &PullRequestContext) -> Result<String, LookoutError> {
        let token = self.token(pr).await?;
        let url = self.url(&format!(
            "/repos/{}/{}/pulls/{}",
            pr.owner, pr.repo, pr.pr_number
        ));

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3.diff")
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to fetch PR diff: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookoutError::GitHub(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to read diff response: {e}")))
    }

    async fn post_comment(&self, pr: &PullRequestContext, body: &str) -> Result<(), LookoutError> {
        let octocrab = self.octocrab(pr).await?;
        octocrab
            .issues(&pr.owner, &pr.repo)
            .create_comment(pr.pr_number, body)
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to post review comment: {e}")))?;
        Ok(())
    }

    async fn delete_previous_reviews(
        &self,
        pr: &PullRequestContext,
        marker: &str,
    ) -> Result<usize, LookoutError> {
        let octocrab = self.octocrab(pr).await?;
        let issues = octocrab.issues(&pr.owner, &pr.repo);

        let first_page = issues
            .list_comments(pr.pr_number)
            .per_page(100)
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to list comments: {e}")))?;
        let comments = octocrab
            .all_pages(first_page)
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to list comments: {e}")))?;

        let mut deleted = 0;
        for comment in comments {
            if !comment.body.as_deref().is_some_and(|b| b.contains(marker)) {
                continue;
            }
            issues
                .delete_comment(comment.id)
                .await
                .map_err(|e| LookoutError::GitHub(format!("failed to delete comment: {e}")))?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`LookoutError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use lookout_review::github::parse_pr_reference;
///
/// let (owner, repo, num) = parse_pr_reference("octocat/hello-world#42").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert_eq!(num, 42);
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<(String, String, u64), LookoutError> {
    let invalid = || {
        LookoutError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        ))
    };
    let (owner_repo, number_str) = pr_ref.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = owner_repo.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number: u64 = number_str
        .parse()
        .map_err(|_| LookoutError::Config(format!("invalid PR number: {number_str}")))?;
    Ok((owner.to_string(), repo.to_string(), number))
}
