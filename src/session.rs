use log::{debug, info, warn};

use crate::auth::ApiKey;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::gateway::{FetchPayload, GatewayClient};
use crate::models::{DoraSummary, Insight, PipelineRun, Stats};
use crate::stats::compute_stats;
use crate::view::Tab;

/// User-facing message for a rejected key.
pub const INVALID_KEY_MESSAGE: &str = "Invalid API key. Please check and try again.";

/// User-facing message for transport/parse failures.
pub const CONNECTIVITY_MESSAGE: &str = "Failed to connect to API. Please try again.";

/// Where the session currently stands. Derived from `SessionState`, never
/// stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoggedOut,
    Loading,
    Ready,
}

/// Everything the presentation layer observes. A populated data set
/// without a credential is unrepresentable in practice: every mutation
/// that drops the credential also drops the data.
#[derive(Debug, Default)]
pub struct SessionState {
    pub credential: Option<ApiKey>,
    pub runs: Vec<PipelineRun>,
    pub insights: Vec<Insight>,
    pub dora: Option<DoraSummary>,
    pub stats: Stats,
    pub loading: bool,
    pub error: Option<String>,
    pub tab: Tab,
}

/// The one stateful orchestrator: credential lifecycle, fetch fan-out,
/// error recovery, and tab selection.
///
/// All mutation goes through `&mut self`, so credential updates serialize
/// and the final observed credential always matches the last call. Fetch
/// completions are tagged with a monotonic sequence number; anything but
/// the latest issued fetch is discarded on arrival, so a slow stale
/// response can never overwrite a newer one.
pub struct SessionController {
    store: CredentialStore,
    gateway: GatewayClient,
    state: SessionState,
    fetch_seq: u64,
}

impl SessionController {
    /// Build a controller, loading any credential persisted by a previous
    /// process.
    pub fn new(store: CredentialStore, gateway: GatewayClient) -> Self {
        let credential = store.load();
        if credential.is_some() {
            debug!("loaded persisted credential");
        }
        Self {
            store,
            gateway,
            state: SessionState {
                credential,
                ..SessionState::default()
            },
            fetch_seq: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn logged_in(&self) -> bool {
        self.state.credential.is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.state.credential.is_none() {
            Phase::LoggedOut
        } else if self.state.loading {
            Phase::Loading
        } else {
            Phase::Ready
        }
    }

    /// Accept a key from the user, persist it, and load the dashboard.
    /// Empty or whitespace input is silently ignored.
    pub async fn submit_credential(&mut self, input: &str) -> Result<()> {
        let token = input.trim();
        if token.is_empty() {
            debug!("ignoring empty API key submission");
            return Ok(());
        }

        let key = ApiKey::from(token);
        self.store.save(&key)?;
        self.state.credential = Some(key);
        info!("credential submitted, loading dashboard");
        self.run_fetch().await;
        Ok(())
    }

    /// Re-fetch everything. Currently displayed data stays visible until
    /// the new result resolves, so a slow or failing refresh never flashes
    /// an empty dashboard. No-op when logged out.
    pub async fn refresh(&mut self) {
        if self.state.credential.is_none() {
            debug!("refresh ignored while logged out");
            return;
        }
        self.run_fetch().await;
    }

    /// Drop the credential and all held data unconditionally.
    pub fn logout(&mut self) {
        self.store.clear();
        self.state = SessionState {
            tab: self.state.tab,
            ..SessionState::default()
        };
        info!("logged out");
    }

    /// Pure view-state transition; valid in any phase.
    pub fn select_tab(&mut self, tab: Tab) {
        self.state.tab = tab;
    }

    async fn run_fetch(&mut self) {
        let Some(key) = self.state.credential.clone() else {
            return;
        };
        let seq = self.begin_fetch();
        let outcome = self.gateway.fetch_all(&key).await;
        self.apply_fetch(seq, outcome);
    }

    fn begin_fetch(&mut self) -> u64 {
        self.fetch_seq += 1;
        self.state.loading = true;
        self.fetch_seq
    }

    fn apply_fetch(&mut self, seq: u64, outcome: Result<FetchPayload>) {
        if seq != self.fetch_seq {
            debug!(
                "discarding stale fetch result (seq {seq}, latest {})",
                self.fetch_seq
            );
            return;
        }
        self.state.loading = false;

        match outcome {
            Ok(payload) => {
                info!(
                    "fetched {} runs, {} insights",
                    payload.runs.len(),
                    payload.insights.len()
                );
                if payload.runs.is_empty() {
                    warn!("no pipeline runs returned");
                }
                self.state.stats = compute_stats(&payload.runs);
                self.state.runs = payload.runs;
                self.state.insights = payload.insights;
                self.state.dora = payload.dora;
                self.state.error = None;
            }
            Err(e) if e.is_connectivity() => {
                // Previously displayed data stays; a failing refresh must
                // not blank an already-working dashboard.
                warn!("fetch failed: {e}");
                self.state.error = Some(CONNECTIVITY_MESSAGE.to_string());
            }
            Err(_) => {
                // A rejected key must not keep showing another key's data.
                // The stored key itself stays until an explicit logout.
                warn!("API key rejected");
                self.state.runs = Vec::new();
                self.state.insights = Vec::new();
                self.state.dora = None;
                self.state.stats = Stats::default();
                self.state.error = Some(INVALID_KEY_MESSAGE.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PiqDashError;
    use crate::gateway::API_KEY_HEADER;
    use crate::models::RunStatus;
    use chrono::Utc;
    use mockito::{Matcher, Server, ServerGuard};
    use tempfile::TempDir;

    const KEY: &str = "piq_live_test_key";

    const RUNS_BODY: &str = r#"{"data":{"runs":[
        {"id":"run-1","repo_full_name":"acme/api","branch":"main","status":"success",
         "workflow_name":"ci","commit_message":"bump","duration_seconds":100,
         "created_at":"2026-07-01T12:00:00Z"},
        {"id":"run-2","repo_full_name":"acme/api","branch":"main","status":"failure",
         "workflow_name":"ci","commit_message":"wip","duration_seconds":200,
         "created_at":"2026-07-01T12:10:00Z"}
    ]}}"#;

    fn store(dir: &TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("piq_api_key"))
    }

    fn controller(dir: &TempDir, server: &ServerGuard) -> SessionController {
        SessionController::new(store(dir), GatewayClient::new(&server.url()).unwrap())
    }

    async fn mock_all(
        server: &mut ServerGuard,
        runs_status: usize,
        runs_body: &str,
    ) -> (mockito::Mock, mockito::Mock, mockito::Mock) {
        let runs = server
            .mock("GET", "/api/v1/pipelines/runs")
            .match_header(API_KEY_HEADER, KEY)
            .with_status(runs_status)
            .with_header("content-type", "application/json")
            .with_body(runs_body)
            .create_async()
            .await;
        let insights = server
            .mock("GET", "/api/v1/insights/")
            .match_query(Matcher::UrlEncoded("limit".into(), "20".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"insights":[]}}"#)
            .create_async()
            .await;
        let dora = server
            .mock("GET", "/api/v1/insights/dora")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;
        (runs, insights, dora)
    }

    fn sample_payload(run_count: usize) -> FetchPayload {
        let runs = (0..run_count)
            .map(|i| PipelineRun {
                id: format!("run-{i}"),
                repo_full_name: "acme/api".to_string(),
                branch: "main".to_string(),
                status: RunStatus::Success,
                workflow_name: "ci".to_string(),
                commit_message: "msg".to_string(),
                duration_seconds: 10,
                created_at: Utc::now(),
            })
            .collect();
        FetchPayload {
            runs,
            insights: Vec::new(),
            dora: None,
        }
    }

    #[tokio::test]
    async fn test_empty_submission_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let server = Server::new_async().await;
        let mut session = controller(&dir, &server);

        session.submit_credential("   ").await.unwrap();

        assert_eq!(session.phase(), Phase::LoggedOut);
        assert_eq!(store(&dir).load(), None);
        assert!(session.state().error.is_none());
    }

    #[tokio::test]
    async fn test_login_success_populates_state() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, RUNS_BODY).await;
        let mut session = controller(&dir, &server);

        session.submit_credential(KEY).await.unwrap();

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.state().runs.len(), 2);
        assert_eq!(session.state().stats.total_runs, 2);
        assert_eq!(session.state().stats.success_rate, 50);
        assert_eq!(session.state().stats.avg_duration, 150);
        assert!(session.state().error.is_none());
        assert_eq!(store(&dir).load(), Some(ApiKey::from(KEY)));
    }

    #[tokio::test]
    async fn test_login_trims_whitespace_before_saving() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, RUNS_BODY).await;
        let mut session = controller(&dir, &server);

        session
            .submit_credential(&format!("  {KEY}\n"))
            .await
            .unwrap();

        assert_eq!(store(&dir).load(), Some(ApiKey::from(KEY)));
    }

    #[tokio::test]
    async fn test_rejected_key_clears_data_but_keeps_credential() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, RUNS_BODY).await;
        let mut session = controller(&dir, &server);
        session.submit_credential(KEY).await.unwrap();
        assert_eq!(session.state().runs.len(), 2);

        server.reset_async().await;
        let _mocks = mock_all(&mut server, 401, r#"{"error":"unauthorized"}"#).await;
        session.refresh().await;

        assert_eq!(session.phase(), Phase::Ready);
        assert!(session.state().runs.is_empty());
        assert!(session.state().insights.is_empty());
        assert_eq!(session.state().stats, Stats::default());
        assert_eq!(session.state().error.as_deref(), Some(INVALID_KEY_MESSAGE));
        // The persisted key survives; only an explicit logout clears it.
        assert_eq!(store(&dir).load(), Some(ApiKey::from(KEY)));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_data() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, RUNS_BODY).await;
        let mut session = controller(&dir, &server);
        session.submit_credential(KEY).await.unwrap();

        server.reset_async().await;
        let _mocks = mock_all(&mut server, 200, "definitely not json").await;
        session.refresh().await;

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.state().runs.len(), 2);
        assert_eq!(session.state().stats.total_runs, 2);
        assert_eq!(
            session.state().error.as_deref(),
            Some(CONNECTIVITY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_first_fetch_failure_has_no_data_to_retain() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, "definitely not json").await;
        let mut session = controller(&dir, &server);

        session.submit_credential(KEY).await.unwrap();

        assert!(session.state().runs.is_empty());
        assert_eq!(
            session.state().error.as_deref(),
            Some(CONNECTIVITY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_successful_refresh_clears_prior_error() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, "definitely not json").await;
        let mut session = controller(&dir, &server);
        session.submit_credential(KEY).await.unwrap();
        assert!(session.state().error.is_some());

        server.reset_async().await;
        let _mocks = mock_all(&mut server, 200, RUNS_BODY).await;
        session.refresh().await;

        assert!(session.state().error.is_none());
        assert_eq!(session.state().runs.len(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let dir = TempDir::new().unwrap();
        let mut server = Server::new_async().await;
        let _mocks = mock_all(&mut server, 200, RUNS_BODY).await;
        let mut session = controller(&dir, &server);
        session.submit_credential(KEY).await.unwrap();

        session.logout();

        assert_eq!(session.phase(), Phase::LoggedOut);
        assert!(session.state().runs.is_empty());
        assert_eq!(session.state().stats, Stats::default());
        assert_eq!(store(&dir).load(), None);
    }

    #[tokio::test]
    async fn test_refresh_while_logged_out_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let server = Server::new_async().await;
        let mut session = controller(&dir, &server);

        session.refresh().await;

        assert_eq!(session.phase(), Phase::LoggedOut);
        assert!(session.state().error.is_none());
    }

    #[tokio::test]
    async fn test_select_tab_works_in_any_phase() {
        let dir = TempDir::new().unwrap();
        let server = Server::new_async().await;
        let mut session = controller(&dir, &server);

        session.select_tab(Tab::Dora);
        assert_eq!(session.state().tab, Tab::Dora);

        session.logout();
        assert_eq!(session.state().tab, Tab::Dora);
    }

    #[tokio::test]
    async fn test_stale_fetch_result_is_discarded() {
        let dir = TempDir::new().unwrap();
        let server = Server::new_async().await;
        let mut session = controller(&dir, &server);
        session.state.credential = Some(ApiKey::from(KEY));

        let first = session.begin_fetch();
        let second = session.begin_fetch();
        assert_eq!(session.phase(), Phase::Loading);

        // Newest completion lands first; the older one must not clobber it.
        session.apply_fetch(second, Ok(sample_payload(3)));
        assert_eq!(session.state().runs.len(), 3);

        session.apply_fetch(first, Ok(sample_payload(1)));
        assert_eq!(session.state().runs.len(), 3);
        assert_eq!(session.state().stats.total_runs, 3);
        assert!(!session.state().loading);
    }

    #[tokio::test]
    async fn test_stale_error_does_not_disturb_newer_success() {
        let dir = TempDir::new().unwrap();
        let server = Server::new_async().await;
        let mut session = controller(&dir, &server);
        session.state.credential = Some(ApiKey::from(KEY));

        let first = session.begin_fetch();
        let second = session.begin_fetch();

        session.apply_fetch(second, Ok(sample_payload(2)));
        session.apply_fetch(first, Err(PiqDashError::InvalidCredential));

        assert_eq!(session.state().runs.len(), 2);
        assert!(session.state().error.is_none());
    }
}
