use log::debug;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::auth::ApiKey;
use crate::error::{PiqDashError, Result};
use crate::models::{DoraSummary, Insight, PipelineRun};

/// Header carrying the credential on every request.
pub const API_KEY_HEADER: &str = "X-PipelineIQ-Key";

/// Fixed page size for the insights listing.
pub const INSIGHTS_PAGE_SIZE: u32 = 20;

const RUNS_PATH: &str = "api/v1/pipelines/runs";
const INSIGHTS_PATH: &str = "api/v1/insights/";
const DORA_PATH: &str = "api/v1/insights/dora";

/// Everything one refresh brings back. Insights and the DORA summary are
/// independently optional; the runs endpoint is the authentication signal.
#[derive(Debug)]
pub struct FetchPayload {
    pub runs: Vec<PipelineRun>,
    pub insights: Vec<Insight>,
    pub dora: Option<DoraSummary>,
}

pub struct GatewayClient {
    client: Client,
    runs_url: Url,
    insights_url: Url,
    dora_url: Url,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("piqdash/0.1.0")
            .build()
            .map_err(|e| PiqDashError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(base_url)
            .map_err(|e| PiqDashError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            runs_url: join(&base, RUNS_PATH)?,
            insights_url: join(&base, INSIGHTS_PATH)?,
            dora_url: join(&base, DORA_PATH)?,
        })
    }

    /// Helper to build authenticated requests
    fn authed(&self, request: reqwest::RequestBuilder, key: &ApiKey) -> reqwest::RequestBuilder {
        request.header(API_KEY_HEADER, key.as_str())
    }

    /// Fetch runs, insights, and the DORA summary in one concurrent sweep.
    ///
    /// The three requests fire in parallel purely for latency; their
    /// completions are joined before anything is returned. A non-success
    /// status on the runs endpoint means the key was rejected and the other
    /// two results are discarded. Transport failures and malformed bodies
    /// surface as errors; a non-success status on the insights or DORA
    /// endpoint only degrades that slice to empty/absent.
    pub async fn fetch_all(&self, key: &ApiKey) -> Result<FetchPayload> {
        debug!("fetching runs, insights, and DORA summary");

        let runs_req = self.authed(self.client.get(self.runs_url.clone()), key).send();
        let insights_req = self
            .authed(self.client.get(self.insights_url.clone()), key)
            .query(&[("limit", INSIGHTS_PAGE_SIZE)])
            .send();
        let dora_req = self.authed(self.client.get(self.dora_url.clone()), key).send();

        let (runs_res, insights_res, dora_res) = tokio::join!(runs_req, insights_req, dora_req);

        let runs_resp = runs_res?;
        if !runs_resp.status().is_success() {
            debug!("runs endpoint returned {}", runs_resp.status());
            return Err(PiqDashError::InvalidCredential);
        }
        let runs = serde_json::from_value::<RunsEnvelope>(read_json(runs_resp).await?)
            .map(RunsEnvelope::into_runs)
            .unwrap_or_default();

        let insights = match insights_res {
            Ok(resp) if resp.status().is_success() => {
                serde_json::from_value::<InsightsEnvelope>(read_json(resp).await?)
                    .map(InsightsEnvelope::into_insights)
                    .unwrap_or_default()
            }
            Ok(resp) => {
                debug!("insights endpoint returned {}", resp.status());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let dora = match dora_res {
            Ok(resp) if resp.status().is_success() => {
                serde_json::from_value::<DoraEnvelope>(read_json(resp).await?)
                    .ok()
                    .and_then(DoraEnvelope::into_summary)
            }
            Ok(resp) => {
                debug!("DORA endpoint returned {}", resp.status());
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(FetchPayload {
            runs,
            insights,
            dora,
        })
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| PiqDashError::Config(format!("Invalid endpoint URL: {e}")))
}

/// A body that is not JSON at all is a connectivity-class failure, unlike
/// a JSON body of the wrong shape, which callers degrade to empty.
async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value> {
    let text = resp.text().await?;
    Ok(serde_json::from_str(&text)?)
}

// The backend wraps list payloads in one of several envelopes: a nested
// `data.runs` / `data.insights` object, a flat `data` list, or nothing
// usable at all. Untagged unions try the shapes in order; a mismatch
// falls through to the empty case instead of failing the fetch.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunsEnvelope {
    Nested { data: RunsBody },
    Empty {},
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunsBody {
    Keyed { runs: Vec<PipelineRun> },
    Flat(Vec<PipelineRun>),
}

impl RunsEnvelope {
    fn into_runs(self) -> Vec<PipelineRun> {
        match self {
            Self::Nested {
                data: RunsBody::Keyed { runs },
            }
            | Self::Nested {
                data: RunsBody::Flat(runs),
            } => runs,
            Self::Empty {} => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InsightsEnvelope {
    Nested { data: InsightsBody },
    Empty {},
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InsightsBody {
    Keyed { insights: Vec<Insight> },
    Flat(Vec<Insight>),
}

impl InsightsEnvelope {
    fn into_insights(self) -> Vec<Insight> {
        match self {
            Self::Nested {
                data: InsightsBody::Keyed { insights },
            }
            | Self::Nested {
                data: InsightsBody::Flat(insights),
            } => insights,
            Self::Empty {} => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DoraEnvelope {
    Wrapped { data: DoraSummary },
    Empty {},
}

impl DoraEnvelope {
    fn into_summary(self) -> Option<DoraSummary> {
        match self {
            Self::Wrapped { data } => Some(data),
            Self::Empty {} => None,
        }
    }
}
