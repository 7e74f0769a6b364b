use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use ember_core::AppInfo;
use ember_store::PrefsRepo;

/// Preference key holding the last-report triple.
pub const DAU_STAT_KEY: &str = "usage.dau_stat";

const SECONDS_IN_A_DAY: i64 = 86_400;
const SECONDS_IN_A_WEEK: i64 = 7 * 86_400;

/// Persisted record of the last engagement report.
/// Wire shape is a JSON array `[epoch_secs, month, year]`; anything else
/// reads as absent and triggers the first-report path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, u32, i32)", into = "(i64, u32, i32)")]
pub struct DauStat {
    pub last_epoch_secs: i64,
    pub month: u32,
    pub year: i32,
}

impl DauStat {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            last_epoch_secs: now.timestamp(),
            month: now.month(),
            year: now.year(),
        }
    }
}

impl From<(i64, u32, i32)> for DauStat {
    fn from((last_epoch_secs, month, year): (i64, u32, i32)) -> Self {
        Self {
            last_epoch_secs,
            month,
            year,
        }
    }
}

impl From<DauStat> for (i64, u32, i32) {
    fn from(stat: DauStat) -> Self {
        (stat.last_epoch_secs, stat.month, stat.year)
    }
}

/// Which reporting boundaries the current evaluation has crossed.
/// Periodic flags are independent and may all be true at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PingCadence {
    First,
    Periodic {
        daily: bool,
        weekly: bool,
        monthly: bool,
    },
}

impl PingCadence {
    pub fn compute(stat: Option<&DauStat>, now: DateTime<Utc>) -> Self {
        let Some(stat) = stat else {
            return Self::First;
        };
        let elapsed_secs = now.timestamp() - stat.last_epoch_secs;
        Self::Periodic {
            daily: elapsed_secs >= SECONDS_IN_A_DAY,
            weekly: elapsed_secs >= SECONDS_IN_A_WEEK,
            monthly: now.month() != stat.month || now.year() != stat.year,
        }
    }

    /// A first-ever evaluation always reports; a periodic one reports when
    /// at least one boundary has been crossed.
    pub fn should_send(&self) -> bool {
        match self {
            Self::First => true,
            Self::Periodic {
                daily,
                weekly,
                monthly,
            } => *daily || *weekly || *monthly,
        }
    }
}

/// One outbound engagement report.
#[derive(Clone, Debug)]
pub struct UsagePing {
    pub platform: &'static str,
    pub channel: String,
    pub version: String,
    pub cadence: PingCadence,
}

impl UsagePing {
    pub fn new(app: &AppInfo, cadence: PingCadence) -> Self {
        Self {
            platform: app.platform,
            channel: app.channel.to_string(),
            version: app.version.clone(),
            cadence,
        }
    }

    /// Query pairs in wire order. First-report pings carry no periodic
    /// flags; periodic pings carry all three.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("platform", self.platform.to_string()),
            ("channel", self.channel.clone()),
            ("version", self.version.clone()),
        ];
        match self.cadence {
            PingCadence::First => {
                pairs.push(("first", "true".to_string()));
            }
            PingCadence::Periodic {
                daily,
                weekly,
                monthly,
            } => {
                pairs.push(("first", "false".to_string()));
                pairs.push(("daily", daily.to_string()));
                pairs.push(("weekly", weekly.to_string()));
                pairs.push(("monthly", monthly.to_string()));
            }
        }
        pairs
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Outbound reporting seam. Production sends an HTTP GET; tests capture.
#[async_trait]
pub trait PingSender: Send + Sync {
    async fn send(&self, ping: &UsagePing) -> Result<(), PingError>;
}

/// Sends engagement pings to the update server. The response body is never
/// consumed; only transport-level failure is surfaced.
pub struct HttpPingSender {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpPingSender {
    pub fn new(endpoint: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Ember/1.0")
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }
}

#[async_trait]
impl PingSender for HttpPingSender {
    async fn send(&self, ping: &UsagePing) -> Result<(), PingError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(ping.query_pairs());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PingError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Decides, on each foreground transition, whether a day/week/month
/// reporting boundary has been crossed and fires at most one report.
pub struct UsageTracker {
    prefs: PrefsRepo,
    sender: Arc<dyn PingSender>,
    app: AppInfo,
}

impl UsageTracker {
    pub fn new(prefs: PrefsRepo, sender: Arc<dyn PingSender>, app: AppInfo) -> Self {
        Self { prefs, sender, app }
    }

    /// Evaluate the cadence at `now`. When a boundary has been crossed the
    /// fresh triple is persisted first, then the report is sent
    /// fire-and-forget on a spawned task (the returned handle exists for
    /// tests; production discards it). A failed send is logged, never
    /// retried, and never rolls the triple back.
    #[instrument(skip(self))]
    pub fn evaluate(&self, now: DateTime<Utc>) -> Option<tokio::task::JoinHandle<()>> {
        let stat = self
            .prefs
            .get_json::<DauStat>(DAU_STAT_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to read usage stat, treating as first report");
                None
            });

        let cadence = PingCadence::compute(stat.as_ref(), now);
        if !cadence.should_send() {
            debug!("usage cadence not reached");
            return None;
        }

        if let Err(e) = self.prefs.set_json(DAU_STAT_KEY, &DauStat::at(now)) {
            warn!(error = %e, "failed to persist usage stat");
        }

        let ping = UsagePing::new(&self.app, cadence);
        let sender = Arc::clone(&self.sender);
        Some(tokio::spawn(async move {
            if let Err(e) = sender.send(&ping).await {
                warn!(error = %e, "usage ping failed");
            }
        }))
    }
}
