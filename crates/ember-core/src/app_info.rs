use serde::{Deserialize, Serialize};

/// Release channel reported in the engagement ping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseChannel {
    Stable,
    Beta,
}

impl std::fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Beta => write!(f, "beta"),
        }
    }
}

impl std::str::FromStr for ReleaseChannel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            other => Err(format!("unknown release channel: {other}")),
        }
    }
}

/// Identity of the running build, threaded into outbound reporting.
#[derive(Clone, Debug)]
pub struct AppInfo {
    pub version: String,
    pub channel: ReleaseChannel,
    pub platform: &'static str,
}

impl AppInfo {
    pub fn new(version: impl Into<String>, channel: ReleaseChannel) -> Self {
        Self {
            version: version.into(),
            channel,
            platform: "ios",
        }
    }

    pub fn is_release(&self) -> bool {
        self.channel == ReleaseChannel::Stable
    }
}
