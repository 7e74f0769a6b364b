use serde::{Deserialize, Serialize};

/// Per-domain protection overrides. `None` means "no explicit choice for
/// this domain" and defers to the global default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_ads: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_trackers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_scripts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_fingerprinting: Option<bool>,
}

impl ShieldState {
    /// True when no per-domain choice has been recorded at all.
    pub fn is_empty(&self) -> bool {
        self.block_ads.is_none()
            && self.block_trackers.is_none()
            && self.upgrade_https.is_none()
            && self.block_scripts.is_none()
            && self.block_fingerprinting.is_none()
    }

    /// Overlay `other`'s set fields onto self.
    pub fn merge(&mut self, other: &ShieldState) {
        if other.block_ads.is_some() {
            self.block_ads = other.block_ads;
        }
        if other.block_trackers.is_some() {
            self.block_trackers = other.block_trackers;
        }
        if other.upgrade_https.is_some() {
            self.upgrade_https = other.upgrade_https;
        }
        if other.block_scripts.is_some() {
            self.block_scripts = other.block_scripts;
        }
        if other.block_fingerprinting.is_some() {
            self.block_fingerprinting = other.block_fingerprinting;
        }
    }
}
