use serde::{Deserialize, Serialize};

/// Application lifecycle events delivered over the process-wide broadcast
/// channel. Emitted by the platform shell, consumed by the launcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AppEvent {
    #[serde(rename = "will_enter_foreground")]
    WillEnterForeground,

    #[serde(rename = "did_enter_background")]
    DidEnterBackground,

    #[serde(rename = "will_terminate")]
    WillTerminate,
}

impl AppEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WillEnterForeground => "will_enter_foreground",
            Self::DidEnterBackground => "did_enter_background",
            Self::WillTerminate => "will_terminate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(AppEvent::WillEnterForeground).unwrap();
        assert_eq!(json["type"], "will_enter_foreground");
    }

    #[test]
    fn event_type_matches_serde_tag() {
        for event in [
            AppEvent::WillEnterForeground,
            AppEvent::DidEnterBackground,
            AppEvent::WillTerminate,
        ] {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }
}
