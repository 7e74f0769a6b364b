pub mod app_info;
pub mod events;
pub mod host;
pub mod ids;
pub mod shields;

pub use app_info::{AppInfo, ReleaseChannel};
pub use events::AppEvent;
pub use host::normalized_host;
pub use ids::TabId;
pub use shields::ShieldState;
