pub mod database;
pub mod error;
pub mod prefs;
pub mod schema;
pub mod shields;

pub use database::Database;
pub use error::StoreError;
pub use prefs::PrefsRepo;
pub use shields::ShieldSettingsRepo;
