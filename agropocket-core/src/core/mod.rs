//! Internal domain modules for the AgroPocket core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod auth;
pub mod collection;
pub mod error;
pub mod history;
pub mod memory;
pub mod record;
pub mod settings;
pub mod storage;
pub mod summary;
pub mod user;
pub mod validation;
pub mod workspace;

#[doc(inline)]
pub use auth::{AuthStore, Session};
#[doc(inline)]
pub use collection::RecordStore;
#[doc(inline)]
pub use error::{AgroError, Result};
#[doc(inline)]
pub use history::{HistoryAction, HistoryEntry, HistoryFilter, HistoryKind, HistoryLog, HistoryStats};
#[doc(inline)]
pub use memory::MemoryStore;
#[doc(inline)]
pub use record::{
    AreaUnit, Crop, CropStatus, Harvest, HarvestQuality, Input, InputType, OwnedRecord, Record,
    RecordKind, UserOwned,
};
#[doc(inline)]
pub use settings::Settings;
#[doc(inline)]
pub use storage::{KeyValueStore, SqliteStore};
#[doc(inline)]
pub use summary::DashboardSummary;
#[doc(inline)]
pub use user::User;
#[doc(inline)]
pub use validation::{
    CropDraft, HarvestDraft, InputDraft, LoginForm, RegisterForm, Validate, ValidationErrors,
};
#[doc(inline)]
pub use workspace::Workspace;
