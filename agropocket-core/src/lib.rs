//! Core library for AgroPocket, a local-first farm record keeper.
//!
//! The primary entry point is [`Workspace`], which opens a key-value medium
//! (an SQLite file or memory) and exposes accounts, crops, inputs, harvests and
//! the activity history. Every record operation takes an explicit [`Session`];
//! records are partitioned per user and never visible across accounts.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    auth::{AuthStore, Session},
    collection::RecordStore,
    error::{AgroError, Result},
    history::{HistoryAction, HistoryEntry, HistoryFilter, HistoryKind, HistoryLog, HistoryStats},
    memory::MemoryStore,
    record::{
        AreaUnit, Crop, CropStatus, Harvest, HarvestQuality, Input, InputType, OwnedRecord,
        Record, RecordKind, UserOwned,
    },
    settings::{
        default_data_file, load_settings, load_settings_from, save_settings, save_settings_to,
        settings_file_path, Settings,
    },
    storage::{read_json, write_json, KeyValueStore, SqliteStore},
    summary::DashboardSummary,
    user::{hash_password, normalize_email, User},
    validation::{
        is_valid_email, CropDraft, FieldError, HarvestDraft, InputDraft, LoginForm, RegisterForm,
        Validate, ValidationErrors, MIN_PASSWORD_LEN,
    },
    workspace::Workspace,
};
