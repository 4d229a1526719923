//! High-level farm-record operations over one key-value medium.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use crate::core::validation::{LoginForm, RegisterForm, Validate};
use crate::{
    AgroError, AuthStore, Crop, CropDraft, DashboardSummary, Harvest, HarvestDraft,
    HistoryAction, HistoryEntry, HistoryFilter, HistoryLog, HistoryStats, Input, InputDraft,
    KeyValueStore, MemoryStore, OwnedRecord, RecordStore, Result, Session, Settings,
    SqliteStore, User,
};

/// Identity fields a saved record keeps across edits.
struct RecordMeta {
    id: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

/// An open AgroPocket workspace.
///
/// `Workspace` bundles the [`AuthStore`], one [`RecordStore`] per record kind
/// and the [`HistoryLog`] over a single [`KeyValueStore`]. The `save_*` and
/// `delete_*` methods validate drafts, assign ids and timestamps, and record
/// every change in the history log; the stores themselves are reachable for
/// callers that need the raw list/upsert/remove operations.
pub struct Workspace {
    store: Box<dyn KeyValueStore>,
    settings: Settings,
    auth: AuthStore,
    crops: RecordStore<Crop>,
    inputs: RecordStore<Input>,
    harvests: RecordStore<Harvest>,
    history: HistoryLog,
}

impl Workspace {
    /// Opens (or creates) the SQLite data file at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`AgroError::InvalidStore`] if `path` is some other SQLite
    /// database, or [`AgroError::Database`] for any SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Settings {
            data_file: path.as_ref().to_string_lossy().to_string(),
            ..Settings::default()
        };
        Self::open_with_settings(settings)
    }

    /// Opens (or creates) the data file named in `settings`.
    pub fn open_with_settings(settings: Settings) -> Result<Self> {
        let store = SqliteStore::open_or_create(&settings.data_file)?;
        log::info!("opened data file {}", settings.data_file);
        Self::with_store(store, settings)
    }

    /// A workspace that keeps everything in memory.
    pub fn in_memory() -> Result<Self> {
        Self::with_store(MemoryStore::new(), Settings::default())
    }

    /// Wraps an existing medium, moving any legacy cross-user collections into
    /// per-user partitions first.
    pub fn with_store<S: KeyValueStore + 'static>(store: S, settings: Settings) -> Result<Self> {
        let prefix = settings.key_prefix.as_str();
        let ws = Self {
            store: Box::new(store),
            auth: AuthStore::new(prefix),
            crops: RecordStore::new(prefix),
            inputs: RecordStore::new(prefix),
            harvests: RecordStore::new(prefix),
            history: HistoryLog::new(prefix),
            settings,
        };
        ws.migrate_legacy_layout()?;
        Ok(ws)
    }

    fn migrate_legacy_layout(&self) -> Result<()> {
        let kv = self.kv();
        let moved = self.crops.migrate_legacy(kv)?
            + self.inputs.migrate_legacy(kv)?
            + self.harvests.migrate_legacy(kv)?
            + self.history.migrate_legacy(kv)?;
        if moved > 0 {
            log::info!("moved {moved} records into per-user partitions");
        }
        Ok(())
    }

    pub fn kv(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn crop_store(&self) -> &RecordStore<Crop> {
        &self.crops
    }

    pub fn input_store(&self) -> &RecordStore<Input> {
        &self.inputs
    }

    pub fn harvest_store(&self) -> &RecordStore<Harvest> {
        &self.harvests
    }

    pub fn history_log(&self) -> &HistoryLog {
        &self.history
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Registers a new account and signs it in. See [`AuthStore::register`].
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        self.auth.register(self.kv(), name, email, password)
    }

    /// Validates the sign-up form, then registers.
    ///
    /// # Errors
    ///
    /// Returns [`AgroError::Validation`] before touching storage if the form is
    /// invalid, otherwise as [`register`](Self::register).
    pub fn register_form(&self, form: &RegisterForm) -> Result<User> {
        form.validate().map_err(AgroError::Validation)?;
        self.register(form.name.trim(), &form.email, &form.password)
    }

    /// Signs in. See [`AuthStore::login`].
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        self.auth.login(self.kv(), email, password)
    }

    /// Validates the login form, then signs in.
    pub fn login_form(&self, form: &LoginForm) -> Result<User> {
        form.validate().map_err(AgroError::Validation)?;
        self.login(&form.email, &form.password)
    }

    pub fn logout(&self) -> Result<()> {
        self.auth.logout(self.kv())
    }

    pub fn current_user(&self) -> Result<Option<User>> {
        self.auth.current_user(self.kv())
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        self.auth.is_authenticated(self.kv())
    }

    /// The session for whoever is currently signed in.
    pub fn session(&self) -> Result<Session> {
        self.auth.current_session(self.kv())
    }

    // ── Crops ────────────────────────────────────────────────────────

    pub fn crops(&self, session: &Session) -> Result<Vec<Crop>> {
        self.crops.list(self.kv(), session)
    }

    pub fn get_crop(&self, session: &Session, id: &str) -> Result<Option<Crop>> {
        self.crops.get(self.kv(), session, id)
    }

    /// Creates a crop (`id == None`) or updates the session user's crop `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AgroError::Validation`] for an invalid draft,
    /// [`AgroError::NotAuthenticated`] for an anonymous session and
    /// [`AgroError::RecordNotFound`] if `id` names no crop of the session user.
    pub fn save_crop(&self, session: &Session, id: Option<&str>, draft: CropDraft) -> Result<Crop> {
        draft.validate().map_err(AgroError::Validation)?;
        self.save_with_history(&self.crops, session, id, |meta| Crop {
            id: meta.id,
            user_id: meta.user_id,
            name: draft.name.trim().to_string(),
            area: draft.area,
            area_unit: draft.area_unit,
            planting_date: draft.planting_date,
            status: draft.status,
            notes: non_empty(draft.notes),
            created_at: meta.created_at,
        })
    }

    /// Deletes a crop. Harvests that reference it are left as they are.
    pub fn delete_crop(&self, session: &Session, id: &str) -> Result<Option<Crop>> {
        self.delete_with_history(&self.crops, session, id)
    }

    // ── Inputs ───────────────────────────────────────────────────────

    pub fn inputs(&self, session: &Session) -> Result<Vec<Input>> {
        self.inputs.list(self.kv(), session)
    }

    pub fn get_input(&self, session: &Session, id: &str) -> Result<Option<Input>> {
        self.inputs.get(self.kv(), session, id)
    }

    /// Creates or updates an input; errors as [`save_crop`](Self::save_crop).
    pub fn save_input(&self, session: &Session, id: Option<&str>, draft: InputDraft) -> Result<Input> {
        draft.validate().map_err(AgroError::Validation)?;
        self.save_with_history(&self.inputs, session, id, |meta| Input {
            id: meta.id,
            user_id: meta.user_id,
            name: draft.name.trim().to_string(),
            input_type: draft.input_type,
            quantity: draft.quantity,
            unit: draft.unit.trim().to_string(),
            cost: draft.cost,
            purchase_date: draft.purchase_date,
            supplier: non_empty(draft.supplier),
            notes: non_empty(draft.notes),
            created_at: meta.created_at,
        })
    }

    pub fn delete_input(&self, session: &Session, id: &str) -> Result<Option<Input>> {
        self.delete_with_history(&self.inputs, session, id)
    }

    // ── Harvests ─────────────────────────────────────────────────────

    pub fn harvests(&self, session: &Session) -> Result<Vec<Harvest>> {
        self.harvests.list(self.kv(), session)
    }

    pub fn get_harvest(&self, session: &Session, id: &str) -> Result<Option<Harvest>> {
        self.harvests.get(self.kv(), session, id)
    }

    /// Records or updates a harvest; errors as [`save_crop`](Self::save_crop).
    ///
    /// When the referenced crop exists its current name is snapshotted into
    /// `crop_name`; otherwise the draft's `crop_name` is kept.
    pub fn save_harvest(
        &self,
        session: &Session,
        id: Option<&str>,
        draft: HarvestDraft,
    ) -> Result<Harvest> {
        draft.validate().map_err(AgroError::Validation)?;
        let crop_name = match self.get_crop(session, &draft.crop_id)? {
            Some(crop) => crop.name,
            None => draft.crop_name,
        };
        self.save_with_history(&self.harvests, session, id, |meta| Harvest {
            id: meta.id,
            user_id: meta.user_id,
            crop_id: draft.crop_id,
            crop_name,
            quantity: draft.quantity,
            unit: draft.unit.trim().to_string(),
            harvest_date: draft.harvest_date,
            quality: draft.quality,
            notes: non_empty(draft.notes),
            created_at: meta.created_at,
        })
    }

    pub fn delete_harvest(&self, session: &Session, id: &str) -> Result<Option<Harvest>> {
        self.delete_with_history(&self.harvests, session, id)
    }

    /// Resolves a harvest's crop. `None` when the crop has been deleted.
    pub fn crop_for_harvest(&self, session: &Session, harvest: &Harvest) -> Result<Option<Crop>> {
        self.get_crop(session, &harvest.crop_id)
    }

    // ── History & reporting ──────────────────────────────────────────

    /// The session user's history in the order it was written.
    pub fn history(&self, session: &Session) -> Result<Vec<HistoryEntry>> {
        self.history.list(self.kv(), session)
    }

    /// History entries matching `filter`, newest first.
    pub fn history_filtered(
        &self,
        session: &Session,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryEntry>> {
        self.history.list_filtered(self.kv(), session, filter)
    }

    pub fn history_stats(&self, session: &Session) -> Result<HistoryStats> {
        Ok(HistoryStats::from_entries(&self.history(session)?))
    }

    /// Dashboard totals for the session user, with "recent" measured from today's local date.
    pub fn summary(&self, session: &Session) -> Result<DashboardSummary> {
        Ok(DashboardSummary::compute(
            &self.crops(session)?,
            &self.inputs(session)?,
            &self.harvests(session)?,
            &self.history(session)?,
            Local::now().date_naive(),
            self.settings.recent_harvest_days,
            self.settings.recent_activity_limit,
        ))
    }

    // ── Shared write paths ───────────────────────────────────────────

    fn save_with_history<T: OwnedRecord>(
        &self,
        store: &RecordStore<T>,
        session: &Session,
        id: Option<&str>,
        build: impl FnOnce(RecordMeta) -> T,
    ) -> Result<T> {
        let user_id = session.user_id().ok_or(AgroError::NotAuthenticated)?;
        let (meta, action) = match id {
            Some(id) => {
                let existing = store
                    .get(self.kv(), session, id)?
                    .ok_or_else(|| AgroError::RecordNotFound(id.to_string()))?;
                let meta = RecordMeta {
                    id: existing.id().to_string(),
                    user_id: existing.user_id().to_string(),
                    created_at: existing.created_at(),
                };
                (meta, HistoryAction::Updated)
            }
            None => {
                let meta = RecordMeta {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    created_at: Utc::now(),
                };
                (meta, HistoryAction::Created)
            }
        };

        let record = build(meta);
        store.upsert(self.kv(), session, record.clone())?;
        self.history.append(
            self.kv(),
            session,
            T::KIND.history_kind(),
            action,
            T::KIND.describe(action, record.label()),
            Some(record.id()),
        )?;
        Ok(record)
    }

    fn delete_with_history<T: OwnedRecord>(
        &self,
        store: &RecordStore<T>,
        session: &Session,
        id: &str,
    ) -> Result<Option<T>> {
        let removed = store.remove_by_id(self.kv(), session, id)?;
        if let Some(record) = &removed {
            self.history.append(
                self.kv(),
                session,
                T::KIND.history_kind(),
                HistoryAction::Deleted,
                T::KIND.describe(HistoryAction::Deleted, record.label()),
                Some(record.id()),
            )?;
        }
        Ok(removed)
    }
}

/// Trims optional free text, dropping it entirely when blank.
fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
