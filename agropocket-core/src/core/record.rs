//! Farm record types: crops, inputs and harvests.
//!
//! All three kinds are persisted as camelCase JSON objects with lowercase
//! enum values, e.g.
//!
//! ```json
//! {"id":"…","userId":"…","name":"Corn","area":10.0,"areaUnit":"hectare",
//!  "plantingDate":"2025-03-01","status":"planted","createdAt":"2025-03-01T08:00:00Z"}
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::history::{HistoryAction, HistoryKind};

/// Unit in which a crop's planted area is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    Hectare,
    Acre,
    M2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    Planted,
    Growing,
    Harvested,
    Failed,
}

impl CropStatus {
    /// Planted and growing crops are still in the field.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Planted | Self::Growing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Fertilizer,
    Pesticide,
    Seed,
    Equipment,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub area: f64,
    pub area_unit: AreaUnit,
    pub planting_date: NaiveDate,
    pub status: CropStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A purchased farm input such as fertiliser, seed or equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub quantity: f64,
    pub unit: String,
    pub cost: f64,
    pub purchase_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A harvest taken from a crop.
///
/// `crop_name` is a snapshot taken when the harvest was recorded. `crop_id`
/// is not kept in sync with the crop collection and may point at a crop that
/// has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Harvest {
    pub id: String,
    pub user_id: String,
    pub crop_id: String,
    pub crop_name: String,
    pub quantity: f64,
    pub unit: String,
    pub harvest_date: NaiveDate,
    pub quality: HarvestQuality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The closed set of user-owned record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Crop,
    Input,
    Harvest,
}

impl RecordKind {
    /// Name of the collection this kind is stored under, before the key prefix.
    #[must_use]
    pub fn collection_name(self) -> &'static str {
        match self {
            Self::Crop => "crops",
            Self::Input => "inputs",
            Self::Harvest => "harvests",
        }
    }

    /// Singular noun used in history descriptions.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Input => "input",
            Self::Harvest => "harvest",
        }
    }

    /// History description for `action` on a record labelled `label`, e.g. `"Deleted crop: Corn"`.
    #[must_use]
    pub fn describe(self, action: HistoryAction, label: &str) -> String {
        let verb = match (self, action) {
            (Self::Harvest, HistoryAction::Created) => "Recorded",
            (_, HistoryAction::Created) => "Created",
            (_, HistoryAction::Updated) => "Updated",
            (_, HistoryAction::Deleted) => "Deleted",
        };
        format!("{verb} {}: {label}", self.noun())
    }

    #[must_use]
    pub fn history_kind(self) -> HistoryKind {
        match self {
            Self::Crop => HistoryKind::Crop,
            Self::Input => HistoryKind::Input,
            Self::Harvest => HistoryKind::Harvest,
        }
    }
}

/// Anything persisted in a per-user partition.
pub trait UserOwned {
    fn id(&self) -> &str;

    /// Id of the user who owns this value.
    fn user_id(&self) -> &str;
}

/// Behaviour shared by every record a [`RecordStore`](crate::RecordStore) can hold.
pub trait OwnedRecord: UserOwned + Clone + Serialize + DeserializeOwned {
    const KIND: RecordKind;

    /// Text used for this record in history descriptions.
    fn label(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_owned_record {
    ($ty:ty, $kind:expr, $label:ident) => {
        impl UserOwned for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn user_id(&self) -> &str {
                &self.user_id
            }
        }

        impl OwnedRecord for $ty {
            const KIND: RecordKind = $kind;

            fn label(&self) -> &str {
                &self.$label
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

impl_owned_record!(Crop, RecordKind::Crop, name);
impl_owned_record!(Input, RecordKind::Input, name);
impl_owned_record!(Harvest, RecordKind::Harvest, crop_name);

/// Any one of the user-owned records, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Crop(Crop),
    Input(Input),
    Harvest(Harvest),
}

impl Record {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Crop(_) => RecordKind::Crop,
            Self::Input(_) => RecordKind::Input,
            Self::Harvest(_) => RecordKind::Harvest,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Crop(r) => r.id(),
            Self::Input(r) => r.id(),
            Self::Harvest(r) => r.id(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Crop(r) => r.user_id(),
            Self::Input(r) => r.user_id(),
            Self::Harvest(r) => r.user_id(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Crop(r) => r.label(),
            Self::Input(r) => r.label(),
            Self::Harvest(r) => r.label(),
        }
    }
}

impl From<Crop> for Record {
    fn from(crop: Crop) -> Self {
        Self::Crop(crop)
    }
}

impl From<Input> for Record {
    fn from(input: Input) -> Self {
        Self::Input(input)
    }
}

impl From<Harvest> for Record {
    fn from(harvest: Harvest) -> Self {
        Self::Harvest(harvest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_crop() -> Crop {
        Crop {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            name: "Corn".to_string(),
            area: 10.0,
            area_unit: AreaUnit::Hectare,
            planting_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            status: CropStatus::Planted,
            notes: None,
            created_at: "2025-03-01T08:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_crop_json_uses_camel_case_and_lowercase_enums() {
        let json = serde_json::to_string(&sample_crop()).unwrap();
        assert!(json.contains("\"userId\":\"u1\""));
        assert!(json.contains("\"areaUnit\":\"hectare\""));
        assert!(json.contains("\"plantingDate\":\"2025-03-01\""));
        assert!(json.contains("\"status\":\"planted\""));
        assert!(!json.contains("notes"));
    }

    #[test]
    fn test_input_type_field_is_named_type() {
        let json = r#"{"id":"i1","userId":"u1","name":"Urea","type":"fertilizer",
            "quantity":50,"unit":"kg","cost":0,"purchaseDate":"2025-02-10",
            "createdAt":"2025-02-10T10:00:00.000Z"}"#;
        let input: Input = serde_json::from_str(json).unwrap();
        assert_eq!(input.input_type, InputType::Fertilizer);
        assert_eq!(input.quantity, 50.0);
        assert!(input.supplier.is_none());
    }

    #[test]
    fn test_square_metre_unit_serializes_as_m2() {
        assert_eq!(serde_json::to_string(&AreaUnit::M2).unwrap(), "\"m2\"");
    }

    #[test]
    fn test_active_statuses() {
        assert!(CropStatus::Planted.is_active());
        assert!(CropStatus::Growing.is_active());
        assert!(!CropStatus::Harvested.is_active());
        assert!(!CropStatus::Failed.is_active());
    }

    #[test]
    fn test_record_accessors_dispatch_by_kind() {
        let record = Record::from(sample_crop());
        assert_eq!(record.kind(), RecordKind::Crop);
        assert_eq!(record.id(), "c1");
        assert_eq!(record.user_id(), "u1");
        assert_eq!(record.label(), "Corn");
        assert_eq!(RecordKind::Harvest.collection_name(), "harvests");
        assert_eq!(RecordKind::Input.history_kind(), HistoryKind::Input);
    }

    #[test]
    fn test_describe_matches_activity_feed_wording() {
        assert_eq!(RecordKind::Crop.describe(HistoryAction::Created, "Corn"), "Created crop: Corn");
        assert_eq!(RecordKind::Input.describe(HistoryAction::Updated, "Urea"), "Updated input: Urea");
        assert_eq!(
            RecordKind::Harvest.describe(HistoryAction::Created, "Corn"),
            "Recorded harvest: Corn"
        );
        assert_eq!(
            RecordKind::Harvest.describe(HistoryAction::Deleted, "Corn"),
            "Deleted harvest: Corn"
        );
    }
}
