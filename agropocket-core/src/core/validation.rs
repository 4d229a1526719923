//! Form drafts and the validation rules applied before anything is stored.
//!
//! The stores trust their input; every rule about what a valid crop, input,
//! harvest or account looks like lives here, one [`Validate`] impl per kind.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::record::{
    AreaUnit, Crop, CropStatus, Harvest, HarvestQuality, Input, InputType, Record,
};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every rule a draft failed, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for `field`, if that field failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// One validation entry point per draft or record kind.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

/// Returns `true` if `email` looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

fn require_text(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn require_positive(errors: &mut ValidationErrors, field: &str, value: f64, message: &str) {
    if !(value.is_finite() && value > 0.0) {
        errors.add(field, message);
    }
}

/// Editable crop fields, as entered on the crop form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDraft {
    pub name: String,
    pub area: f64,
    pub area_unit: AreaUnit,
    pub planting_date: NaiveDate,
    pub status: CropStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for CropDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        require_text(&mut errors, "name", &self.name, "Name is required");
        require_positive(&mut errors, "area", self.area, "Area must be positive");
        errors.into_result()
    }
}

impl From<&Crop> for CropDraft {
    fn from(crop: &Crop) -> Self {
        Self {
            name: crop.name.clone(),
            area: crop.area,
            area_unit: crop.area_unit,
            planting_date: crop.planting_date,
            status: crop.status,
            notes: crop.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub quantity: f64,
    pub unit: String,
    pub cost: f64,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for InputDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        require_text(&mut errors, "name", &self.name, "Name is required");
        require_positive(&mut errors, "quantity", self.quantity, "Quantity must be positive");
        require_text(&mut errors, "unit", &self.unit, "Unit is required");
        if !(self.cost.is_finite() && self.cost >= 0.0) {
            errors.add("cost", "Cost must be non-negative");
        }
        errors.into_result()
    }
}

impl From<&Input> for InputDraft {
    fn from(input: &Input) -> Self {
        Self {
            name: input.name.clone(),
            input_type: input.input_type,
            quantity: input.quantity,
            unit: input.unit.clone(),
            cost: input.cost,
            purchase_date: input.purchase_date,
            supplier: input.supplier.clone(),
            notes: input.notes.clone(),
        }
    }
}

/// Editable harvest fields.
///
/// `crop_name` is replaced with the crop's current name when the crop still
/// exists at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestDraft {
    pub crop_id: String,
    #[serde(default)]
    pub crop_name: String,
    pub quantity: f64,
    pub unit: String,
    pub harvest_date: NaiveDate,
    pub quality: HarvestQuality,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for HarvestDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        require_text(&mut errors, "cropId", &self.crop_id, "Crop is required");
        require_positive(&mut errors, "quantity", self.quantity, "Quantity must be positive");
        require_text(&mut errors, "unit", &self.unit, "Unit is required");
        errors.into_result()
    }
}

impl From<&Harvest> for HarvestDraft {
    fn from(harvest: &Harvest) -> Self {
        Self {
            crop_id: harvest.crop_id.clone(),
            crop_name: harvest.crop_name.clone(),
            quantity: harvest.quantity,
            unit: harvest.unit.clone(),
            harvest_date: harvest.harvest_date,
            quality: harvest.quality,
            notes: harvest.notes.clone(),
        }
    }
}

impl Validate for Record {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Crop(crop) => CropDraft::from(crop).validate(),
            Self::Input(input) => InputDraft::from(input).validate(),
            Self::Harvest(harvest) => HarvestDraft::from(harvest).validate(),
        }
    }
}

/// Sign-up form contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for RegisterForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 6 characters");
        }
        if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords don't match");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}
