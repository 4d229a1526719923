//! Dashboard totals computed from one user's records.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::core::history::HistoryEntry;
use crate::core::record::{Crop, Harvest, Input};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_crops: usize,
    /// Crops that are planted or growing.
    pub active_crops: usize,
    /// Sum of crop areas. Units are not converted.
    pub total_area: f64,
    pub total_inputs: usize,
    pub total_input_cost: f64,
    pub total_harvests: usize,
    /// Harvests dated on or after `today - recent_days`.
    pub recent_harvests: usize,
    /// Sum of harvest quantities. Units are not converted.
    pub total_harvest_quantity: f64,
    /// Newest history entries first.
    pub recent_activity: Vec<HistoryEntry>,
}

impl DashboardSummary {
    pub fn compute(
        crops: &[Crop],
        inputs: &[Input],
        harvests: &[Harvest],
        history: &[HistoryEntry],
        today: NaiveDate,
        recent_days: u32,
        activity_limit: usize,
    ) -> Self {
        // A window reaching past the calendar's start covers every harvest.
        let cutoff = today
            .checked_sub_signed(Duration::days(i64::from(recent_days)))
            .unwrap_or(NaiveDate::MIN);

        let mut recent_activity = history.to_vec();
        recent_activity.reverse();
        recent_activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent_activity.truncate(activity_limit);

        Self {
            total_crops: crops.len(),
            active_crops: crops.iter().filter(|c| c.status.is_active()).count(),
            total_area: crops.iter().map(|c| c.area).sum(),
            total_inputs: inputs.len(),
            total_input_cost: inputs.iter().map(|i| i.cost).sum(),
            total_harvests: harvests.len(),
            recent_harvests: harvests.iter().filter(|h| h.harvest_date >= cutoff).count(),
            total_harvest_quantity: harvests.iter().map(|h| h.quantity).sum(),
            recent_activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::{HistoryAction, HistoryKind};
    use crate::core::record::{AreaUnit, CropStatus, HarvestQuality, InputType};
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn crop(name: &str, area: f64, status: CropStatus) -> Crop {
        Crop {
            id: name.to_string(),
            user_id: "u1".to_string(),
            name: name.to_string(),
            area,
            area_unit: AreaUnit::Hectare,
            planting_date: date(2025, 3, 1),
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn harvest(id: &str, quantity: f64, on: NaiveDate) -> Harvest {
        Harvest {
            id: id.to_string(),
            user_id: "u1".to_string(),
            crop_id: "c1".to_string(),
            crop_name: "Corn".to_string(),
            quantity,
            unit: "kg".to_string(),
            harvest_date: on,
            quality: HarvestQuality::Good,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn entry(id: &str, second: u32) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            user_id: "u1".to_string(),
            kind: HistoryKind::Crop,
            action: HistoryAction::Created,
            description: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, second).unwrap(),
            related_id: None,
        }
    }

    #[test]
    fn test_totals() {
        let crops = vec![
            crop("Corn", 10.0, CropStatus::Planted),
            crop("Beans", 2.5, CropStatus::Growing),
            crop("Rice", 4.0, CropStatus::Failed),
        ];
        let inputs = vec![Input {
            id: "i1".to_string(),
            user_id: "u1".to_string(),
            name: "Urea".to_string(),
            input_type: InputType::Fertilizer,
            quantity: 50.0,
            unit: "kg".to_string(),
            cost: 120.5,
            purchase_date: date(2025, 2, 1),
            supplier: Some("Agro Ltd".to_string()),
            notes: None,
            created_at: Utc::now(),
        }];
        let harvests = vec![
            harvest("h1", 500.0, date(2025, 6, 20)),
            harvest("h2", 250.0, date(2025, 4, 1)),
        ];

        let summary =
            DashboardSummary::compute(&crops, &inputs, &harvests, &[], date(2025, 6, 30), 30, 5);

        assert_eq!(summary.total_crops, 3);
        assert_eq!(summary.active_crops, 2);
        assert_eq!(summary.total_area, 16.5);
        assert_eq!(summary.total_inputs, 1);
        assert_eq!(summary.total_input_cost, 120.5);
        assert_eq!(summary.total_harvests, 2);
        assert_eq!(summary.recent_harvests, 1);
        assert_eq!(summary.total_harvest_quantity, 750.0);
        assert!(summary.recent_activity.is_empty());
    }

    #[test]
    fn test_recent_window_is_inclusive() {
        let harvests = vec![harvest("h1", 1.0, date(2025, 5, 31))];
        let summary = DashboardSummary::compute(&[], &[], &harvests, &[], date(2025, 6, 30), 30, 5);
        assert_eq!(summary.recent_harvests, 1);
    }

    #[test]
    fn test_oversized_recent_window_counts_every_harvest() {
        let harvests = vec![
            harvest("h1", 1.0, date(1990, 1, 1)),
            harvest("h2", 1.0, date(2025, 6, 1)),
        ];
        let summary =
            DashboardSummary::compute(&[], &[], &harvests, &[], date(2025, 6, 30), u32::MAX, 5);
        assert_eq!(summary.recent_harvests, 2);
    }

    #[test]
    fn test_recent_activity_is_newest_first_and_limited() {
        let history: Vec<HistoryEntry> = (0..8).map(|i| entry(&format!("e{i}"), i)).collect();
        let summary = DashboardSummary::compute(&[], &[], &[], &history, date(2025, 6, 30), 30, 3);

        let ids: Vec<&str> = summary.recent_activity.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e7", "e6", "e5"]);
    }
}
