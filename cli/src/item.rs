use chrono::{DateTime, NaiveDate, Utc};
use medsearch_core::{Schema, ValueKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One dispensing record as exported by the data layer, one per JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispensingItem {
    pub id: Uuid,
    pub medication: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub controlled: bool,
    #[serde(default)]
    pub device_id: Option<Uuid>,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
    #[serde(default)]
    pub dispensed_at: Option<DateTime<Utc>>,
}

pub fn schema() -> Schema<DispensingItem> {
    Schema::new()
        .with_field("id", ValueKind::Guid, |i: &DispensingItem| i.id.into())
        .with_field("medication", ValueKind::String, |i: &DispensingItem| {
            i.medication.as_str().into()
        })
        .with_field("description", ValueKind::String, |i: &DispensingItem| {
            i.description.as_ref().into()
        })
        .with_field("controlled", ValueKind::Boolean, |i: &DispensingItem| {
            i.controlled.into()
        })
        .with_field("device_id", ValueKind::Guid, |i: &DispensingItem| {
            i.device_id.into()
        })
        .with_field("facility", ValueKind::String, |i: &DispensingItem| {
            i.facility.as_ref().into()
        })
        .with_field("lot_number", ValueKind::String, |i: &DispensingItem| {
            i.lot_number.as_ref().into()
        })
        .with_field("expires_on", ValueKind::Date, |i: &DispensingItem| {
            i.expires_on.into()
        })
        // by date, or precisely
        .with_field("dispensed_on", ValueKind::Date, |i: &DispensingItem| {
            i.dispensed_at.into()
        })
        .with_field("dispensed_at", ValueKind::DateTime, |i: &DispensingItem| {
            i.dispensed_at.into()
        })
}
