use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DishId, PartyType, PaymentStatus, RsvpId};

/// Response envelope used by every `/api` route: `{ success, data?, error?, message? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            total: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            total: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

impl Envelope<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
            total: None,
        }
    }
}

/// Confirmed registrations for one dish, as reported by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishStat {
    pub dish: String,
    pub count: u32,
    /// Stable menu id. Older backends only send the display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_id: Option<DishId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsPayload {
    pub total_rsvps: u64,
    pub confirmed_payments: u64,
    pub pending_payments: u64,
    pub total_guests: u64,
    pub total_revenue: f64,
    pub dish_stats: Vec<DishStat>,
}

/// Stats body as received by clients.
///
/// Accepts both `{ success?, error?, data: { dish_stats } }` and the bare
/// `{ dish_stats }` object. A missing `dish_stats` list reads as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<StatsPayload>,
    #[serde(default)]
    pub dish_stats: Option<Vec<DishStat>>,
}

impl StatsResponse {
    /// Unwraps the envelope. `Err` carries the server-reported reason when
    /// `success` is explicitly `false`.
    pub fn into_payload(self) -> Result<StatsPayload, String> {
        if self.success == Some(false) {
            return Err(self
                .error
                .unwrap_or_else(|| "stats request reported failure".to_string()));
        }
        Ok(match self.data {
            Some(data) => data,
            None => StatsPayload {
                dish_stats: self.dish_stats.unwrap_or_default(),
                ..StatsPayload::default()
            },
        })
    }
}

fn default_guests() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_guests")]
    pub guests: u8,
    #[serde(default)]
    pub selected_dish: String,
    pub payment_type: PartyType,
    /// Link to, or encoded copy of, the payment receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_proof: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRsvpRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_dish: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PartyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_proof: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpRecord {
    pub id: RsvpId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub guests: u8,
    pub selected_dish: String,
    pub payment_type: PartyType,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_proof: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DishId>,
    pub dish_name: String,
    pub current_count: u32,
    pub max_count: u32,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_accepts_enveloped_shape() {
        let raw = r#"{"success":true,"data":{"total_rsvps":3,"dish_stats":[{"dish":"Torresmo","count":3}]}}"#;
        let payload = serde_json::from_str::<StatsResponse>(raw)
            .expect("json")
            .into_payload()
            .expect("payload");
        assert_eq!(payload.total_rsvps, 3);
        assert_eq!(payload.dish_stats[0].dish, "Torresmo");
        assert_eq!(payload.dish_stats[0].dish_id, None);
    }

    #[test]
    fn stats_accepts_bare_shape() {
        let raw = r#"{"dish_stats":[{"dish":"Kibe","count":2,"dish_id":18}]}"#;
        let payload = serde_json::from_str::<StatsResponse>(raw)
            .expect("json")
            .into_payload()
            .expect("payload");
        assert_eq!(payload.dish_stats.len(), 1);
        assert_eq!(payload.dish_stats[0].dish_id, Some(DishId(18)));
    }

    #[test]
    fn stats_without_dish_list_reads_as_empty() {
        let payload = serde_json::from_str::<StatsResponse>("{}")
            .expect("json")
            .into_payload()
            .expect("payload");
        assert!(payload.dish_stats.is_empty());
    }

    #[test]
    fn explicit_failure_is_reported() {
        let raw = r#"{"success":false,"error":"database offline"}"#;
        let err = serde_json::from_str::<StatsResponse>(raw)
            .expect("json")
            .into_payload()
            .expect_err("failure");
        assert_eq!(err, "database offline");
    }

    #[test]
    fn registration_request_wire_shape() {
        let request = RegistrationRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: String::new(),
            guests: 2,
            selected_dish: "Kibe".into(),
            payment_type: PartyType::Couple,
            payment_proof: None,
            notes: String::new(),
        };
        let value = serde_json::to_value(&request).expect("json");
        assert_eq!(value["guests"], 2);
        assert_eq!(value["payment_type"], "couple");
        assert_eq!(value["selected_dish"], "Kibe");
        assert!(value.get("payment_proof").is_none());
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn envelope_data_needs_no_default_impl() {
        let envelope: Envelope<DishStat> =
            serde_json::from_str(r#"{"success":false,"error":"nope"}"#).expect("json");
        assert!(envelope.data.is_none());
        let envelope: Envelope<DishStat> =
            serde_json::from_str(r#"{"success":true,"data":{"dish":"Kibe","count":1}}"#)
                .expect("json");
        assert_eq!(envelope.data.expect("data").count, 1);
    }

    #[test]
    fn failure_envelope_omits_data() {
        let value = serde_json::to_value(Envelope::<()>::failure("nope")).expect("json");
        assert_eq!(value, serde_json::json!({ "success": false, "error": "nope" }));
    }
}
