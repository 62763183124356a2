use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ReminderStatus, ReminderType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub patient_id: i64,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub date: NaiveDate,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_pending(&self) -> bool {
        self.status == ReminderStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReminder {
    pub patient_id: i64,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_uses_wire_name() {
        let payload: NewReminder =
            serde_json::from_str(r#"{"patient_id":7,"type":"glass_change","date":"2025-09-01"}"#)
                .unwrap();
        assert_eq!(payload.reminder_type, ReminderType::GlassChange);

        let reminder = Reminder {
            id: "r1".into(),
            patient_id: 7,
            reminder_type: payload.reminder_type,
            date: payload.date,
            status: ReminderStatus::Pending,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&reminder).unwrap();
        assert_eq!(json["type"], "glass_change");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["date"], "2025-09-01");
        assert!(reminder.is_pending());
    }
}
