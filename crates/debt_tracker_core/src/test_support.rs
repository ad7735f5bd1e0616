//! Shared fixtures for the core's unit tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::clock::FixedClock;
use crate::domain::{Debt, DebtDraft, DebtStatus, DebtType};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

pub(crate) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Mid-morning on Monday 2024-06-10.
pub(crate) fn fixture_now() -> DateTime<Utc> {
    at(2024, 6, 10, 9)
}

pub(crate) fn fixture_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(fixture_now()))
}

pub(crate) fn valid_draft(due_date: NaiveDate) -> DebtDraft {
    DebtDraft {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        debt_type: Some(DebtType::Lent),
        peer_name: "Alice".to_string(),
        amount: 120.0,
        due_date,
        reminder_enabled: true,
        status: None,
        note: Some("concert tickets".to_string()),
    }
}

pub(crate) fn pending_debt(user_id: Uuid, due_date: NaiveDate) -> Debt {
    Debt {
        id: Uuid::new_v4(),
        user_id,
        debt_type: DebtType::Lent,
        peer_name: "Bob".to_string(),
        amount: 40.0,
        due_date,
        reminder_enabled: true,
        remind_at: None,
        sent_at: None,
        status: DebtStatus::Pending,
        note: None,
        created_at: at(2024, 6, 1, 12),
        version: 1,
    }
}
