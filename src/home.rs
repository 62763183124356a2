//! Home dashboard: headline counters plus short previews of recent
//! registrations and the next pending reminders.
//! All functions operate on the clinic database via rusqlite.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::{self, DatabaseError};
use crate::models::Patient;
use crate::reminders::{self, PendingReminder};

/// Number of rows in each dashboard preview list.
pub const PREVIEW_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_patients: i64,
    /// Sum of `total` over paid invoices.
    pub total_revenue: f64,
    pub pending_invoices: i64,
    /// Visit reminders dated today, any status.
    pub todays_visits: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeData {
    pub stats: DashboardStats,
    pub recent_patients: Vec<Patient>,
    pub upcoming_reminders: Vec<PendingReminder>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn fetch_dashboard_stats(
    conn: &Connection,
    today: NaiveDate,
) -> Result<DashboardStats, DatabaseError> {
    let total_patients = db::count_patients(conn)?;

    let total_revenue: f64 = conn.query_row(
        "SELECT COALESCE(SUM(total), 0.0) FROM invoices WHERE status = 'paid'",
        [],
        |row| row.get(0),
    )?;

    let pending_invoices: i64 = conn.query_row(
        "SELECT COUNT(*) FROM invoices WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;

    let todays_visits: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE type = 'visit' AND date = ?1",
        params![today],
        |row| row.get(0),
    )?;

    Ok(DashboardStats {
        total_patients,
        total_revenue,
        pending_invoices,
        todays_visits,
    })
}

/// Everything the Home page shows, in one read.
pub fn fetch_home(conn: &Connection, today: NaiveDate) -> Result<HomeData, DatabaseError> {
    let stats = fetch_dashboard_stats(conn, today)?;

    let mut recent_patients = db::list_patients(conn)?;
    recent_patients.truncate(PREVIEW_LIMIT);

    let mut upcoming_reminders = reminders::list_pending(&db::list_reminders(conn)?, today);
    upcoming_reminders.truncate(PREVIEW_LIMIT);

    Ok(HomeData {
        stats,
        recent_patients,
        upcoming_reminders,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
