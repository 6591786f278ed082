use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingParty, BookingStatus, Payment, PaymentMethod, PaymentStatus, SecurityEvent,
    Service,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, establishment_id, name, price_cents, duration_minutes, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id,
            service.establishment_id,
            service.name,
            service.price_cents,
            service.duration_minutes,
            service.category,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, establishment_id, name, price_cents, duration_minutes, category
         FROM services WHERE id = ?1",
        params![id],
        |row| {
            Ok(Service {
                id: row.get(0)?,
                establishment_id: row.get(1)?,
                name: row.get(2)?,
                price_cents: row.get(3)?,
                duration_minutes: row.get(4)?,
                category: row.get(5)?,
            })
        },
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(conn: &Connection, establishment_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, establishment_id, name, price_cents, duration_minutes, category
         FROM services WHERE establishment_id = ?1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map(params![establishment_id], |row| {
        Ok(Service {
            id: row.get(0)?,
            establishment_id: row.get(1)?,
            name: row.get(2)?,
            price_cents: row.get(3)?,
            duration_minutes: row.get(4)?,
            category: row.get(5)?,
        })
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, establishment_id, service_id, client_id, guest_name, \
     guest_phone, guest_email, booking_date, duration_minutes, total_amount_cents, status, \
     notes, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let (client_id, guest_name, guest_phone, guest_email) = match &booking.party {
        BookingParty::Client { client_id } => (Some(client_id.as_str()), None, None, None),
        BookingParty::Guest { name, phone, email } => (
            None,
            Some(name.as_str()),
            Some(phone.as_str()),
            email.as_deref(),
        ),
    };

    conn.execute(
        "INSERT INTO bookings (id, establishment_id, service_id, client_id, guest_name, \
         guest_phone, guest_email, booking_date, duration_minutes, total_amount_cents, status, \
         notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.establishment_id,
            booking.service_id,
            client_id,
            guest_name,
            guest_phone,
            guest_email,
            fmt_dt(&booking.booking_date),
            booking.duration_minutes,
            booking.total_amount_cents,
            booking.status.as_str(),
            booking.notes,
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings_for_client(conn: &Connection, client_id: &str) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE client_id = ?1 ORDER BY booking_date ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![client_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_bookings_for_establishment(
    conn: &Connection,
    establishment_id: &str,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 WHERE establishment_id = ?1 AND status = ?2 ORDER BY booking_date ASC LIMIT ?3"
            ),
            vec![
                Box::new(establishment_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(status.to_string()),
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 WHERE establishment_id = ?1 ORDER BY booking_date ASC LIMIT ?2"
            ),
            vec![
                Box::new(establishment_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let establishment_id: String = row.get(1)?;
    let service_id: String = row.get(2)?;
    let client_id: Option<String> = row.get(3)?;
    let guest_name: Option<String> = row.get(4)?;
    let guest_phone: Option<String> = row.get(5)?;
    let guest_email: Option<String> = row.get(6)?;
    let booking_date_str: String = row.get(7)?;
    let duration_minutes: i32 = row.get(8)?;
    let total_amount_cents: i64 = row.get(9)?;
    let status_str: String = row.get(10)?;
    let notes: Option<String> = row.get(11)?;
    let created_at_str: String = row.get(12)?;
    let updated_at_str: String = row.get(13)?;

    let party = match client_id {
        Some(client_id) => BookingParty::Client { client_id },
        None => BookingParty::Guest {
            name: guest_name.unwrap_or_default(),
            phone: guest_phone.unwrap_or_default(),
            email: guest_email,
        },
    };

    Ok(Booking {
        id,
        establishment_id,
        service_id,
        party,
        booking_date: parse_dt(&booking_date_str),
        duration_minutes,
        total_amount_cents,
        status: BookingStatus::parse(&status_str),
        notes,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

// ── Payments ──

pub fn create_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payments (id, booking_id, amount_cents, method, status, pix_code, \
         auth_code, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            payment.id,
            payment.booking_id,
            payment.amount_cents,
            payment.method.as_str(),
            payment.status.as_str(),
            payment.pix_code,
            payment.auth_code,
            fmt_dt(&payment.created_at),
            fmt_dt(&payment.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_payment_by_booking(
    conn: &Connection,
    booking_id: &str,
) -> anyhow::Result<Option<Payment>> {
    let result = conn.query_row(
        "SELECT id, booking_id, amount_cents, method, status, pix_code, auth_code, \
         created_at, updated_at
         FROM payments WHERE booking_id = ?1",
        params![booking_id],
        |row| {
            let method_str: String = row.get(3)?;
            let status_str: String = row.get(4)?;
            let created_at_str: String = row.get(7)?;
            let updated_at_str: String = row.get(8)?;
            Ok(Payment {
                id: row.get(0)?,
                booking_id: row.get(1)?,
                amount_cents: row.get(2)?,
                method: PaymentMethod::parse(&method_str),
                status: PaymentStatus::parse(&status_str),
                pix_code: row.get(5)?,
                auth_code: row.get(6)?,
                created_at: parse_dt(&created_at_str),
                updated_at: parse_dt(&updated_at_str),
            })
        },
    );

    match result {
        Ok(payment) => Ok(Some(payment)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Updates the mutable fields of an existing payment row. Retries and method
/// switches re-drive the one row per booking; they never insert a second.
pub fn update_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE payments SET method = ?1, status = ?2, pix_code = ?3, auth_code = ?4, \
         updated_at = ?5 WHERE id = ?6",
        params![
            payment.method.as_str(),
            payment.status.as_str(),
            payment.pix_code,
            payment.auth_code,
            fmt_dt(&payment.updated_at),
            payment.id,
        ],
    )?;
    Ok(())
}

// ── Security Events ──

pub fn insert_security_event(
    conn: &Connection,
    event_type: &str,
    user_id: Option<&str>,
    description: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO security_events (event_type, user_id, description) VALUES (?1, ?2, ?3)",
        params![event_type, user_id, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_security_events(conn: &Connection, limit: i64) -> anyhow::Result<Vec<SecurityEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, user_id, description, created_at
         FROM security_events ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(SecurityEvent {
            id: row.get(0)?,
            event_type: row.get(1)?,
            user_id: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

pub fn get_security_events_since(
    conn: &Connection,
    since_id: i64,
) -> anyhow::Result<Vec<SecurityEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, user_id, description, created_at
         FROM security_events WHERE id > ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![since_id], |row| {
        Ok(SecurityEvent {
            id: row.get(0)?,
            event_type: row.get(1)?,
            user_id: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

// ── Dashboard ──

pub struct DashboardStats {
    pub upcoming_confirmed_count: i64,
    pub pending_payment_count: i64,
    pub security_event_count: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let now = fmt_dt(&Utc::now().naive_utc());

    let upcoming_confirmed_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings WHERE booking_date > ?1 AND status = 'confirmed'",
            params![now],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let pending_payment_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM payments WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let security_event_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM security_events", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(DashboardStats {
        upcoming_confirmed_count,
        pending_payment_count,
        security_event_count,
    })
}
