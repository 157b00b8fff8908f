use crate::database::models::Employee;
use crate::ledger::{Break, LocationSample, WorkSession};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, employee_id, clock_in, clock_out, clock_in_location, \
                               clock_out_location, total_hours";

// Employee queries
pub async fn create_or_get_employee(
    pool: &SqlitePool,
    login_handle: &str,
    display_name: &str,
) -> Result<Employee> {
    if let Some(employee) = get_employee_by_login_handle(pool, login_handle).await? {
        return Ok(employee);
    }

    let result = sqlx::query(
        "INSERT INTO employees (login_handle, display_name) VALUES (?, ?)
         ON CONFLICT (login_handle) DO NOTHING",
    )
    .bind(login_handle)
    .bind(display_name)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Lost a registration race; the other insert won.
        return get_employee_by_login_handle(pool, login_handle)
            .await?
            .ok_or_else(|| anyhow::anyhow!("employee {} vanished after insert", login_handle));
    }

    get_employee_by_id(pool, result.last_insert_rowid()).await
}

pub async fn get_employee_by_login_handle(
    pool: &SqlitePool,
    login_handle: &str,
) -> Result<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, login_handle, display_name, credential, created_at
         FROM employees WHERE login_handle = ?",
    )
    .bind(login_handle)
    .fetch_optional(pool)
    .await?;

    Ok(employee)
}

pub async fn get_employee_by_id(pool: &SqlitePool, employee_id: i64) -> Result<Employee> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, login_handle, display_name, credential, created_at
         FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_one(pool)
    .await?;

    Ok(employee)
}

// Work session queries

/// Inserts a freshly opened session.
///
/// Returns `false` when the employee already has an open session; the
/// partial unique index turns this into a conditional insert.
pub async fn insert_open_session(pool: &SqlitePool, session: &WorkSession) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO work_sessions (id, employee_id, clock_in, clock_in_location, total_hours)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(session.id)
    .bind(session.employee_id)
    .bind(session.clock_in)
    .bind(&session.clock_in_location)
    .bind(session.total_hours)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Persists clock-out fields. Returns `false` if the row was already closed.
pub async fn close_work_session(pool: &SqlitePool, session: &WorkSession) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE work_sessions
         SET clock_out = ?, clock_out_location = ?, total_hours = ?
         WHERE id = ? AND clock_out IS NULL",
    )
    .bind(session.clock_out)
    .bind(&session.clock_out_location)
    .bind(session.total_hours)
    .bind(session.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete_work_session(pool: &SqlitePool, session_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM work_sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn get_work_session_by_id(
    pool: &SqlitePool,
    session_id: Uuid,
) -> Result<Option<WorkSession>> {
    let row_opt = sqlx::query(&format!(
        "SELECT {} FROM work_sessions WHERE id = ?",
        SESSION_COLUMNS
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    match row_opt {
        Some(row) => Ok(Some(load_children(pool, session_from_row(&row)).await?)),
        None => Ok(None),
    }
}

pub async fn get_active_work_session(
    pool: &SqlitePool,
    employee_id: i64,
) -> Result<Option<WorkSession>> {
    let row_opt = sqlx::query(&format!(
        "SELECT {} FROM work_sessions
         WHERE employee_id = ? AND clock_out IS NULL
         ORDER BY clock_in DESC
         LIMIT 1",
        SESSION_COLUMNS
    ))
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;

    match row_opt {
        Some(row) => Ok(Some(load_children(pool, session_from_row(&row)).await?)),
        None => Ok(None),
    }
}

pub async fn get_work_sessions_by_employee(
    pool: &SqlitePool,
    employee_id: i64,
) -> Result<Vec<WorkSession>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM work_sessions
         WHERE employee_id = ?
         ORDER BY clock_in ASC",
        SESSION_COLUMNS
    ))
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    load_all(pool, rows).await
}

/// Sessions whose clock-in falls in `[from, to)`.
pub async fn get_work_sessions_by_range(
    pool: &SqlitePool,
    employee_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<WorkSession>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM work_sessions
         WHERE employee_id = ? AND clock_in >= ? AND clock_in < ?
         ORDER BY clock_in ASC",
        SESSION_COLUMNS
    ))
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    load_all(pool, rows).await
}

// Break queries
pub async fn insert_break(pool: &SqlitePool, entry: &Break) -> Result<()> {
    sqlx::query("INSERT INTO breaks (id, session_id, start_time, end_time) VALUES (?, ?, ?, ?)")
        .bind(entry.id)
        .bind(entry.session_id)
        .bind(entry.start)
        .bind(entry.end)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn end_break(pool: &SqlitePool, entry: &Break) -> Result<()> {
    sqlx::query("UPDATE breaks SET end_time = ? WHERE id = ? AND session_id = ?")
        .bind(entry.end)
        .bind(entry.id)
        .bind(entry.session_id)
        .execute(pool)
        .await?;

    Ok(())
}

// Location sample queries
pub async fn insert_location_sample(pool: &SqlitePool, sample: &LocationSample) -> Result<()> {
    sqlx::query(
        "INSERT INTO location_samples (id, session_id, recorded_at, latitude, longitude, address)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(sample.id)
    .bind(sample.session_id)
    .bind(sample.recorded_at)
    .bind(sample.latitude)
    .bind(sample.longitude)
    .bind(&sample.address)
    .execute(pool)
    .await?;

    Ok(())
}

fn session_from_row(row: &SqliteRow) -> WorkSession {
    WorkSession {
        id: row.get("id"),
        employee_id: row.get("employee_id"),
        clock_in: row.get("clock_in"),
        clock_out: row.get("clock_out"),
        clock_in_location: row.get("clock_in_location"),
        clock_out_location: row.get("clock_out_location"),
        total_hours: row.get("total_hours"),
        breaks: Vec::new(),
        locations: Vec::new(),
    }
}

async fn load_all(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<WorkSession>> {
    let mut sessions = Vec::with_capacity(rows.len());
    for row in rows {
        sessions.push(load_children(pool, session_from_row(&row)).await?);
    }
    Ok(sessions)
}

// rowid order is insertion order, which is the order the ledger appended in.
async fn load_children(pool: &SqlitePool, mut session: WorkSession) -> Result<WorkSession> {
    let break_rows = sqlx::query(
        "SELECT id, session_id, start_time, end_time FROM breaks
         WHERE session_id = ? ORDER BY rowid ASC",
    )
    .bind(session.id)
    .fetch_all(pool)
    .await?;

    session.breaks = break_rows
        .into_iter()
        .map(|row| Break {
            id: row.get("id"),
            session_id: row.get("session_id"),
            start: row.get("start_time"),
            end: row.get("end_time"),
        })
        .collect();

    let sample_rows = sqlx::query(
        "SELECT id, session_id, recorded_at, latitude, longitude, address FROM location_samples
         WHERE session_id = ? ORDER BY rowid ASC",
    )
    .bind(session.id)
    .fetch_all(pool)
    .await?;

    session.locations = sample_rows
        .into_iter()
        .map(|row| LocationSample {
            id: row.get("id"),
            session_id: row.get("session_id"),
            recorded_at: row.get("recorded_at"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            address: row.get("address"),
        })
        .collect();

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_test_pool;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 13, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn create_or_get_employee_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        let first = create_or_get_employee(&pool, "1001", "alice").await.unwrap();
        let again = create_or_get_employee(&pool, "1001", "alice-renamed").await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.display_name, "alice");
        assert!(again.credential.is_none());
    }

    #[tokio::test]
    async fn session_round_trips_with_children_in_order() {
        let pool = create_test_pool().await.unwrap();
        let employee = create_or_get_employee(&pool, "1001", "alice").await.unwrap();

        let mut session = WorkSession::open(None, employee.id, at(9, 0), "HQ").unwrap();
        assert!(insert_open_session(&pool, &session).await.unwrap());

        let first = session.start_break(at(10, 0)).unwrap();
        insert_break(&pool, &first).await.unwrap();
        let ended = session.end_break(first.id, at(10, 15)).unwrap();
        end_break(&pool, &ended).await.unwrap();
        let second = session.start_break(at(12, 0)).unwrap();
        insert_break(&pool, &second).await.unwrap();

        for (minute, label) in [(5, "A"), (10, "B"), (20, "C")] {
            let sample = session.record_location(at(11, minute), 1.0, 2.0, label).unwrap();
            insert_location_sample(&pool, &sample).await.unwrap();
        }

        let loaded = get_work_session_by_id(&pool, session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);

        let active = get_active_work_session(&pool, employee.id).await.unwrap().unwrap();
        assert_eq!(active.id, session.id);
    }

    #[tokio::test]
    async fn second_open_session_is_refused_by_index() {
        let pool = create_test_pool().await.unwrap();
        let employee = create_or_get_employee(&pool, "1001", "alice").await.unwrap();

        let first = WorkSession::open(None, employee.id, at(9, 0), "HQ").unwrap();
        let second = WorkSession::open(None, employee.id, at(9, 1), "HQ").unwrap();

        assert!(insert_open_session(&pool, &first).await.unwrap());
        assert!(!insert_open_session(&pool, &second).await.unwrap());
    }

    #[tokio::test]
    async fn closing_frees_the_open_slot() {
        let pool = create_test_pool().await.unwrap();
        let employee = create_or_get_employee(&pool, "1001", "alice").await.unwrap();

        let mut first = WorkSession::open(None, employee.id, at(9, 0), "HQ").unwrap();
        insert_open_session(&pool, &first).await.unwrap();
        first.close(at(12, 0), "HQ").unwrap();
        assert!(close_work_session(&pool, &first).await.unwrap());
        assert!(!close_work_session(&pool, &first).await.unwrap());

        let second = WorkSession::open(None, employee.id, at(13, 0), "HQ").unwrap();
        assert!(insert_open_session(&pool, &second).await.unwrap());
        assert!(get_active_work_session(&pool, employee.id).await.unwrap().is_some());

        let all = get_work_sessions_by_employee(&pool, employee.id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].total_hours, 3.0);
        assert!(all[1].is_open());
    }

    #[tokio::test]
    async fn range_query_filters_on_clock_in() {
        let pool = create_test_pool().await.unwrap();
        let employee = create_or_get_employee(&pool, "1001", "alice").await.unwrap();

        for hour in [8, 11, 14] {
            let mut session = WorkSession::open(None, employee.id, at(hour, 0), "HQ").unwrap();
            insert_open_session(&pool, &session).await.unwrap();
            session.close(at(hour + 1, 0), "HQ").unwrap();
            close_work_session(&pool, &session).await.unwrap();
        }

        let middle = get_work_sessions_by_range(&pool, employee.id, at(10, 0), at(14, 0))
            .await
            .unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].clock_in, at(11, 0));
    }

    #[tokio::test]
    async fn deleting_a_session_cascades() {
        let pool = create_test_pool().await.unwrap();
        let employee = create_or_get_employee(&pool, "1001", "alice").await.unwrap();

        let mut session = WorkSession::open(None, employee.id, at(9, 0), "HQ").unwrap();
        insert_open_session(&pool, &session).await.unwrap();
        let entry = session.start_break(at(10, 0)).unwrap();
        insert_break(&pool, &entry).await.unwrap();
        let sample = session.record_location(at(10, 5), 1.0, 2.0, "HQ").unwrap();
        insert_location_sample(&pool, &sample).await.unwrap();

        assert!(delete_work_session(&pool, session.id).await.unwrap());
        assert!(get_work_session_by_id(&pool, session.id).await.unwrap().is_none());

        let orphans: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM breaks) + (SELECT COUNT(*) FROM location_samples)",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }
}
