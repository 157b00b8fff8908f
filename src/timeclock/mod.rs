//! Request-scoped orchestration around the ledger.
//!
//! Every mutating call follows the same shape: resolve any address first,
//! take the employee's lock, load the current state, apply one ledger
//! transition, persist the result.

pub mod locks;

use crate::database::{models::Employee, queries};
use crate::geocoder::{Geocoder, UNKNOWN_LOCATION};
use crate::ledger::{Break, LedgerError, LocationSample, WorkSession, aggregate};
use chrono::{DateTime, Utc};
use locks::EmployeeLocks;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The employee has no open session to act on.
    #[error("no active session for employee {0}")]
    NoActiveSession(i64),

    /// The open session has no running break to end.
    #[error("no break in progress on session {0}")]
    NoOpenBreak(Uuid),

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type ClockResult<T> = Result<T, ClockError>;

/// Who is acting and when. Supplied by the transport on every call.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub employee_id: i64,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(employee_id: i64, now: DateTime<Utc>) -> Self {
        Self { employee_id, now }
    }

    pub fn now(employee_id: i64) -> Self {
        Self::new(employee_id, Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone)]
pub struct TimeClock {
    pool: SqlitePool,
    locks: Arc<EmployeeLocks>,
    geocoder: Arc<dyn Geocoder>,
}

impl TimeClock {
    pub fn new(pool: SqlitePool, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            pool,
            locks: Arc::new(EmployeeLocks::new()),
            geocoder,
        }
    }

    pub async fn register(&self, login_handle: &str, display_name: &str) -> ClockResult<Employee> {
        Ok(queries::create_or_get_employee(&self.pool, login_handle, display_name).await?)
    }

    /// Lookup without registering; `None` for someone who never used the bot.
    pub async fn find_employee(&self, login_handle: &str) -> ClockResult<Option<Employee>> {
        Ok(queries::get_employee_by_login_handle(&self.pool, login_handle).await?)
    }

    pub async fn clock_in(
        &self,
        ctx: RequestContext,
        coordinates: Option<Coordinates>,
    ) -> ClockResult<WorkSession> {
        let label = self.label_for(coordinates).await;
        let _guard = self.locks.acquire(ctx.employee_id).await;

        let active = queries::get_active_work_session(&self.pool, ctx.employee_id).await?;
        let session = WorkSession::open(active.as_ref(), ctx.employee_id, ctx.now, label)?;

        if !queries::insert_open_session(&self.pool, &session).await? {
            return Err(LedgerError::PreconditionViolation(format!(
                "employee {} already has an open session",
                ctx.employee_id
            ))
            .into());
        }

        info!(
            "Clocked in: employee_id={}, session_id={}, location={}",
            ctx.employee_id, session.id, session.clock_in_location
        );
        Ok(session)
    }

    pub async fn start_break(&self, ctx: RequestContext) -> ClockResult<Break> {
        let _guard = self.locks.acquire(ctx.employee_id).await;

        let mut session = self.require_active(ctx.employee_id).await?;
        let entry = session.start_break(ctx.now)?;
        queries::insert_break(&self.pool, &entry).await?;

        info!("Break started: session_id={}, break_id={}", session.id, entry.id);
        Ok(entry)
    }

    /// Ends whichever break is running on the employee's open session.
    pub async fn end_break(&self, ctx: RequestContext) -> ClockResult<Break> {
        let _guard = self.locks.acquire(ctx.employee_id).await;

        let mut session = self.require_active(ctx.employee_id).await?;
        let break_id = session
            .open_break()
            .map(|b| b.id)
            .ok_or(ClockError::NoOpenBreak(session.id))?;
        let entry = session.end_break(break_id, ctx.now)?;
        queries::end_break(&self.pool, &entry).await?;

        info!("Break ended: session_id={}, break_id={}", session.id, entry.id);
        Ok(entry)
    }

    pub async fn record_location(
        &self,
        ctx: RequestContext,
        coordinates: Coordinates,
    ) -> ClockResult<LocationSample> {
        let label = self.label_for(Some(coordinates)).await;
        let _guard = self.locks.acquire(ctx.employee_id).await;

        let mut session = self.require_active(ctx.employee_id).await?;
        let sample = session.record_location(
            ctx.now,
            coordinates.latitude,
            coordinates.longitude,
            label,
        )?;
        queries::insert_location_sample(&self.pool, &sample).await?;

        Ok(sample)
    }

    pub async fn clock_out(
        &self,
        ctx: RequestContext,
        coordinates: Option<Coordinates>,
    ) -> ClockResult<WorkSession> {
        let label = self.label_for(coordinates).await;
        let _guard = self.locks.acquire(ctx.employee_id).await;

        let mut session = self.require_active(ctx.employee_id).await?;
        session.close(ctx.now, label)?;

        if !queries::close_work_session(&self.pool, &session).await? {
            return Err(LedgerError::InvalidState(format!(
                "session {} was closed concurrently",
                session.id
            ))
            .into());
        }

        info!(
            "Clocked out: employee_id={}, session_id={}, total_hours={:.2}",
            ctx.employee_id, session.id, session.total_hours
        );
        Ok(session)
    }

    pub async fn active_session(&self, employee_id: i64) -> ClockResult<Option<WorkSession>> {
        Ok(queries::get_active_work_session(&self.pool, employee_id).await?)
    }

    pub async fn session(&self, session_id: Uuid) -> ClockResult<WorkSession> {
        queries::get_work_session_by_id(&self.pool, session_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("session {}", session_id)).into())
    }

    pub async fn sessions_for(&self, employee_id: i64) -> ClockResult<Vec<WorkSession>> {
        Ok(queries::get_work_sessions_by_employee(&self.pool, employee_id).await?)
    }

    pub async fn sessions_between(
        &self,
        employee_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ClockResult<Vec<WorkSession>> {
        Ok(queries::get_work_sessions_by_range(&self.pool, employee_id, from, to).await?)
    }

    pub async fn total_hours(&self, employee_id: i64) -> ClockResult<f64> {
        let sessions = self.sessions_for(employee_id).await?;
        Ok(aggregate::total_hours(&sessions))
    }

    /// Deletes a session together with its breaks and location samples.
    pub async fn void_session(&self, session_id: Uuid) -> ClockResult<WorkSession> {
        let session = self.session(session_id).await?;
        let _guard = self.locks.acquire(session.employee_id).await;

        if !queries::delete_work_session(&self.pool, session_id).await? {
            return Err(LedgerError::NotFound(format!("session {}", session_id)).into());
        }

        info!(
            "Session voided: employee_id={}, session_id={}",
            session.employee_id, session.id
        );
        Ok(session)
    }

    async fn require_active(&self, employee_id: i64) -> ClockResult<WorkSession> {
        queries::get_active_work_session(&self.pool, employee_id)
            .await?
            .ok_or(ClockError::NoActiveSession(employee_id))
    }

    async fn label_for(&self, coordinates: Option<Coordinates>) -> String {
        match coordinates {
            Some(c) => self.geocoder.resolve(c.latitude, c.longitude).await,
            None => UNKNOWN_LOCATION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_test_pool;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct FixedGeocoder(&'static str);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, _latitude: f64, _longitude: f64) -> String {
            self.0.to_string()
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 13, hour, minute, 0).unwrap()
    }

    const HQ: Coordinates = Coordinates {
        latitude: 35.0,
        longitude: 139.0,
    };

    async fn clock_with(label: &'static str) -> (TimeClock, i64) {
        let pool = create_test_pool().await.unwrap();
        let clock = TimeClock::new(pool, Arc::new(FixedGeocoder(label)));
        let employee = clock.register("1001", "alice").await.unwrap();
        (clock, employee.id)
    }

    #[tokio::test]
    async fn full_day_is_persisted_with_hours() {
        let (clock, employee_id) = clock_with("Head Office").await;

        clock
            .clock_in(RequestContext::new(employee_id, at(9, 0)), Some(HQ))
            .await
            .unwrap();
        clock.start_break(RequestContext::new(employee_id, at(10, 0))).await.unwrap();
        clock.end_break(RequestContext::new(employee_id, at(10, 15))).await.unwrap();
        clock
            .record_location(RequestContext::new(employee_id, at(14, 0)), HQ)
            .await
            .unwrap();
        let closed = clock
            .clock_out(RequestContext::new(employee_id, at(17, 0)), None)
            .await
            .unwrap();

        assert_eq!(closed.total_hours, 7.75);
        assert_eq!(closed.clock_in_location, "Head Office");
        assert_eq!(closed.clock_out_location.as_deref(), Some(UNKNOWN_LOCATION));

        let stored = clock.session(closed.id).await.unwrap();
        assert_eq!(stored.total_hours, 7.75);
        assert_eq!(stored.breaks.len(), 1);
        assert_eq!(stored.locations[0].address, "Head Office");
        assert!(clock.active_session(employee_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn double_clock_in_is_a_precondition_violation() {
        let (clock, employee_id) = clock_with("HQ").await;
        clock.clock_in(RequestContext::new(employee_id, at(9, 0)), None).await.unwrap();

        let err = clock
            .clock_in(RequestContext::new(employee_id, at(9, 1)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::Ledger(LedgerError::PreconditionViolation(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_clock_ins_open_exactly_one_session() {
        let (clock, employee_id) = clock_with("HQ").await;

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let clock = clock.clone();
                tokio::spawn(async move { clock.clock_in(RequestContext::now(employee_id), None).await })
            })
            .collect();

        let mut opened = 0;
        let mut refused = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => opened += 1,
                Err(ClockError::Ledger(LedgerError::PreconditionViolation(_))) => refused += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(opened, 1);
        assert_eq!(refused, 7);
        assert_eq!(clock.sessions_for(employee_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unique_index_guards_even_without_shared_locks() {
        let pool = create_test_pool().await.unwrap();
        let first = TimeClock::new(pool.clone(), Arc::new(FixedGeocoder("HQ")));
        let second = TimeClock::new(pool, Arc::new(FixedGeocoder("HQ")));
        let employee = first.register("1001", "alice").await.unwrap();

        // Simulate a stale read: the second clock never sees the first session
        // before inserting, so only the index can refuse it.
        let stale = WorkSession::open(None, employee.id, at(9, 1), "HQ").unwrap();
        first.clock_in(RequestContext::new(employee.id, at(9, 0)), None).await.unwrap();
        assert!(!queries::insert_open_session(&second.pool, &stale).await.unwrap());
    }

    #[tokio::test]
    async fn operations_without_open_session_report_no_active_session() {
        let (clock, employee_id) = clock_with("HQ").await;
        let ctx = RequestContext::new(employee_id, at(9, 0));

        assert!(matches!(
            clock.start_break(ctx).await.unwrap_err(),
            ClockError::NoActiveSession(id) if id == employee_id
        ));
        assert!(matches!(
            clock.clock_out(ctx, None).await.unwrap_err(),
            ClockError::NoActiveSession(_)
        ));
        assert!(matches!(
            clock.record_location(ctx, HQ).await.unwrap_err(),
            ClockError::NoActiveSession(_)
        ));
    }

    #[tokio::test]
    async fn end_break_without_running_break_reports_no_open_break() {
        let (clock, employee_id) = clock_with("HQ").await;
        let session = clock
            .clock_in(RequestContext::new(employee_id, at(9, 0)), None)
            .await
            .unwrap();

        let err = clock
            .end_break(RequestContext::new(employee_id, at(9, 30)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::NoOpenBreak(id) if id == session.id));
    }

    #[tokio::test]
    async fn second_break_start_is_invalid_state() {
        let (clock, employee_id) = clock_with("HQ").await;
        clock.clock_in(RequestContext::new(employee_id, at(9, 0)), None).await.unwrap();
        clock.start_break(RequestContext::new(employee_id, at(10, 0))).await.unwrap();

        let err = clock
            .start_break(RequestContext::new(employee_id, at(10, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::Ledger(LedgerError::InvalidState(_))));
    }

    #[tokio::test]
    async fn open_break_at_clock_out_is_kept_and_not_deducted() {
        let (clock, employee_id) = clock_with("HQ").await;
        clock.clock_in(RequestContext::new(employee_id, at(9, 0)), None).await.unwrap();
        clock.start_break(RequestContext::new(employee_id, at(10, 0))).await.unwrap();

        let closed = clock
            .clock_out(RequestContext::new(employee_id, at(11, 0)), None)
            .await
            .unwrap();
        assert_eq!(closed.total_hours, 2.0);
        assert!(closed.open_break().is_some());
    }

    #[tokio::test]
    async fn total_hours_aggregates_closed_sessions() {
        let (clock, employee_id) = clock_with("HQ").await;

        for (start, end) in [((9, 0), (10, 30)), ((11, 0), (13, 15))] {
            clock
                .clock_in(RequestContext::new(employee_id, at(start.0, start.1)), None)
                .await
                .unwrap();
            clock
                .clock_out(RequestContext::new(employee_id, at(end.0, end.1)), None)
                .await
                .unwrap();
        }
        clock.clock_in(RequestContext::new(employee_id, at(14, 0)), None).await.unwrap();

        assert_eq!(clock.total_hours(employee_id).await.unwrap(), 3.75);
    }

    #[tokio::test]
    async fn void_session_removes_it() {
        let (clock, employee_id) = clock_with("HQ").await;
        let session = clock
            .clock_in(RequestContext::new(employee_id, at(9, 0)), Some(HQ))
            .await
            .unwrap();

        clock.void_session(session.id).await.unwrap();

        assert!(matches!(
            clock.session(session.id).await.unwrap_err(),
            ClockError::Ledger(LedgerError::NotFound(_))
        ));
        assert!(clock.active_session(employee_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn looking_up_an_unknown_member_does_not_register_them() {
        let (clock, _) = clock_with("HQ").await;
        let count = |pool: SqlitePool| async move {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
                .fetch_one(&pool)
                .await
                .unwrap()
        };
        let before = count(clock.pool.clone()).await;

        assert!(clock.find_employee("2002").await.unwrap().is_none());
        assert_eq!(count(clock.pool.clone()).await, before);

        let known = clock.find_employee("1001").await.unwrap().unwrap();
        assert_eq!(known.display_name, "alice");
    }
}
