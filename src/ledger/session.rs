use super::error::{LedgerError, LedgerResult};
use crate::utils::time::{delta_to_hours, round_hours};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Break {
    pub id: Uuid,
    pub session_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Break {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length of a finished break; `None` while the break is still running.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end.map(|end| end.signed_duration_since(self.start))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub id: Uuid,
    pub session_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// One continuous clock-in to clock-out engagement.
///
/// Breaks and location samples are kept in insertion order and are only ever
/// appended. `total_hours` stays at 0.0 until the session is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: Uuid,
    pub employee_id: i64,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub clock_in_location: String,
    pub clock_out_location: Option<String>,
    pub total_hours: f64,
    pub breaks: Vec<Break>,
    pub locations: Vec<LocationSample>,
}

impl WorkSession {
    /// Starts a new session for `employee_id`.
    ///
    /// `active` is the employee's currently open session as known to the
    /// caller. The ledger does not look it up itself; callers must hold the
    /// employee's lock between fetching it and persisting the result.
    pub fn open(
        active: Option<&WorkSession>,
        employee_id: i64,
        now: DateTime<Utc>,
        location: impl Into<String>,
    ) -> LedgerResult<Self> {
        if let Some(current) = active.filter(|s| s.is_open()) {
            return Err(LedgerError::PreconditionViolation(format!(
                "employee {} already has open session {}",
                employee_id, current.id
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            employee_id,
            clock_in: now,
            clock_out: None,
            clock_in_location: location.into(),
            clock_out_location: None,
            total_hours: 0.0,
            breaks: Vec::new(),
            locations: Vec::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    pub fn open_break(&self) -> Option<&Break> {
        self.breaks.iter().find(|b| b.is_open())
    }

    pub fn last_location(&self) -> Option<&LocationSample> {
        self.locations.last()
    }

    pub fn start_break(&mut self, now: DateTime<Utc>) -> LedgerResult<Break> {
        self.ensure_open("start a break")?;

        if let Some(running) = self.open_break() {
            return Err(LedgerError::InvalidState(format!(
                "break {} is already in progress",
                running.id
            )));
        }

        let entry = Break {
            id: Uuid::new_v4(),
            session_id: self.id,
            start: now,
            end: None,
        };
        self.breaks.push(entry.clone());
        Ok(entry)
    }

    /// Closes the open break `break_id`.
    ///
    /// A stale reference to an already closed session may still end its
    /// dangling break; the stored total is not recomputed in that case.
    pub fn end_break(&mut self, break_id: Uuid, now: DateTime<Utc>) -> LedgerResult<Break> {
        let session_id = self.id;
        let entry = self
            .breaks
            .iter_mut()
            .find(|b| b.id == break_id && b.is_open())
            .ok_or_else(|| {
                LedgerError::NotFound(format!(
                    "no open break {} on session {}",
                    break_id, session_id
                ))
            })?;

        entry.end = Some(now);
        Ok(entry.clone())
    }

    pub fn record_location(
        &mut self,
        now: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        address: impl Into<String>,
    ) -> LedgerResult<LocationSample> {
        self.ensure_open("record a location")?;

        let sample = LocationSample {
            id: Uuid::new_v4(),
            session_id: self.id,
            recorded_at: now,
            latitude,
            longitude,
            address: address.into(),
        };
        self.locations.push(sample.clone());
        Ok(sample)
    }

    pub fn close(&mut self, now: DateTime<Utc>, location: impl Into<String>) -> LedgerResult<&Self> {
        self.ensure_open("clock out")?;

        if let Some(running) = self.open_break() {
            tracing::warn!(
                "Closing session {} with open break {}; its time is not deducted",
                self.id,
                running.id
            );
        }

        self.clock_out = Some(now);
        self.clock_out_location = Some(location.into());
        self.total_hours = self.compute_total_hours();
        Ok(self)
    }

    /// Sum of all finished breaks. Open breaks contribute nothing.
    pub fn break_duration(&self) -> TimeDelta {
        self.breaks
            .iter()
            .filter_map(Break::duration)
            .fold(TimeDelta::zero(), |acc, d| acc + d)
    }

    /// Worked hours from the current state, rounded to two places.
    ///
    /// Open sessions report 0.0. The result is not floored: breaks that
    /// outlast the session span produce a negative figure.
    pub fn compute_total_hours(&self) -> f64 {
        let Some(clock_out) = self.clock_out else {
            return 0.0;
        };

        let raw = clock_out.signed_duration_since(self.clock_in);
        let worked = raw - self.break_duration();
        round_hours(delta_to_hours(worked))
    }

    fn ensure_open(&self, action: &str) -> LedgerResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(LedgerError::InvalidState(format!(
                "cannot {}: session {} is already closed",
                action, self.id
            )))
        }
    }
}
