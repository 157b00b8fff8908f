use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per employee id.
///
/// Serialises check-then-write sequences (clock-in, clock-out, breaks) for a
/// single employee while leaving different employees independent.
#[derive(Default)]
pub struct EmployeeLocks {
    // Never pruned; one entry per employee who has acted since startup.
    slots: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl EmployeeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, employee_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(employee_id).or_default().clone()
        };
        slot.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_employee_waits() {
        let locks = Arc::new(EmployeeLocks::new());
        let guard = locks.acquire(1).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_employees_do_not_block() {
        let locks = EmployeeLocks::new();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(second.is_ok());
    }
}
