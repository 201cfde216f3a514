use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::TryStreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use tracing::{debug, error, info};

use super::StoreError;
use crate::engine::EmployeeLookup;
use crate::model::employee::EmployeeRef;

/// Snapshot of the employee directory, keyed by employee id.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    employees: HashMap<u64, EmployeeRef>,
}

impl Directory {
    pub fn len(&self) -> usize {
        self.employees.len()
    }
}

impl FromIterator<EmployeeRef> for Directory {
    fn from_iter<I: IntoIterator<Item = EmployeeRef>>(iter: I) -> Self {
        Directory {
            employees: iter.into_iter().map(|e| (e.employee_id, e)).collect(),
        }
    }
}

impl EmployeeLookup for Directory {
    fn lookup(&self, employee_id: u64) -> Option<&EmployeeRef> {
        self.employees.get(&employee_id)
    }
}

/// Where directory snapshots come from.
pub enum DirectorySource {
    /// The `employees` table; snapshots are cached for a short TTL when one is set.
    MySql {
        pool: MySqlPool,
        cache: Option<Cache<(), Arc<Directory>>>,
    },
    /// A fixed set of employees (seed file or tests).
    Static(Arc<Directory>),
}

impl DirectorySource {
    pub fn mysql(pool: MySqlPool, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build()
        });

        DirectorySource::MySql { pool, cache }
    }

    pub fn fixed(employees: impl IntoIterator<Item = EmployeeRef>) -> Self {
        DirectorySource::Static(Arc::new(employees.into_iter().collect()))
    }

    /// Loads a JSON array of employees.
    pub fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading directory seed {}", path.display()))?;
        let employees: Vec<EmployeeRef> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing directory seed {}", path.display()))?;

        info!(count = employees.len(), path = %path.display(), "Directory seed loaded");
        Ok(Self::fixed(employees))
    }

    pub async fn snapshot(&self) -> Result<Arc<Directory>, StoreError> {
        match self {
            DirectorySource::Static(directory) => Ok(directory.clone()),
            DirectorySource::MySql { pool, cache: None } => load_directory(pool)
                .await
                .map_err(|e| StoreError::DirectoryUnavailable(e.to_string())),
            DirectorySource::MySql {
                pool,
                cache: Some(cache),
            } => cache
                .try_get_with((), load_directory(pool))
                .await
                .map_err(|e| StoreError::DirectoryUnavailable(e.to_string())),
        }
    }
}

async fn load_directory(pool: &MySqlPool) -> Result<Arc<Directory>, sqlx::Error> {
    let employees: Vec<EmployeeRef> = sqlx::query_as::<_, EmployeeRef>(
        r#"
        SELECT id AS employee_id, first_name, last_name, role, department, ward
        FROM employees
        "#,
    )
    .fetch(pool)
    .try_collect()
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to load employee directory");
        e
    })?;

    debug!(count = employees.len(), "Employee directory loaded");
    Ok(Arc::new(employees.into_iter().collect()))
}
