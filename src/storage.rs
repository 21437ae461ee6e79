//! Flat-file tables.
//!
//! The collector's output and the analyzer's input: one CSV file of users
//! and one of repositories, each with a header row.

use crate::models::{RepositoryRecord, UserRecord};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Both tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: Vec<UserRecord>,
    pub repositories: Vec<RepositoryRecord>,
}

impl Tables {
    /// Load both tables from disk.
    pub fn load(users_path: &Path, repositories_path: &Path) -> Result<Self> {
        Ok(Self {
            users: read_table(users_path)?,
            repositories: read_table(repositories_path)?,
        })
    }

    /// Write both tables to disk, replacing existing files.
    pub fn save(&self, users_path: &Path, repositories_path: &Path) -> Result<()> {
        write_table(users_path, &self.users)?;
        write_table(repositories_path, &self.repositories)?;
        Ok(())
    }
}

/// Write rows to a CSV file with a header row.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create table: {}", path.display()))?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush table: {}", path.display()))?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read every row of a CSV file.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;

    let rows = reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.with_context(|| format!("Malformed row {} in {}", i + 1, path.display()))
        })
        .collect::<Result<Vec<T>>>()?;

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn user(login: &str, hireable: Option<bool>) -> UserRecord {
        UserRecord {
            login: login.to_string(),
            name: "Grace Hopper".to_string(),
            company: "NAVY".to_string(),
            location: "Arlington, VA".to_string(),
            email: String::new(),
            hireable,
            bio: String::new(),
            public_repos: 12,
            followers: 900,
            following: 1,
            created_at: Utc.with_ymd_and_hms(2011, 4, 5, 6, 7, 8).unwrap(),
        }
    }

    fn repository(login: &str) -> RepositoryRecord {
        RepositoryRecord {
            login: login.to_string(),
            full_name: format!("{login}/compiler"),
            created_at: Utc.with_ymd_and_hms(2019, 1, 5, 0, 0, 0).unwrap(),
            stargazers_count: 42,
            watchers_count: 42,
            language: String::new(),
            has_projects: true,
            has_wiki: false,
            license_name: "mit".to_string(),
        }
    }

    #[test]
    fn test_tables_survive_a_save_and_load() {
        let dir = TempDir::new().unwrap();
        let users_path = dir.path().join("users.csv");
        let repos_path = dir.path().join("repositories.csv");

        let tables = Tables {
            users: vec![user("grace", None), user("ada", Some(false)), user("alan", Some(true))],
            repositories: vec![repository("grace")],
        };
        tables.save(&users_path, &repos_path).unwrap();

        let loaded = Tables::load(&users_path, &repos_path).unwrap();
        assert_eq!(loaded.users, tables.users);
        assert_eq!(loaded.repositories, tables.repositories);
        assert_eq!(loaded.users[0].hireable, None);
        assert_eq!(loaded.users[1].hireable, Some(false));
    }

    #[test]
    fn test_header_and_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("users.csv");

        write_table(&path, &[user("grace", None)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("login,name,company,location,email,hireable,bio,public_repos,followers,following,created_at")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("grace,Grace Hopper,NAVY,\"Arlington, VA\",,,"));
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result: Result<Vec<UserRecord>> = read_table(&dir.path().join("absent.csv"));
        assert!(result.is_err());
    }
}
