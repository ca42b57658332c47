use crate::facade::StoreInspector;
use serde::Serialize;

const MAX_COLLECTIONS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;

/// Whether the database settings were supplied. Values are never reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvPresence {
    pub database_url: bool,
    pub database_name: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub backend: String,
    pub database: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}

impl Default for ConnectivityReport {
    fn default() -> Self {
        Self {
            backend: "✅ Running".to_string(),
            database: "❌ Not Available".to_string(),
            database_url: None,
            database_name: None,
            connection_status: "Not Connected".to_string(),
            collections: Vec::new(),
        }
    }
}

/// `inspector` is `None` when this process was started without any store
/// handle at all.
pub fn connectivity_report(
    inspector: Option<&dyn StoreInspector>,
    env: EnvPresence,
) -> ConnectivityReport {
    let mut report = ConnectivityReport::default();

    match inspector {
        None => {
            report.database =
                "❌ Database module not found (run enable-database first)".to_string();
        }
        Some(inspector) => match inspector.database_name() {
            Err(e) => {
                report.database = format!("❌ Error: {}", truncate(&e.to_string()));
            }
            Ok(None) => {
                report.database = "⚠️  Available but not initialized".to_string();
            }
            Ok(Some(name)) => {
                tracing::debug!("inspecting database `{name}`");
                report.database = "✅ Available".to_string();
                report.connection_status = "Connected".to_string();

                match inspector.list_collection_names() {
                    Ok(mut names) => {
                        names.truncate(MAX_COLLECTIONS);
                        report.collections = names;
                        report.database = "✅ Connected & Working".to_string();
                    }
                    Err(e) => {
                        report.database =
                            format!("⚠️  Connected but Error: {}", truncate(&e.to_string()));
                    }
                }
            }
        },
    }

    report.database_url = Some(presence(env.database_url));
    report.database_name = Some(presence(env.database_name));
    report
}

fn presence(set: bool) -> String {
    let marker = if set { "✅ Set" } else { "❌ Not Set" };
    marker.to_string()
}

fn truncate(msg: &str) -> String {
    msg.chars().take(MAX_ERROR_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    struct Fake {
        name: Result<Option<&'static str>, &'static str>,
        collections: Result<Vec<&'static str>, &'static str>,
    }

    impl StoreInspector for Fake {
        fn database_name(&self) -> Result<Option<String>, StoreError> {
            self.name
                .map(|name| name.map(str::to_string))
                .map_err(|e| StoreError::Unavailable(e.to_string()))
        }

        fn list_collection_names(&self) -> Result<Vec<String>, StoreError> {
            self.collections
                .clone()
                .map(|names| names.into_iter().map(str::to_string).collect())
                .map_err(|e| StoreError::Unavailable(e.to_string()))
        }
    }

    #[test]
    fn missing_handle() {
        let report = connectivity_report(None, EnvPresence::default());
        assert!(report.database.contains("not found"));
        assert_eq!(report.connection_status, "Not Connected");
        assert_eq!(report.database_url.as_deref(), Some("❌ Not Set"));
    }

    #[test]
    fn uninitialized_handle() {
        let fake = Fake { name: Ok(None), collections: Ok(vec![]) };
        let report = connectivity_report(Some(&fake), EnvPresence::default());
        assert_eq!(report.database, "⚠️  Available but not initialized");
        assert_eq!(report.connection_status, "Not Connected");
    }

    #[test]
    fn connected_lists_at_most_ten_collections() {
        let names = vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
        let fake = Fake { name: Ok(Some("site")), collections: Ok(names) };
        let env = EnvPresence { database_url: true, database_name: false };
        let report = connectivity_report(Some(&fake), env);

        assert_eq!(report.database, "✅ Connected & Working");
        assert_eq!(report.connection_status, "Connected");
        assert_eq!(report.collections.len(), 10);
        assert_eq!(report.database_url.as_deref(), Some("✅ Set"));
        assert_eq!(report.database_name.as_deref(), Some("❌ Not Set"));
    }

    #[test]
    fn handle_error_is_reported() {
        let fake = Fake { name: Err("disk I/O error"), collections: Ok(vec![]) };
        let report = connectivity_report(Some(&fake), EnvPresence::default());
        assert_eq!(report.database, "❌ Error: store unavailable: disk I/O error");
        assert_eq!(report.connection_status, "Not Connected");
    }

    #[test]
    fn enumeration_error_is_truncated() {
        let long = "x".repeat(200);
        let fake = Fake {
            name: Ok(Some("site")),
            collections: Err(Box::leak(long.into_boxed_str())),
        };
        let report = connectivity_report(Some(&fake), EnvPresence::default());
        let detail = report
            .database
            .strip_prefix("⚠️  Connected but Error: ")
            .unwrap();
        assert_eq!(detail.chars().count(), MAX_ERROR_CHARS);
        assert_eq!(report.connection_status, "Connected");
        assert!(report.collections.is_empty());
    }
}
