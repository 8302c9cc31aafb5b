use crate::format::Formattable;
use libsilo::{RegistryRecord, Silo};
use serde::Serialize;
use tabled::Tabled;

pub mod handlers;

/// Registry row for listings; credentials are never shown
#[derive(Debug, Tabled, Serialize)]
pub struct RegistryDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "URL")]
    pub url: String,
    #[tabled(rename = "ORG")]
    pub org: String,
    #[tabled(rename = "LOGIN")]
    pub login: String,
}

impl From<RegistryRecord> for RegistryDisplay {
    fn from(record: RegistryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            url: record.url,
            org: record.org,
            login: record.username,
        }
    }
}

/// Registry check result
#[derive(Debug, Serialize)]
pub struct RegistryCheckResult {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Whether a backend answered
    pub online: bool,
    /// Backend serving the registry
    pub backend: Option<String>,
    /// Operator hint when the check failed
    pub error: Option<String>,
}

impl Formattable for RegistryCheckResult {
    fn format_pretty(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Registry: {} ({})\n", self.name, self.id));
        output.push_str(&format!("URL: {}\n", self.url));

        if self.online {
            output.push_str("Status: ✓ Online\n");
            if let Some(ref backend) = self.backend {
                output.push_str(&format!("Backend: {}\n", backend));
            }
        } else {
            output.push_str("Status: ✗ Offline\n");
            if let Some(ref error) = self.error {
                output.push_str(&format!("Reason: {}\n", error));
            }
        }

        output
    }
}

/// Verify and store a new registry, returning its id
pub(crate) async fn add_registry(silo: &Silo, record: RegistryRecord) -> Result<i64, String> {
    let username = record.username.clone();
    let password = record.password.clone();
    silo.add_registry(record)
        .await
        .map_err(|e| format!("{} ({})", e.operator_hint(&username, &password), e))
}

pub(crate) fn list_registries(silo: &Silo) -> Result<Vec<RegistryDisplay>, String> {
    silo.registries()
        .map(|records| records.into_iter().map(RegistryDisplay::from).collect())
        .map_err(|e| e.to_string())
}

pub(crate) fn remove_registry(silo: &Silo, id: i64) -> Result<RegistryRecord, String> {
    let record = silo.registry(id).map_err(|e| e.to_string())?;
    silo.remove_registry(id).map_err(|e| e.to_string())?;
    Ok(record)
}

pub(crate) async fn check_registry(silo: &Silo, id: i64) -> Result<RegistryCheckResult, String> {
    let record = silo.registry(id).map_err(|e| e.to_string())?;
    let mut result = RegistryCheckResult {
        id: record.id,
        name: record.name.clone(),
        url: record.url.clone(),
        online: false,
        backend: None,
        error: None,
    };

    match silo.check_registry(id).await {
        Ok(backend) => {
            result.online = true;
            result.backend = Some(backend.to_string());
        }
        Err(e) => result.error = Some(e.operator_hint(&record.username, &record.password)),
    }
    Ok(result)
}
