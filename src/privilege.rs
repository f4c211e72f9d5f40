use crate::rwlock::CustomRwLock;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::time::sleep;
use tracing::{info, warn};

// Operators decline the fabricated consent prompt at this rate
const ELEVATION_DENIAL_PROBABILITY: f64 = 0.20;
const SESSION_DURATION_SECS: i64 = 600;

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElevationMethod {
    Sudo,
    Uac,
    Polkit,
}

fn platform_method() -> ElevationMethod {
    if cfg!(target_os = "windows") {
        ElevationMethod::Uac
    } else if cfg!(target_os = "linux") {
        ElevationMethod::Polkit
    } else {
        ElevationMethod::Sudo
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ElevationSession {
    pub method: ElevationMethod,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ElevationSession {
    pub fn is_active(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElevationAuditEntry {
    pub requested_at: DateTime<Utc>,
    pub reason: String,
    pub method: ElevationMethod,
    pub command: String,
    pub granted: bool,
}

// The seam a real backend would fill with UAC or sudo plumbing. The
// simulation fabricates the command string and rolls the consent dice.
#[async_trait]
pub trait ElevationBackend: Send + Sync {
    fn method(&self) -> ElevationMethod;
    fn elevation_command(&self, reason: &str) -> String;
    async fn request(&self, reason: &str) -> Result<ElevationSession>;
}

pub struct SimulatedElevation {
    denial_probability: f64,
}

impl SimulatedElevation {
    pub fn new() -> SimulatedElevation {
        SimulatedElevation {
            denial_probability: ELEVATION_DENIAL_PROBABILITY,
        }
    }
}

#[async_trait]
impl ElevationBackend for SimulatedElevation {
    fn method(&self) -> ElevationMethod {
        platform_method()
    }

    // The command that would have run, shown in the audit panel
    fn elevation_command(&self, reason: &str) -> String {
        match self.method() {
            ElevationMethod::Uac => format!(
                "Start-Process netmirage-helper.exe -Verb RunAs -ArgumentList '--grant \"{}\"'",
                reason
            ),
            ElevationMethod::Polkit => format!(
                "pkexec /usr/local/bin/netmirage-helper --grant \"{}\"",
                reason
            ),
            ElevationMethod::Sudo => format!(
                "sudo -n /usr/local/bin/netmirage-helper --grant \"{}\"",
                reason
            ),
        }
    }

    async fn request(&self, reason: &str) -> Result<ElevationSession> {
        // A consent prompt is never instant
        sleep(tokio::time::Duration::from_millis(10)).await;

        if rand::random::<f64>() < self.denial_probability {
            return Err(anyhow!("Elevation denied by the operator for '{}'", reason));
        }

        let granted_at = Utc::now();
        Ok(ElevationSession {
            method: self.method(),
            granted_at,
            expires_at: granted_at + Duration::seconds(SESSION_DURATION_SECS),
        })
    }
}

pub struct PrivilegeManager {
    backend: Box<dyn ElevationBackend>,
    session: CustomRwLock<Option<ElevationSession>>,
    audit: CustomRwLock<Vec<ElevationAuditEntry>>,
}

impl PrivilegeManager {
    pub fn new() -> PrivilegeManager {
        Self::with_backend(Box::new(SimulatedElevation::new()))
    }

    pub fn with_backend(backend: Box<dyn ElevationBackend>) -> PrivilegeManager {
        PrivilegeManager {
            backend,
            session: CustomRwLock::new(None),
            audit: CustomRwLock::new(Vec::new()),
        }
    }

    pub async fn is_elevated(&self) -> bool {
        match self.session.read().await.as_ref() {
            Some(session) => session.is_active(),
            None => false,
        }
    }

    // Every request lands in the audit trail with its outcome, a still
    // active session is reused without a new consent prompt
    pub async fn request_elevation(&self, reason: &str) -> Result<ElevationSession> {
        if let Some(session) = self.session.read().await.as_ref() {
            if session.is_active() {
                info!("Reusing active elevation session for '{}'", reason);
                return Ok(session.clone());
            }
        }

        let command = self.backend.elevation_command(reason);
        let outcome = self.backend.request(reason).await;

        let granted = outcome.is_ok();
        self.audit.write().await.push(ElevationAuditEntry {
            requested_at: Utc::now(),
            reason: reason.to_string(),
            method: self.backend.method(),
            command,
            granted,
        });

        match outcome {
            Ok(session) => {
                info!(
                    "Elevation granted via {} until {}",
                    session.method, session.expires_at
                );
                *self.session.write().await = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                warn!("Elevation request failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn drop_elevation(&self) {
        *self.session.write().await = None;
    }

    pub async fn audit_trail(&self) -> Vec<ElevationAuditEntry> {
        self.audit.read().await.clone()
    }
}

lazy_static! {
    static ref PRIVILEGE_MANAGER: PrivilegeManager = PrivilegeManager::new();
}

// Process-wide wrappers used by the shell
pub async fn get_admin_status() -> bool {
    PRIVILEGE_MANAGER.is_elevated().await
}

pub async fn request_privilege_elevation(reason: &str) -> Result<ElevationSession> {
    PRIVILEGE_MANAGER.request_elevation(reason).await
}

pub async fn privilege_audit_trail() -> Vec<ElevationAuditEntry> {
    PRIVILEGE_MANAGER.audit_trail().await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend {
        grant: bool,
    }

    #[async_trait]
    impl ElevationBackend for FixedBackend {
        fn method(&self) -> ElevationMethod {
            ElevationMethod::Sudo
        }

        fn elevation_command(&self, reason: &str) -> String {
            format!("sudo true # {}", reason)
        }

        async fn request(&self, reason: &str) -> Result<ElevationSession> {
            if !self.grant {
                return Err(anyhow!("denied: {}", reason));
            }
            let granted_at = Utc::now();
            Ok(ElevationSession {
                method: ElevationMethod::Sudo,
                granted_at,
                expires_at: granted_at + Duration::seconds(SESSION_DURATION_SECS),
            })
        }
    }

    #[tokio::test]
    async fn test_grant_then_reuse_session() {
        let manager = PrivilegeManager::with_backend(Box::new(FixedBackend { grant: true }));
        assert!(!manager.is_elevated().await);

        let first = manager.request_elevation("run sweep").await.unwrap();
        assert!(manager.is_elevated().await);

        // The second request reuses the session, no new audit entry
        let second = manager.request_elevation("run sweep again").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.audit_trail().await.len(), 1);
    }

    #[tokio::test]
    async fn test_denial_is_audited() {
        let manager = PrivilegeManager::with_backend(Box::new(FixedBackend { grant: false }));
        assert!(manager.request_elevation("run sweep").await.is_err());
        assert!(!manager.is_elevated().await);

        let audit = manager.audit_trail().await;
        assert_eq!(audit.len(), 1);
        assert!(!audit[0].granted);
        assert!(audit[0].command.contains("sudo"));
    }

    #[tokio::test]
    async fn test_expired_session_requires_new_request() {
        let manager = PrivilegeManager::with_backend(Box::new(FixedBackend { grant: true }));
        let expired = ElevationSession {
            method: ElevationMethod::Sudo,
            granted_at: Utc::now() - Duration::seconds(1200),
            expires_at: Utc::now() - Duration::seconds(600),
        };
        *manager.session.write().await = Some(expired);
        assert!(!manager.is_elevated().await);

        manager.request_elevation("fresh request").await.unwrap();
        assert!(manager.is_elevated().await);
        assert_eq!(manager.audit_trail().await.len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_backend_rates() {
        let backend = SimulatedElevation::new();
        let mut granted = 0;
        let mut denied = 0;
        for _ in 0..60 {
            match backend.request("rate probe").await {
                Ok(_) => granted += 1,
                Err(_) => denied += 1,
            }
        }
        // An 80% grant rate over 60 draws stays well inside these bounds
        assert!(granted > 30);
        assert!(granted + denied == 60);
    }

    #[tokio::test]
    async fn test_drop_elevation() {
        let manager = PrivilegeManager::with_backend(Box::new(FixedBackend { grant: true }));
        manager.request_elevation("run sweep").await.unwrap();
        manager.drop_elevation().await;
        assert!(!manager.is_elevated().await);
    }
}
