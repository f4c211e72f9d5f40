use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{info, warn};

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UserRole {
    Client,
    Manager,
    LocalAdmin,
    Developer,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Permission {
    ViewTopology,
    RunDiscovery,
    ManageAlerts,
    ExportData,
    ManageUsers,
    ElevatePrivileges,
}

impl UserRole {
    // Fixed permission sets, the dashboard renders its menus from these
    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            UserRole::Client => vec![Permission::ViewTopology, Permission::ExportData],
            UserRole::Manager => vec![
                Permission::ViewTopology,
                Permission::RunDiscovery,
                Permission::ManageAlerts,
                Permission::ExportData,
            ],
            UserRole::LocalAdmin => vec![
                Permission::ViewTopology,
                Permission::RunDiscovery,
                Permission::ManageAlerts,
                Permission::ExportData,
                Permission::ManageUsers,
                Permission::ElevatePrivileges,
            ],
            UserRole::Developer => vec![
                Permission::ViewTopology,
                Permission::RunDiscovery,
                Permission::ManageAlerts,
                Permission::ExportData,
                Permission::ElevatePrivileges,
            ],
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MembershipTier {
    Free,
    Pro,
    Enterprise,
}

// Counters only move forward, the dashboard draws trends from them
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UsageMetrics {
    pub logins: u64,
    pub scans_started: u64,
    pub exports: u64,
    pub last_active: DateTime<Utc>,
}

impl UsageMetrics {
    fn new() -> UsageMetrics {
        UsageMetrics {
            logins: 0,
            scans_started: 0,
            exports: 0,
            last_active: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UsageAction {
    Login,
    ScanStarted,
    Export,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserAuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub permissions: Vec<Permission>,
    pub tier: MembershipTier,
    pub metrics: UsageMetrics,
    pub audit: Vec<UserAuditEntry>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(username: &str, email: &str, role: UserRole, tier: MembershipTier) -> UserProfile {
        UserProfile {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            permissions: role.permissions(),
            tier,
            metrics: UsageMetrics::new(),
            audit: vec![UserAuditEntry {
                timestamp: Utc::now(),
                action: format!("account created with role {}", role),
            }],
            created_at: Utc::now(),
        }
    }
}

lazy_static! {
    static ref USERS: DashMap<String, UserProfile> = DashMap::new();
}

pub fn add_user(username: &str, email: &str, role: UserRole, tier: MembershipTier) -> UserProfile {
    let profile = UserProfile::new(username, email, role, tier);
    info!("Adding user {} with role {}", username, role);
    USERS.insert(profile.id.clone(), profile.clone());
    profile
}

pub fn get_user(user_id: &str) -> Option<UserProfile> {
    USERS.get(user_id).map(|entry| entry.value().clone())
}

pub fn find_by_username(username: &str) -> Option<UserProfile> {
    USERS
        .iter()
        .find(|entry| entry.username == username)
        .map(|entry| entry.value().clone())
}

pub fn list_users() -> Vec<UserProfile> {
    let mut users: Vec<UserProfile> = USERS.iter().map(|entry| entry.value().clone()).collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    users
}

// Role changes rewrite the permission set and always leave an audit entry
pub fn set_user_role(user_id: &str, role: UserRole) -> bool {
    match USERS.get_mut(user_id) {
        Some(mut entry) => {
            let previous = entry.role;
            entry.role = role;
            entry.permissions = role.permissions();
            entry.audit.push(UserAuditEntry {
                timestamp: Utc::now(),
                action: format!("role changed from {} to {}", previous, role),
            });
            true
        }
        None => {
            warn!("Role change for unknown user {}", user_id);
            false
        }
    }
}

pub fn record_usage(user_id: &str, action: UsageAction) -> bool {
    match USERS.get_mut(user_id) {
        Some(mut entry) => {
            match action {
                UsageAction::Login => entry.metrics.logins += 1,
                UsageAction::ScanStarted => entry.metrics.scans_started += 1,
                UsageAction::Export => entry.metrics.exports += 1,
            }
            entry.metrics.last_active = Utc::now();
            entry.audit.push(UserAuditEntry {
                timestamp: Utc::now(),
                action: action.to_string(),
            });
            true
        }
        None => false,
    }
}

pub fn has_permission(user_id: &str, permission: Permission) -> bool {
    USERS
        .get(user_id)
        .map(|entry| entry.permissions.contains(&permission))
        .unwrap_or(false)
}

pub fn remove_user(user_id: &str) -> bool {
    USERS.remove(user_id).is_some()
}

pub fn clear_users() {
    USERS.clear();
}
