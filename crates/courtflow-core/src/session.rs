//! Coaching account and organization bootstrap.
//!
//! The first time a user opens a project an organization is created for
//! them and linked from their profile. The resulting ids are kept in
//! `.courtflow/session.yaml` and handed to every list as an [`OrgContext`].

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CourtflowError, Result};
use crate::{io, paths};
use crate::record::OrgContext;
use crate::store::{decode, decode_all, single, Query, RecordStore, Row};
use crate::types::Collection;

pub const DEFAULT_FULL_NAME: &str = "Coach";

// ---------------------------------------------------------------------------
// Stored rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub organization_id: String,
}

impl Session {
    /// `None` when no session has been saved yet.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        io::read_yaml(&paths::session_path(root))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::write_yaml(&paths::session_path(root), self)
    }

    pub fn org(&self) -> OrgContext {
        OrgContext::new(&self.organization_id)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn validate_email(email: &str) -> Result<()> {
    if !email_re().is_match(email) {
        return Err(CourtflowError::invalid_value("email", email));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

pub async fn load_profile(store: &dyn RecordStore, user_id: &str) -> Result<Option<UserProfile>> {
    let rows = store
        .select(Collection::Users, &Query::new().eq("id", user_id))
        .await?;
    let mut profiles: Vec<UserProfile> = decode_all(Collection::Users, rows)?;
    Ok(profiles.pop())
}

async fn create_organization(store: &dyn RecordStore, name: &str) -> Result<Organization> {
    let row = store
        .insert(Collection::Organizations, single("name", json!(name)))
        .await?;
    let org: Organization = decode(Collection::Organizations, row)?;
    info!(organization_id = %org.id, name, "organization created");
    Ok(org)
}

/// Resolve the organization for `user_id`, creating the organization (and
/// the profile, if there is none) on first use.
pub async fn bootstrap(
    store: &dyn RecordStore,
    user_id: &str,
    email: Option<&str>,
    org_name: &str,
) -> Result<OrgContext> {
    if let Some(email) = email {
        validate_email(email)?;
    }
    let profile = load_profile(store, user_id).await?;
    if let Some(org_id) = profile.as_ref().and_then(|p| p.organization_id.clone()) {
        debug!(user_id, organization_id = %org_id, "existing organization");
        return Ok(OrgContext::new(org_id));
    }

    let org = create_organization(store, org_name).await?;
    match profile {
        Some(_) => {
            store
                .update(Collection::Users, user_id, single("organization_id", json!(org.id)))
                .await?;
        }
        None => {
            let mut row = Row::new();
            row.insert("id".into(), json!(user_id));
            row.insert(
                "email".into(),
                email.map_or(Value::Null, |e| Value::String(e.to_string())),
            );
            row.insert("full_name".into(), json!(DEFAULT_FULL_NAME));
            row.insert("organization_id".into(), json!(org.id));
            store.insert(Collection::Users, row).await?;
            info!(user_id, "user profile created");
        }
    }
    Ok(OrgContext::new(org.id))
}

/// Start a new local identity, bootstrap its organization, and save the
/// session for this project.
pub async fn sign_in(
    root: &Path,
    store: &dyn RecordStore,
    cfg: &Config,
    email: Option<&str>,
) -> Result<(Session, OrgContext)> {
    let user_id = uuid::Uuid::new_v4().to_string();
    let org = bootstrap(store, &user_id, email, &cfg.organization_name).await?;
    let session = Session {
        user_id,
        organization_id: org.organization_id.clone(),
    };
    session.save(root)?;
    Ok((session, org))
}

/// Reuse the saved session for this project, or sign in afresh.
pub async fn resume_or_bootstrap(
    root: &Path,
    store: &dyn RecordStore,
    cfg: &Config,
) -> Result<(Session, OrgContext)> {
    if let Some(session) = Session::load(root)? {
        let org = session.org();
        return Ok((session, org));
    }
    sign_in(root, store, cfg, None).await
}

pub async fn load_organization(store: &dyn RecordStore, org: &OrgContext) -> Result<Organization> {
    let rows = store
        .select(
            Collection::Organizations,
            &Query::new().eq("id", org.organization_id.as_str()),
        )
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| CourtflowError::not_found(Collection::Organizations, &org.organization_id))?;
    decode(Collection::Organizations, row)
}

pub async fn rename_organization(
    store: &dyn RecordStore,
    org: &OrgContext,
    name: &str,
) -> Result<Organization> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CourtflowError::invalid_value("name", name));
    }
    store
        .update(
            Collection::Organizations,
            &org.organization_id,
            single("name", json!(name)),
        )
        .await?;
    load_organization(store, org).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
