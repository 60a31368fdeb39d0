use anyhow::Context;
use courtflow_core::{
    config::Config,
    plan::PracticePlans,
    queue::PlanQueues,
    record::{FieldSpec, OrgContext, Record, RecordList},
    session::{self, Session},
    store::{open_store, RecordStore},
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Run one command's async body to completion on a fresh runtime.
pub fn block_on<T>(fut: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(fut)
}

/// Everything a command needs: the open store and the organization scope
/// of the saved session.
pub struct Workspace {
    pub store: Arc<dyn RecordStore>,
    pub session: Session,
    pub org: OrgContext,
}

impl Workspace {
    pub async fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        for w in config.validate() {
            tracing::warn!("{}", w.message);
        }
        let store = open_store(root, &config.store).context("failed to open record store")?;
        let (session, org) = session::resume_or_bootstrap(root, &*store, &config)
            .await
            .context("failed to resolve organization")?;
        Ok(Self {
            store,
            session,
            org,
        })
    }

    pub async fn records<R: Record>(&self) -> anyhow::Result<RecordList<R>> {
        RecordList::open(Arc::clone(&self.store), &self.org)
            .await
            .with_context(|| format!("failed to load {}", R::COLLECTION))
    }

    pub async fn plans(&self) -> anyhow::Result<PracticePlans> {
        PracticePlans::open(Arc::clone(&self.store), PlanQueues::new(), &self.org)
            .await
            .context("failed to load practice plans")
    }
}

/// Edit one field of an organization record by column name.
pub async fn set_field<R: Record>(
    ws: &Workspace,
    id: &str,
    field: &str,
    value: &str,
) -> anyhow::Result<R> {
    let field = R::Field::parse(field).with_context(|| {
        let names: Vec<&str> = R::Field::all().iter().map(|f| f.column()).collect();
        format!("fields are: {}", names.join(", "))
    })?;
    let mut list = ws.records::<R>().await?;
    list.patch(id, field, value)
        .await
        .with_context(|| format!("failed to update {} '{id}'", R::COLLECTION))
}

/// Delete an organization record; unknown ids are reported, not fatal.
pub async fn remove<R: Record>(ws: &Workspace, id: &str) -> anyhow::Result<bool> {
    let mut list = ws.records::<R>().await?;
    list.delete(id)
        .await
        .with_context(|| format!("failed to delete {} '{id}'", R::COLLECTION))
}

pub fn print_removed(kind: &str, id: &str, removed: bool, json: bool) -> anyhow::Result<()> {
    if json {
        crate::output::print_json(&serde_json::json!({ "id": id, "removed": removed }))?;
    } else if removed {
        println!("Removed {kind} {id}");
    } else {
        println!("No {kind} {id}; nothing to remove");
    }
    Ok(())
}
