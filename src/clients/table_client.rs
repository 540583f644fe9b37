use crate::clients::actor_client::ActorClient;
use crate::framework::{Filter, FrameworkError, ResourceClient};
use crate::model::{BranchId, ClaimRequest, Claimant, Table, TableCreate, TableId, TableStatus, TableUpdate};
use crate::table_actor::{ClaimGrant, TableAction, TableActionResult, TableError};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Table actor.
#[derive(Clone)]
pub struct TableClient {
    inner: ResourceClient<Table>,
}

fn unexpected(result: TableActionResult) -> TableError {
    TableError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

impl TableClient {
    pub fn new(inner: ResourceClient<Table>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, table), fields(number = %table.number))]
    pub async fn create_table(&self, table: TableCreate) -> Result<TableId, TableError> {
        debug!("Sending create_table to actor");
        self.inner.create(table).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_table(&self, id: TableId, update: TableUpdate) -> Result<Table, TableError> {
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    /// Active tables of a branch, in id order.
    #[instrument(skip(self))]
    pub async fn list_tables(&self, branch: BranchId) -> Result<Vec<Table>, TableError> {
        self.inner
            .list(Filter::new(move |t: &Table| t.branch_id == branch && !t.retired))
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn status(&self, id: TableId) -> Result<TableStatus, TableError> {
        Ok(self.fetch(id).await?.status)
    }

    #[instrument(skip(self))]
    pub async fn claim(&self, id: TableId, request: ClaimRequest) -> Result<ClaimGrant, TableError> {
        match self.inner.perform_action(id, TableAction::Claim(request)).await {
            Ok(TableActionResult::Claim(grant)) => Ok(grant),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn release(&self, id: TableId, claimant: Claimant, cleaning: bool) -> Result<TableStatus, TableError> {
        match self.inner.perform_action(id, TableAction::Release { claimant, cleaning }).await {
            Ok(TableActionResult::Release(status)) => Ok(status),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn mark_cleaned(&self, id: TableId) -> Result<TableStatus, TableError> {
        match self.inner.perform_action(id, TableAction::MarkCleaned).await {
            Ok(TableActionResult::MarkCleaned(status)) => Ok(status),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn block(&self, id: TableId) -> Result<TableStatus, TableError> {
        match self.inner.perform_action(id, TableAction::Block).await {
            Ok(TableActionResult::Block(status)) => Ok(status),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn unblock(&self, id: TableId) -> Result<TableStatus, TableError> {
        match self.inner.perform_action(id, TableAction::Unblock).await {
            Ok(TableActionResult::Unblock(status)) => Ok(status),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn set_qr_active(&self, id: TableId, active: bool) -> Result<bool, TableError> {
        match self.inner.perform_action(id, TableAction::SetQrActive(active)).await {
            Ok(TableActionResult::SetQrActive(active)) => Ok(active),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn retire(&self, id: TableId) -> Result<(), TableError> {
        match self.inner.perform_action(id, TableAction::Retire).await {
            Ok(TableActionResult::Retire(())) => Ok(()),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }
}

#[async_trait]
impl ActorClient<Table> for TableClient {
    type Error = TableError;

    fn inner(&self) -> &ResourceClient<Table> {
        &self.inner
    }

    fn map_error(e: FrameworkError<TableError>) -> Self::Error {
        TableError::from(e)
    }
}
