//! Read facade over the agent store.
//!
//! Safe to clone and query while a sync pass is running — the store
//! replaces rows atomically, so readers never see a torn record.

use crate::error::{ServiceError, ServiceResult};
use fleetwatch_store::{AgentFilter, AgentPage, AgentRecord, AgentStore};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Query interface for stored agent records.
#[derive(Clone)]
pub struct AgentDirectory {
    store: AgentStore,
}

impl AgentDirectory {
    pub fn new(store: AgentStore) -> Self {
        Self { store }
    }

    /// Lists agents matching the filter, clamping pagination first:
    /// `page < 1` becomes 1, `per_page` outside `[1, 100]` becomes 20.
    pub fn list_agents(&self, filter: AgentFilter) -> ServiceResult<AgentPage> {
        let filter = normalize(filter);
        let (records, total) = self.store.list(&filter)?;
        Ok(AgentPage {
            records,
            page: filter.page,
            per_page: filter.per_page,
            total,
        })
    }

    /// Gets one agent by its external id.
    pub fn get_agent(&self, external_id: &str) -> ServiceResult<AgentRecord> {
        self.store
            .get(external_id)?
            .ok_or_else(|| ServiceError::NotFound(external_id.to_string()))
    }

    /// Convenience listing of every agent in a group (first 100).
    pub fn agents_in_group(&self, group: &str) -> ServiceResult<AgentPage> {
        self.list_agents(AgentFilter {
            group: Some(group.to_string()),
            status: None,
            page: 1,
            per_page: MAX_PAGE_SIZE,
        })
    }
}

fn normalize(mut filter: AgentFilter) -> AgentFilter {
    if filter.page < 1 {
        filter.page = 1;
    }
    if filter.per_page < 1 || filter.per_page > MAX_PAGE_SIZE {
        filter.per_page = DEFAULT_PAGE_SIZE;
    }
    filter
}
