//! In-memory stand-in for the remote DNS API, used by unit tests.
//!
//! Listing filters behave like the real service: names are matched as
//! substrings, so prefixed names show up in results.

use std::sync::Mutex;

use async_trait::async_trait;

use super::finder::Page;
use super::{RrsetLister, RrsetMutator, ZoneLister};
use crate::error::ApiError;
use crate::selectel::types::{RRSet, RRSetCreate, RRSetUpdate, RecordItem, RecordType, Zone};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create { zone_id: String, body: RRSetCreate },
    Update { zone_id: String, rrset_id: String, body: RRSetUpdate },
    Delete { zone_id: String, rrset_id: String },
}

#[derive(Default)]
struct State {
    zones: Vec<Zone>,
    rrsets: Vec<(String, RRSet)>,
    next_id: usize,
    zone_list_calls: Vec<(String, usize, usize)>,
    rrset_list_offsets: Vec<usize>,
    mutations: Vec<Mutation>,
}

pub struct FakeDns {
    state: Mutex<State>,
    page_size: usize,
    zone_list_failure: Option<u16>,
    mutation_failure: Option<u16>,
}

impl FakeDns {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: usize::MAX,
            zone_list_failure: None,
            mutation_failure: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
            comment: None,
            disabled: false,
        });
        self
    }

    pub fn with_rrset(
        self,
        zone_id: &str,
        id: &str,
        name: &str,
        rtype: RecordType,
        contents: &[&str],
    ) -> Self {
        self.state.lock().unwrap().rrsets.push((
            zone_id.to_string(),
            RRSet {
                id: id.to_string(),
                name: name.to_string(),
                rtype,
                ttl: 300,
                records: contents.iter().map(|c| RecordItem::new(*c)).collect(),
                comment: None,
            },
        ));
        self
    }

    pub fn failing_zone_list(mut self, status: u16) -> Self {
        self.zone_list_failure = Some(status);
        self
    }

    pub fn failing_mutations(mut self, status: u16) -> Self {
        self.mutation_failure = Some(status);
        self
    }

    pub fn zone_list_calls(&self) -> Vec<(String, usize, usize)> {
        self.state.lock().unwrap().zone_list_calls.clone()
    }

    pub fn rrset_list_offsets(&self) -> Vec<usize> {
        self.state.lock().unwrap().rrset_list_offsets.clone()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    /// All rrsets of a zone carrying exactly `name`.
    pub fn rrsets_named(&self, zone_id: &str, name: &str) -> Vec<RRSet> {
        self.state
            .lock()
            .unwrap()
            .rrsets
            .iter()
            .filter(|(z, r)| z == zone_id && r.name == name)
            .map(|(_, r)| r.clone())
            .collect()
    }

    fn page<T: Clone>(&self, items: Vec<T>, limit: usize, offset: usize) -> Page<T> {
        let count = items.len();
        let end = count.min(offset + limit.min(self.page_size));
        let slice = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
        Page {
            items: slice,
            next_offset: if end < count { end } else { 0 },
            count,
        }
    }

    fn check_mutation(&self) -> Result<(), ApiError> {
        match self.mutation_failure {
            Some(status) => Err(ApiError::Status {
                status,
                body: "mutation rejected".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ZoneLister for FakeDns {
    async fn list_zones(
        &self,
        filter: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Page<Zone>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state
            .zone_list_calls
            .push((filter.to_string(), limit, offset));
        if let Some(status) = self.zone_list_failure {
            return Err(ApiError::Status {
                status,
                body: "zone listing failed".into(),
            });
        }
        let filter = filter.trim_end_matches('.');
        let matched = state
            .zones
            .iter()
            .filter(|z| z.name.contains(filter))
            .cloned()
            .collect();
        drop(state);
        Ok(self.page(matched, limit, offset))
    }
}

#[async_trait]
impl RrsetLister for FakeDns {
    async fn list_rrsets(
        &self,
        zone_id: &str,
        name: &str,
        rtype: &RecordType,
        limit: usize,
        offset: usize,
    ) -> Result<Page<RRSet>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.rrset_list_offsets.push(offset);
        let name = name.trim_end_matches('.');
        let matched = state
            .rrsets
            .iter()
            .filter(|(z, r)| z == zone_id && r.name.contains(name) && r.rtype == *rtype)
            .map(|(_, r)| r.clone())
            .collect();
        drop(state);
        Ok(self.page(matched, limit, offset))
    }
}

#[async_trait]
impl RrsetMutator for FakeDns {
    async fn create_rrset(&self, zone_id: &str, rrset: &RRSetCreate) -> Result<RRSet, ApiError> {
        self.check_mutation()?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = RRSet {
            id: format!("rrset-{}", state.next_id),
            name: rrset.name.clone(),
            rtype: rrset.rtype.clone(),
            ttl: rrset.ttl,
            records: rrset.records.clone(),
            comment: None,
        };
        state.rrsets.push((zone_id.to_string(), created.clone()));
        state.mutations.push(Mutation::Create {
            zone_id: zone_id.to_string(),
            body: rrset.clone(),
        });
        Ok(created)
    }

    async fn update_rrset(
        &self,
        zone_id: &str,
        rrset_id: &str,
        rrset: &RRSetUpdate,
    ) -> Result<(), ApiError> {
        self.check_mutation()?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .rrsets
            .iter_mut()
            .find(|(z, r)| z == zone_id && r.id == rrset_id)
            .map(|(_, r)| r)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: "rrset not found".into(),
            })?;
        existing.ttl = rrset.ttl;
        existing.records = rrset.records.clone();
        state.mutations.push(Mutation::Update {
            zone_id: zone_id.to_string(),
            rrset_id: rrset_id.to_string(),
            body: rrset.clone(),
        });
        Ok(())
    }

    async fn delete_rrset(&self, zone_id: &str, rrset_id: &str) -> Result<(), ApiError> {
        self.check_mutation()?;
        let mut state = self.state.lock().unwrap();
        let before = state.rrsets.len();
        state.rrsets.retain(|(z, r)| !(z == zone_id && r.id == rrset_id));
        if state.rrsets.len() == before {
            return Err(ApiError::Status {
                status: 404,
                body: "rrset not found".into(),
            });
        }
        state.mutations.push(Mutation::Delete {
            zone_id: zone_id.to_string(),
            rrset_id: rrset_id.to_string(),
        });
        Ok(())
    }
}
