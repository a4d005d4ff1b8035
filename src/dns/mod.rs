//! Zone and rrset resolution on top of the remote listing API.

pub mod finder;
pub mod rrset;
pub mod zone;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::error::{ApiError, DnsError};
use crate::selectel::types::{RRSet, RRSetCreate, RRSetUpdate, RecordType, Zone};
use finder::Page;

pub use rrset::get_rrset_by_name_and_type;
pub use zone::get_zone_by_name;

#[async_trait]
pub trait ZoneLister: Send + Sync {
    /// `filter` is matched by the server as a substring of the zone name.
    async fn list_zones(&self, filter: &str, limit: usize, offset: usize)
    -> Result<Page<Zone>, ApiError>;
}

#[async_trait]
pub trait RrsetLister: Send + Sync {
    async fn list_rrsets(
        &self,
        zone_id: &str,
        name: &str,
        rtype: &RecordType,
        limit: usize,
        offset: usize,
    ) -> Result<Page<RRSet>, ApiError>;
}

#[async_trait]
pub trait RrsetMutator: Send + Sync {
    async fn create_rrset(&self, zone_id: &str, rrset: &RRSetCreate) -> Result<RRSet, ApiError>;

    /// Replaces the TTL and the full record list of an existing rrset.
    async fn update_rrset(
        &self,
        zone_id: &str,
        rrset_id: &str,
        rrset: &RRSetUpdate,
    ) -> Result<(), ApiError>;

    async fn delete_rrset(&self, zone_id: &str, rrset_id: &str) -> Result<(), ApiError>;
}

/// Everything the challenge provider needs from the remote API.
pub trait DnsClient: ZoneLister + RrsetLister + RrsetMutator {}

impl<T: ZoneLister + RrsetLister + RrsetMutator> DnsClient for T {}

/// The API stores names in their Unicode form, so punycode input is
/// converted before it is used as a filter or compared.
pub(crate) fn to_unicode(name: &str) -> Result<String, DnsError> {
    let (unicode, result) = idna::domain_to_unicode(name);
    result.map_err(|e| DnsError::Idna {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    Ok(unicode)
}
