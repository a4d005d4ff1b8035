use tracing::debug;

use super::finder::{find_paginated, names_match};
use super::{RrsetLister, to_unicode};
use crate::error::DnsError;
use crate::selectel::types::{RRSet, RecordType};

/// Look up the rrset with exactly `name` and `rtype` inside one zone.
///
/// A missing rrset is an ordinary outcome (the first challenge for a name)
/// and comes back as [`DnsError::RrsetNotFound`].
pub async fn get_rrset_by_name_and_type<C>(
    client: &C,
    zone_id: &str,
    name: &str,
    rtype: &RecordType,
) -> Result<RRSet, DnsError>
where
    C: RrsetLister + ?Sized,
{
    let wanted = to_unicode(name)?;
    let wanted = wanted.as_str();

    let rrset = find_paginated(
        move |limit, offset| client.list_rrsets(zone_id, wanted, rtype, limit, offset),
        |rrset: &RRSet| names_match(&rrset.name, wanted) && rrset.rtype == *rtype,
    )
    .await
    .map_err(DnsError::api("list rrsets"))?;

    match rrset {
        Some(rrset) => {
            debug!(zone_id, rrset_id = %rrset.id, rrset_name = %rrset.name, "resolved rrset");
            Ok(rrset)
        }
        None => Err(DnsError::RrsetNotFound {
            name: name.to_string(),
            rtype: rtype.clone(),
        }),
    }
}
