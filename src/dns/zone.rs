use tracing::debug;

use super::finder::{find_paginated, names_match};
use super::{ZoneLister, to_unicode};
use crate::error::DnsError;
use crate::selectel::types::Zone;

/// Look up a zone by its exact name.
///
/// Returns [`DnsError::ZoneNotFound`] when no listed zone carries that name,
/// which callers can tell apart from listing failures.
pub async fn get_zone_by_name<C>(client: &C, zone_name: &str) -> Result<Zone, DnsError>
where
    C: ZoneLister + ?Sized,
{
    let wanted = to_unicode(zone_name)?;
    let filter = wanted.as_str();

    let zone = find_paginated(
        move |limit, offset| client.list_zones(filter, limit, offset),
        |zone: &Zone| names_match(&zone.name, filter),
    )
    .await
    .map_err(DnsError::api("list zones"))?;

    match zone {
        Some(zone) => {
            debug!(zone_id = %zone.id, zone_name = %zone.name, "resolved zone");
            Ok(zone)
        }
        None => Err(DnsError::ZoneNotFound {
            zone: zone_name.to_string(),
        }),
    }
}
