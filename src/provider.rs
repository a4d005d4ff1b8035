//! Present/CleanUp of DNS-01 challenge values in a shared TXT rrset.
//!
//! Several challenges for the same FQDN share one rrset, each contributing one
//! quoted record. Updates are read-modify-write against the remote API, which
//! has no atomic append: two concurrent presents for the same FQDN can both
//! read the same rrset and the second write drops the value added by the
//! first. Locking here would not help across webhook replicas, so the race is
//! left to the caller's propagation check and retry.

use tracing::{debug, info};

use crate::dns::{DnsClient, get_rrset_by_name_and_type, get_zone_by_name};
use crate::error::DnsError;
use crate::selectel::types::{RRSet, RRSetCreate, RRSetUpdate, RecordItem, RecordType};

/// Wrap a challenge value the way TXT content is stored.
pub fn quote_txt(value: &str) -> String {
    format!("\"{value}\"")
}

pub struct DnsProvider<C> {
    client: C,
    ttl: u32,
}

impl<C: DnsClient> DnsProvider<C> {
    pub fn new(client: C, ttl: u32) -> Self {
        Self { client, ttl }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Add `key` to the TXT rrset of `fqdn`, creating the rrset if needed.
    ///
    /// An existing rrset gets the value appended without deduplication and
    /// keeps its own TTL.
    pub async fn present(&self, zone_name: &str, fqdn: &str, key: &str) -> Result<(), DnsError> {
        let zone = get_zone_by_name(&self.client, zone_name)
            .await
            .map_err(DnsError::stage("get zone"))?;
        let content = quote_txt(key);

        match get_rrset_by_name_and_type(&self.client, &zone.id, fqdn, &RecordType::Txt).await {
            Ok(rrset) => {
                let mut records = rrset.records.clone();
                records.push(RecordItem::new(content));
                self.update(&zone.id, &rrset, records).await
            }
            Err(err) if err.is_rrset_not_found() => {
                debug!(zone_id = %zone.id, fqdn, "no TXT rrset yet, creating one");
                let body = RRSetCreate {
                    name: fqdn.to_string(),
                    rtype: RecordType::Txt,
                    ttl: self.ttl,
                    records: vec![RecordItem::new(content)],
                };
                let created = self
                    .client
                    .create_rrset(&zone.id, &body)
                    .await
                    .map_err(DnsError::api("create rrset"))?;
                info!(zone_id = %zone.id, rrset_id = %created.id, fqdn, "created TXT rrset");
                Ok(())
            }
            Err(err) => Err(DnsError::stage("get rrset")(err)),
        }
    }

    /// Remove every record equal to the quoted `key` from the TXT rrset of
    /// `fqdn`. A rrset holding a single record is deleted outright.
    pub async fn cleanup(&self, zone_name: &str, fqdn: &str, key: &str) -> Result<(), DnsError> {
        let zone = get_zone_by_name(&self.client, zone_name)
            .await
            .map_err(DnsError::stage("get zone"))?;
        let rrset = get_rrset_by_name_and_type(&self.client, &zone.id, fqdn, &RecordType::Txt)
            .await
            .map_err(DnsError::stage("get rrset"))?;

        if rrset.records.len() == 1 {
            self.client
                .delete_rrset(&zone.id, &rrset.id)
                .await
                .map_err(DnsError::api("delete rrset"))?;
            info!(zone_id = %zone.id, rrset_id = %rrset.id, fqdn, "deleted TXT rrset");
            return Ok(());
        }

        let content = quote_txt(key);
        let records = rrset
            .records
            .iter()
            .filter(|r| r.content != content)
            .cloned()
            .collect();
        // may be empty if every record carried this key; still an update
        self.update(&zone.id, &rrset, records).await
    }

    async fn update(
        &self,
        zone_id: &str,
        rrset: &RRSet,
        records: Vec<RecordItem>,
    ) -> Result<(), DnsError> {
        let count = records.len();
        let body = RRSetUpdate {
            ttl: rrset.ttl,
            records,
        };
        self.client
            .update_rrset(zone_id, &rrset.id, &body)
            .await
            .map_err(DnsError::api("update rrset"))?;
        info!(zone_id, rrset_id = %rrset.id, records = count, "updated TXT rrset");
        Ok(())
    }
}
