//! Bundle assembly.
//!
//! Turns a run's finished records into one or more output bundles of at most `max_size`
//! entries each. Every entry's `fullUrl` comes from the [`IdentityMap`]; transaction bundles
//! also get a request directive per entry, chosen by the transport mode.

use crate::config::TransportMode;
use crate::identity::IdentityMap;
use crate::{KindlingError, KindlingResult};
use chrono::{DateTime, Utc};
use fhir::{Bundle, BundleEntry, BundleEntryRequest, BundleType, Resource, ResourceKind};
use kindling_random::SeededRandom;

#[derive(Clone, Copy, Debug)]
pub struct BundleAssembler {
    container_type: BundleType,
    transport_mode: TransportMode,
    max_size: usize,
    now: DateTime<Utc>,
}

impl BundleAssembler {
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if `max_size` is zero.
    pub fn new(
        container_type: BundleType,
        transport_mode: TransportMode,
        max_size: usize,
        now: DateTime<Utc>,
    ) -> KindlingResult<Self> {
        if max_size == 0 {
            return Err(KindlingError::Configuration(
                "bundle size must be at least 1".into(),
            ));
        }
        Ok(Self {
            container_type,
            transport_mode,
            max_size,
            now,
        })
    }

    /// Split `records` into bundles, in order.
    ///
    /// Always returns at least one bundle; an empty record set yields one empty bundle. Every
    /// entry is built before any bundle is, so a bad record fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if `map` was built for a different transport
    /// mode, if a record has no durable id, or if an anonymised record has no transport id.
    pub fn assemble(
        &self,
        records: Vec<Resource>,
        map: &IdentityMap,
        rng: &mut SeededRandom,
    ) -> KindlingResult<Vec<Bundle>> {
        if map.mode() != self.transport_mode {
            return Err(KindlingError::Configuration(format!(
                "identity map was built for {} mode but bundles are assembled for {}",
                map.mode(),
                self.transport_mode
            )));
        }

        let entries = records
            .into_iter()
            .map(|record| self.entry(record, map))
            .collect::<KindlingResult<Vec<_>>>()?;

        if entries.is_empty() {
            return Ok(vec![Bundle::new(
                rng.resource_id(),
                self.container_type,
                self.now,
            )]);
        }

        let mut bundles = Vec::with_capacity(entries.len().div_ceil(self.max_size));
        let mut entries = entries.into_iter().peekable();
        while entries.peek().is_some() {
            let mut bundle = Bundle::new(rng.resource_id(), self.container_type, self.now);
            bundle.entry.extend(entries.by_ref().take(self.max_size));
            bundles.push(bundle);
        }

        tracing::debug!(
            bundles = bundles.len(),
            max_size = self.max_size,
            bundle_type = %self.container_type,
            "assembled bundles"
        );
        Ok(bundles)
    }

    fn entry(&self, mut record: Resource, map: &IdentityMap) -> KindlingResult<BundleEntry> {
        let kind = record.kind();
        let durable = record.id().ok_or_else(|| {
            KindlingError::Configuration(format!("{kind} record has no durable id"))
        })?;
        let full_url = map.full_url_for(&durable).ok_or_else(|| {
            KindlingError::Configuration(format!("{kind}/{durable} has no transport id"))
        })?;

        let request = match self.container_type {
            BundleType::Transaction => Some(self.request(&record, kind, &durable.to_string())),
            BundleType::Collection => None,
        };

        if self.transport_mode.anonymises() {
            record.set_id(None);
        }

        Ok(BundleEntry {
            full_url,
            resource: record,
            request,
        })
    }

    fn request(&self, record: &Resource, kind: ResourceKind, durable: &str) -> BundleEntryRequest {
        let identifier_query = record
            .business_identifier()
            .and_then(|identifier| identifier.search_token())
            .map(|token| format!("identifier={token}"));

        match self.transport_mode {
            TransportMode::Create => match identifier_query {
                Some(query) if kind == ResourceKind::Patient => {
                    BundleEntryRequest::conditional_post(kind.as_str(), query)
                }
                _ => BundleEntryRequest::post(kind.as_str()),
            },
            TransportMode::Conditional => BundleEntryRequest::conditional_post(
                kind.as_str(),
                identifier_query.unwrap_or_else(|| format!("_id={durable}")),
            ),
            TransportMode::Preserve => BundleEntryRequest::put_if_absent(format!("{kind}/{durable}")),
        }
    }
}
