//! Identity and reference reconciliation.
//!
//! Every record is minted with a durable id. In the anonymising transport modes it also gets a
//! transport-local id, recorded once in the run's [`IdentityMap`]; references between records
//! then use the `urn:uuid:` form of that transport id so the receiving server never sees a
//! durable id.
//!
//! The map is owned by the orchestrator and passed by reference into every construction and
//! reconciliation step. It only grows: a durable id is mapped at most once per run.

use crate::config::TransportMode;
use crate::{KindlingError, KindlingResult};
use fhir::{Resource, ResourceId, ResourceKind};
use kindling_random::SeededRandom;
use std::collections::HashMap;

/// Run-scoped registry from durable id to transport-local id.
#[derive(Clone, Debug, Default)]
pub struct IdentityMap {
    mode: TransportMode,
    transport: HashMap<ResourceId, ResourceId>,
}

impl IdentityMap {
    pub fn new(mode: TransportMode) -> Self {
        Self {
            mode,
            transport: HashMap::new(),
        }
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Record the transport id for `durable`.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if `durable` is already mapped.
    pub fn insert(&mut self, durable: ResourceId, transport: ResourceId) -> KindlingResult<()> {
        if self.transport.contains_key(&durable) {
            return Err(KindlingError::Configuration(format!(
                "durable id {durable} was assigned a transport id twice"
            )));
        }
        self.transport.insert(durable, transport);
        Ok(())
    }

    /// Mint the durable id for a new record, plus its transport id when the mode anonymises.
    ///
    /// The durable id is drawn first so the stream order is the same in every mode up to the
    /// transport draw.
    pub fn assign(&mut self, rng: &mut SeededRandom) -> KindlingResult<ResourceId> {
        let durable = rng.resource_id();
        if self.mode.anonymises() {
            let transport = rng.resource_id();
            self.insert(durable, transport)?;
        }
        Ok(durable)
    }

    pub fn transport_for(&self, durable: &ResourceId) -> Option<ResourceId> {
        self.transport.get(durable).copied()
    }

    /// How other records should refer to the record with this durable id.
    pub fn reference_for(&self, kind: ResourceKind, durable: &ResourceId) -> String {
        match self.transport_for(durable) {
            Some(transport) => format!("urn:uuid:{transport}"),
            None => format!("{kind}/{durable}"),
        }
    }

    /// The `fullUrl` of this record's bundle entry.
    ///
    /// Returns `None` in an anonymising mode when the record was never mapped.
    pub fn full_url_for(&self, durable: &ResourceId) -> Option<String> {
        if self.mode.anonymises() {
            self.transport_for(durable)
                .map(|transport| format!("urn:uuid:{transport}"))
        } else {
            Some(format!("urn:uuid:{durable}"))
        }
    }

    pub fn len(&self) -> usize {
        self.transport.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transport.is_empty()
    }
}

/// Redirect relative `Kind/{durable}` references to their transport form.
///
/// References that are already `urn:uuid:` form, point at unmapped ids, or are not
/// `Kind/{uuid}` at all are left untouched, so running this twice changes nothing the second
/// time. Returns the number of references rewritten.
pub fn reconcile(records: &mut [Resource], map: &IdentityMap) -> usize {
    let mut rewritten = 0;
    for record in records.iter_mut() {
        for reference in record.references_mut() {
            let transport = reference.relative_parts().and_then(|(kind, id)| {
                kind.parse::<ResourceKind>().ok()?;
                let durable = ResourceId::parse(id).ok()?;
                map.transport_for(&durable)
            });
            if let Some(transport) = transport {
                reference.reference = format!("urn:uuid:{transport}");
                rewritten += 1;
            }
        }
    }
    rewritten
}
