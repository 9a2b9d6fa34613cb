//! Resource-kind allow-list applied to each subject's records.

use crate::identity::IdentityMap;
use crate::{KindlingError, KindlingResult};
use fhir::{Resource, ResourceKind};
use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceFilter {
    kinds: BTreeSet<ResourceKind>,
}

impl ResourceFilter {
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if `kinds` is empty.
    pub fn new(kinds: impl IntoIterator<Item = ResourceKind>) -> KindlingResult<Self> {
        let kinds: BTreeSet<ResourceKind> = kinds.into_iter().collect();
        if kinds.is_empty() {
            return Err(KindlingError::Configuration(
                "resource filter must name at least one resource type".into(),
            ));
        }
        Ok(Self { kinds })
    }

    pub fn allows(&self, kind: ResourceKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Keep the allowed kinds of one subject's records.
    ///
    /// A Patient that any surviving record points at is kept too, in its original position.
    /// Records are produced with each Patient ahead of the records that cite it, so that order
    /// carries over. This covers the related person's own Patient as well as the subject.
    pub fn apply(&self, records: Vec<Resource>, map: &IdentityMap) -> Vec<Resource> {
        let keep: Vec<bool> = {
            let cited: HashSet<&str> = records
                .iter()
                .filter(|record| self.allows(record.kind()))
                .flat_map(Resource::references)
                .map(|reference| reference.reference.as_str())
                .collect();
            records
                .iter()
                .map(|record| {
                    self.allows(record.kind())
                        || (record.kind() == ResourceKind::Patient
                            && record.id().is_some_and(|id| {
                                let reference = map.reference_for(ResourceKind::Patient, &id);
                                cited.contains(reference.as_str())
                            }))
                })
                .collect()
        };

        records
            .into_iter()
            .zip(keep)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect()
    }
}

impl FromStr for ResourceFilter {
    type Err = KindlingError;

    /// Parse a comma-separated list such as `Patient,Condition`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kinds = s
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<ResourceKind>()
                    .map_err(|e| KindlingError::Configuration(e.to_string()))
            })
            .collect::<KindlingResult<Vec<_>>>()?;
        Self::new(kinds)
    }
}
