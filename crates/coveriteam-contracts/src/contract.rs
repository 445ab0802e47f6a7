//! Actor contracts (named, typed artifact slots) and runtime bindings.
//!
//! An `ArtifactContract` is what an actor declares; `Bindings` is what flows
//! through it at run time. Both are ordered by name so logs, traces and
//! error messages are stable across runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    artifact::{Artifact, ArtifactKind},
    error::{CoveriError, CoveriResult},
};

/// A map from artifact name to its declared kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactContract {
    slots: BTreeMap<String, ArtifactKind>,
}

impl ArtifactContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of one slot.
    pub fn with(mut self, name: impl Into<String>, kind: ArtifactKind) -> Self {
        self.slots.insert(name.into(), kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<ArtifactKind> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ArtifactKind)> {
        self.slots.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Union of two contracts. A name declared on both sides must carry the
    /// same kind.
    pub fn union(&self, other: &ArtifactContract) -> CoveriResult<ArtifactContract> {
        let mut slots = self.slots.clone();
        for (name, kind) in other.iter() {
            match slots.get(name) {
                Some(existing) if *existing != kind => {
                    return Err(CoveriError::composition(format!(
                        "artifact '{name}' is declared as both {existing} and {kind}"
                    )));
                }
                _ => {
                    slots.insert(name.to_string(), kind);
                }
            }
        }
        Ok(Self { slots })
    }

    /// Union of two contracts whose names must not overlap.
    pub fn disjoint_union(&self, other: &ArtifactContract) -> CoveriResult<ArtifactContract> {
        if let Some(name) = other.names().find(|n| self.contains(n)) {
            return Err(CoveriError::composition(format!(
                "artifact name '{name}' is produced by more than one actor"
            )));
        }
        self.union(other)
    }

    /// The sub-contract restricted to `names`. Every name must be declared.
    pub fn project<'a, I>(&self, names: I) -> CoveriResult<ArtifactContract>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut slots = BTreeMap::new();
        for name in names {
            let kind = self.get(name).ok_or_else(|| {
                CoveriError::composition(format!("artifact '{name}' is not declared"))
            })?;
            slots.insert(name.to_string(), kind);
        }
        Ok(Self { slots })
    }

    /// The contract with names replaced per `renames`; unmapped names stay.
    ///
    /// Fails if two slots end up under the same name.
    pub fn renamed(&self, renames: &BTreeMap<String, String>) -> CoveriResult<ArtifactContract> {
        let mut slots = BTreeMap::new();
        for (name, kind) in self.iter() {
            let target = renames.get(name).cloned().unwrap_or_else(|| name.to_string());
            if slots.insert(target.clone(), kind).is_some() {
                return Err(CoveriError::composition(format!(
                    "renaming maps two artifacts onto '{target}'"
                )));
            }
        }
        Ok(Self { slots })
    }
}

impl<S: Into<String>> FromIterator<(S, ArtifactKind)> for ArtifactContract {
    fn from_iter<T: IntoIterator<Item = (S, ArtifactKind)>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().map(|(n, k)| (n.into(), k)).collect(),
        }
    }
}

/// A map from artifact name to a bound artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    values: BTreeMap<String, Artifact>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of one binding.
    pub fn with(mut self, name: impl Into<String>, artifact: Artifact) -> Self {
        self.values.insert(name.into(), artifact);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, artifact: Artifact) {
        self.values.insert(name.into(), artifact);
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.values.get(name)
    }

    /// Look up `name`, reporting a contract violation of `actor` if unbound.
    pub fn require(&self, actor: &str, name: &str) -> CoveriResult<&Artifact> {
        self.values
            .get(name)
            .ok_or_else(|| CoveriError::contract(actor, format!("artifact '{name}' is not bound")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.values.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `self` overlaid with `other`; on shared names `other` wins.
    pub fn merged(&self, other: &Bindings) -> Bindings {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(n, a)| (n.clone(), a.clone())));
        Self { values }
    }

    /// The bindings restricted to the names declared in `contract`.
    ///
    /// Names the contract declares but that are unbound are skipped; callers
    /// that need completeness check with [`Bindings::missing`].
    pub fn project(&self, contract: &ArtifactContract) -> Bindings {
        Self {
            values: self
                .values
                .iter()
                .filter(|(n, _)| contract.contains(n))
                .map(|(n, a)| (n.clone(), a.clone()))
                .collect(),
        }
    }

    /// Names declared by `contract` that are not bound here.
    pub fn missing<'c>(&self, contract: &'c ArtifactContract) -> BTreeSet<&'c str> {
        contract.names().filter(|n| !self.contains(n)).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, Artifact)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (S, Artifact)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(n, a)| (n.into(), a)).collect(),
        }
    }
}
