//! Typed, immutable artifacts exchanged between actors.
//!
//! An artifact is either a reference to a file produced or consumed by an
//! external tool, a verdict, or a set of test goals. Its `kind` is the
//! nominal type the composition layer checks at wiring time; two kinds are
//! never interchangeable except along the sub-kind relation of
//! [`ArtifactKind::is_a`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoveriError, CoveriResult},
    verdict::Verdict,
};

/// The nominal type tag of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Program,
    Specification,
    /// A behaviour (property) specification; a sub-kind of `Specification`.
    BehaviorSpecification,
    Witness,
    Verdict,
    TestSuite,
    TestSpecification,
    TestGoal,
}

impl ArtifactKind {
    /// Every kind, in declaration order.
    pub const ALL: [ArtifactKind; 8] = [
        Self::Program,
        Self::Specification,
        Self::BehaviorSpecification,
        Self::Witness,
        Self::Verdict,
        Self::TestSuite,
        Self::TestSpecification,
        Self::TestGoal,
    ];

    /// Return true if a value of kind `self` may be used where `other` is declared.
    pub fn is_a(self, other: ArtifactKind) -> bool {
        self == other || (self == Self::BehaviorSpecification && other == Self::Specification)
    }

    /// Return true if artifacts of this kind support [`Artifact::join`].
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::TestGoal)
    }

    /// Return true if an output of this kind may be legitimately missing,
    /// e.g. a verifier that produced no witness.
    pub fn tolerates_absence(self) -> bool {
        matches!(self, Self::Witness | Self::TestSuite | Self::TestGoal)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Program => "Program",
            Self::Specification => "Specification",
            Self::BehaviorSpecification => "BehaviorSpecification",
            Self::Witness => "Witness",
            Self::Verdict => "Verdict",
            Self::TestSuite => "TestSuite",
            Self::TestSpecification => "TestSpecification",
            Self::TestGoal => "TestGoal",
        };
        f.write_str(s)
    }
}

impl FromStr for ArtifactKind {
    type Err = CoveriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s.trim())
            .ok_or_else(|| CoveriError::evaluation(format!("unknown artifact kind '{s}'")))
    }
}

/// The payload of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactValue {
    /// A file or directory handed to or produced by an external tool.
    File(PathBuf),
    Verdict(Verdict),
    /// The set of test goals an accumulation has covered so far.
    Goals(BTreeSet<String>),
    /// The tool produced nothing for this output.
    Absent,
}

/// An immutable, typed value exchanged between actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    kind: ArtifactKind,
    value: ArtifactValue,
}

impl Artifact {
    fn file(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            value: ArtifactValue::File(path.into()),
        }
    }

    pub fn program(path: impl Into<PathBuf>) -> Self {
        Self::file(ArtifactKind::Program, path)
    }

    pub fn specification(path: impl Into<PathBuf>) -> Self {
        Self::file(ArtifactKind::Specification, path)
    }

    pub fn behavior_specification(path: impl Into<PathBuf>) -> Self {
        Self::file(ArtifactKind::BehaviorSpecification, path)
    }

    pub fn witness(path: impl Into<PathBuf>) -> Self {
        Self::file(ArtifactKind::Witness, path)
    }

    pub fn test_suite(path: impl Into<PathBuf>) -> Self {
        Self::file(ArtifactKind::TestSuite, path)
    }

    pub fn test_specification(path: impl Into<PathBuf>) -> Self {
        Self::file(ArtifactKind::TestSpecification, path)
    }

    pub fn verdict(verdict: Verdict) -> Self {
        Self {
            kind: ArtifactKind::Verdict,
            value: ArtifactValue::Verdict(verdict),
        }
    }

    pub fn test_goals<I, S>(goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ArtifactKind::TestGoal,
            value: ArtifactValue::Goals(goals.into_iter().map(Into::into).collect()),
        }
    }

    /// An artifact of `kind` that carries nothing.
    pub fn absent(kind: ArtifactKind) -> Self {
        Self {
            kind,
            value: ArtifactValue::Absent,
        }
    }

    /// Build a file artifact of an arbitrary file-backed kind.
    ///
    /// Fails for `Verdict` and `TestGoal`, which are not file-backed.
    pub fn from_path(kind: ArtifactKind, path: impl Into<PathBuf>) -> CoveriResult<Self> {
        match kind {
            ArtifactKind::Verdict | ArtifactKind::TestGoal => Err(CoveriError::composition(
                format!("artifact kind {kind} is not backed by a file"),
            )),
            _ => Ok(Self::file(kind, path)),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn value(&self) -> &ArtifactValue {
        &self.value
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.value, ArtifactValue::Absent)
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.value {
            ArtifactValue::File(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_verdict(&self) -> Option<&Verdict> {
        match &self.value {
            ArtifactValue::Verdict(v) => Some(v),
            _ => None,
        }
    }

    /// The goal set of a `TestGoal` artifact. An absent accumulation is empty.
    pub fn goals(&self) -> Option<BTreeSet<&str>> {
        match &self.value {
            ArtifactValue::Goals(g) => Some(g.iter().map(String::as_str).collect()),
            ArtifactValue::Absent if self.kind == ArtifactKind::TestGoal => Some(BTreeSet::new()),
            _ => None,
        }
    }

    /// Re-tag a file artifact with another file-backed kind, keeping its path.
    pub fn retagged(&self, kind: ArtifactKind) -> CoveriResult<Self> {
        match &self.value {
            ArtifactValue::File(p) => Self::from_path(kind, p.clone()),
            ArtifactValue::Absent => Ok(Self::absent(kind)),
            _ => Err(CoveriError::composition(format!(
                "cannot convert a {} artifact into {kind}",
                self.kind
            ))),
        }
    }

    /// Merge two accumulations of the same joinable kind.
    ///
    /// The result represents the union of both goal sets, so `join` is
    /// associative, commutative and idempotent.
    pub fn join(&self, other: &Artifact) -> CoveriResult<Artifact> {
        if !self.kind.is_joinable() || self.kind != other.kind {
            return Err(CoveriError::composition(format!(
                "cannot join {} with {}: only identical joinable kinds merge",
                self.kind, other.kind
            )));
        }
        let mut merged: BTreeSet<String> = BTreeSet::new();
        for side in [self, other] {
            if let ArtifactValue::Goals(goals) = &side.value {
                merged.extend(goals.iter().cloned());
            }
        }
        Ok(Self {
            kind: self.kind,
            value: ArtifactValue::Goals(merged),
        })
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ArtifactValue::File(p) => write!(f, "{}({})", self.kind, p.display()),
            ArtifactValue::Verdict(v) => write!(f, "{}({v})", self.kind),
            ArtifactValue::Goals(g) => write!(f, "{}({} goals)", self.kind, g.len()),
            ArtifactValue::Absent => write!(f, "{}(absent)", self.kind),
        }
    }
}
