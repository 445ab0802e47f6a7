//! Branch conditions for `Ite` compositions.
//!
//! A condition is a small sealed expression tree evaluated against the
//! current bindings. It only ever reads artifact metadata (kind, verdict
//! class, absence) and never executes an actor.
//!
//! Two surface spellings are accepted by [`Condition::parse`]:
//!
//! ```text
//! ELEMENTOF(verdict, {TRUE, FALSE}) AND NOT INSTANCEOF(spec, BehaviorSpecification)
//! verdict in [RESULT_CLASS_TRUE, RESULT_CLASS_FALSE] and not isinstance(spec, BehaviorSpecification)
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use coveriteam_contracts::{
    artifact::{ArtifactKind, ArtifactValue},
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
    verdict::ResultClass,
};

/// A boolean expression over named artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Const(bool),
    /// True when the artifact is present; a verdict counts only if its class is `TRUE`.
    Name(String),
    /// True when the verdict bound to the name has one of the classes.
    ElementOf(String, BTreeSet<ResultClass>),
    /// True when the artifact bound to the name is of (a sub-kind of) the kind.
    InstanceOf(String, ArtifactKind),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn element_of<I>(name: impl Into<String>, classes: I) -> Self
    where
        I: IntoIterator<Item = ResultClass>,
    {
        Self::ElementOf(name.into(), classes.into_iter().collect())
    }

    pub fn instance_of(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self::InstanceOf(name.into(), kind)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Condition) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn and(self, other: Condition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Every artifact name the condition reads.
    pub fn names(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Const(_) => {}
            Self::Name(n) | Self::ElementOf(n, _) | Self::InstanceOf(n, _) => {
                out.insert(n.as_str());
            }
            Self::Not(c) => c.collect_names(out),
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_names(out);
                b.collect_names(out);
            }
        }
    }

    /// Composition-time check against the declared inputs of the enclosing
    /// actor: a verdict test over a name declared with another kind can never
    /// succeed.
    pub fn check_against(&self, contract: &ArtifactContract) -> CoveriResult<()> {
        match self {
            Self::ElementOf(name, _) => match contract.get(name) {
                Some(kind) if kind != ArtifactKind::Verdict => Err(CoveriError::composition(
                    format!("condition tests verdict classes of '{name}', which is declared as {kind}"),
                )),
                _ => Ok(()),
            },
            Self::Not(c) => c.check_against(contract),
            Self::And(a, b) | Self::Or(a, b) => {
                a.check_against(contract)?;
                b.check_against(contract)
            }
            _ => Ok(()),
        }
    }

    /// Evaluate against `bindings`. Referencing an unbound name is an error.
    pub fn evaluate(&self, bindings: &Bindings) -> CoveriResult<bool> {
        match self {
            Self::Const(b) => Ok(*b),
            Self::Name(name) => {
                let artifact = lookup(bindings, name)?;
                Ok(match artifact.value() {
                    ArtifactValue::Absent => false,
                    ArtifactValue::Verdict(v) => v.class == ResultClass::True,
                    _ => true,
                })
            }
            Self::ElementOf(name, classes) => {
                let artifact = lookup(bindings, name)?;
                if artifact.kind() != ArtifactKind::Verdict {
                    return Err(CoveriError::evaluation(format!(
                        "'{name}' is a {}, not a verdict",
                        artifact.kind()
                    )));
                }
                Ok(artifact
                    .as_verdict()
                    .is_some_and(|v| classes.contains(&v.class)))
            }
            Self::InstanceOf(name, kind) => Ok(lookup(bindings, name)?.kind().is_a(*kind)),
            Self::Not(c) => Ok(!c.evaluate(bindings)?),
            Self::And(a, b) => Ok(a.evaluate(bindings)? && b.evaluate(bindings)?),
            Self::Or(a, b) => Ok(a.evaluate(bindings)? || b.evaluate(bindings)?),
        }
    }

    /// Parse a condition string. Syntax errors are reported as
    /// [`CoveriError::Evaluation`].
    pub fn parse(input: &str) -> CoveriResult<Condition> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let cond = parser.parse_or()?;
        match parser.peek() {
            None => Ok(cond),
            Some(tok) => Err(CoveriError::evaluation(format!(
                "unexpected '{tok}' in condition '{input}'"
            ))),
        }
    }
}

fn lookup<'b>(
    bindings: &'b Bindings,
    name: &str,
) -> CoveriResult<&'b coveriteam_contracts::artifact::Artifact> {
    bindings
        .get(name)
        .ok_or_else(|| CoveriError::evaluation(format!("artifact '{name}' is not bound")))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(b) => write!(f, "{b}"),
            Self::Name(n) => f.write_str(n),
            Self::ElementOf(n, classes) => {
                let list: Vec<String> = classes.iter().map(ToString::to_string).collect();
                write!(f, "ELEMENTOF({n}, {{{}}})", list.join(", "))
            }
            Self::InstanceOf(n, k) => write!(f, "INSTANCEOF({n}, {k})"),
            Self::Not(c) => write!(f, "NOT {c}"),
            Self::And(a, b) => write!(f, "({a} AND {b})"),
            Self::Or(a, b) => write!(f, "({a} OR {b})"),
        }
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*(?:([A-Za-z_][A-Za-z0-9_]*)|([()\[\]{},]))").expect("valid token regex")
    })
}

fn tokenize(input: &str) -> CoveriResult<Vec<String>> {
    let re = token_regex();
    let mut tokens = Vec::new();
    let mut rest = input;
    while !rest.trim().is_empty() {
        let caps = re
            .captures(rest)
            .filter(|c| c.get(0).is_some_and(|m| m.start() == 0))
            .ok_or_else(|| {
                CoveriError::evaluation(format!(
                    "cannot tokenize condition '{input}' near '{}'",
                    rest.trim()
                ))
            })?;
        let whole = caps.get(0).map_or(0, |m| m.end());
        let tok = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        tokens.push(tok.to_string());
        rest = &rest[whole..];
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> CoveriResult<String> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| CoveriError::evaluation("condition ends unexpectedly"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, want: &str) -> CoveriResult<()> {
        let got = self.next()?;
        if got == want {
            Ok(())
        } else {
            Err(CoveriError::evaluation(format!("expected '{want}', found '{got}'")))
        }
    }

    fn eat_keyword(&mut self, upper: &str, lower: &str) -> bool {
        match self.peek() {
            Some(t) if t == upper || t == lower => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_or(&mut self) -> CoveriResult<Condition> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("OR", "or") {
            left = left.or(self.parse_and()?);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> CoveriResult<Condition> {
        let mut left = self.parse_unary()?;
        while self.eat_keyword("AND", "and") {
            left = left.and(self.parse_unary()?);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> CoveriResult<Condition> {
        if self.eat_keyword("NOT", "not") {
            return Ok(Condition::not(self.parse_unary()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> CoveriResult<Condition> {
        let tok = self.next()?;
        match tok.as_str() {
            "(" => {
                let inner = self.parse_or()?;
                self.expect(")")?;
                Ok(inner)
            }
            "true" => Ok(Condition::Const(true)),
            "false" => Ok(Condition::Const(false)),
            "ELEMENTOF" => {
                self.expect("(")?;
                let name = self.identifier()?;
                self.expect(",")?;
                let classes = self.class_list("{", "}")?;
                self.expect(")")?;
                Ok(Condition::ElementOf(name, classes))
            }
            "INSTANCEOF" | "isinstance" => {
                self.expect("(")?;
                let name = self.identifier()?;
                self.expect(",")?;
                let kind = self.identifier()?.parse::<ArtifactKind>()?;
                self.expect(")")?;
                Ok(Condition::InstanceOf(name, kind))
            }
            "," | ")" | "[" | "]" | "{" | "}" => {
                Err(CoveriError::evaluation(format!("unexpected '{tok}' in condition")))
            }
            _ => {
                if self.eat_keyword("in", "in") {
                    let classes = self.class_list("[", "]")?;
                    Ok(Condition::ElementOf(tok, classes))
                } else {
                    Ok(Condition::Name(tok))
                }
            }
        }
    }

    fn identifier(&mut self) -> CoveriResult<String> {
        let tok = self.next()?;
        if tok.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
            Ok(tok)
        } else {
            Err(CoveriError::evaluation(format!("expected a name, found '{tok}'")))
        }
    }

    fn class_list(&mut self, open: &str, close: &str) -> CoveriResult<BTreeSet<ResultClass>> {
        self.expect(open)?;
        let mut classes = BTreeSet::new();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(classes);
        }
        loop {
            classes.insert(self.identifier()?.parse::<ResultClass>()?);
            let sep = self.next()?;
            if sep == close {
                return Ok(classes);
            }
            if sep != "," {
                return Err(CoveriError::evaluation(format!(
                    "expected ',' or '{close}', found '{sep}'"
                )));
            }
        }
    }
}
