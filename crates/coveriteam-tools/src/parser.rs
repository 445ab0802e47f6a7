//! Log-pattern result parser.
//!
//! Decision order:
//!
//! 1. The run hit its wall-time limit → `UNKNOWN` / `TIMEOUT`.
//! 2. The first verdict rule (declaration order) whose pattern matches any
//!    log line decides.
//! 3. Nothing matched and the tool exited with 0 → `UNKNOWN` / `unknown`.
//! 4. Otherwise → `ERROR` / `ERROR (<exit code>)`.

use regex::Regex;
use tracing::debug;

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    tool::{ToolDescriptor, ToolRun, VerdictRule},
    verdict::{ResultClass, Verdict},
};
use coveriteam_core::traits::ResultParser;

#[derive(Debug, Clone)]
pub struct PatternResultParser {
    rules: Vec<(VerdictRule, Regex)>,
}

impl PatternResultParser {
    pub fn new(rules: &[VerdictRule]) -> CoveriResult<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (rule.clone(), re))
                    .map_err(|e| CoveriError::Config {
                        reason: format!("verdict rule '{}': {e}", rule.id),
                    })
            })
            .collect::<CoveriResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn for_tool(descriptor: &ToolDescriptor) -> CoveriResult<Self> {
        Self::new(&descriptor.verdict_rules)
    }
}

impl ResultParser for PatternResultParser {
    fn determine_result(&self, run: &ToolRun) -> Verdict {
        if run.timed_out {
            return Verdict::new(ResultClass::Unknown, "TIMEOUT");
        }

        for (rule, re) in &self.rules {
            if run.log_lines.iter().any(|line| re.is_match(line)) {
                debug!(tool_id = %run.tool_id, rule_id = %rule.id, "verdict rule matched");
                return match &rule.result {
                    Some(result) => Verdict::new(rule.class, result.clone()),
                    None => Verdict::of(rule.class),
                };
            }
        }

        match run.exit_code {
            Some(0) => Verdict::of(ResultClass::Unknown),
            Some(code) => Verdict::new(ResultClass::Error, format!("ERROR ({code})")),
            None => Verdict::new(ResultClass::Error, "ERROR (killed)"),
        }
    }
}
