//! Per-pattern conflict resolution rules
#![allow(dead_code)]

use crate::strategies::ConflictResolution;
use globset::{Glob, GlobMatcher};
use std::path::Path;

/// A conflict resolution rule for specific file patterns
#[derive(Debug, Clone)]
pub struct ConflictRule {
	/// Glob pattern to match files
	pattern: String,

	/// Compiled glob matcher
	matcher: GlobMatcher,

	/// Strategy to use for matching files
	strategy: ConflictResolution,
}

impl ConflictRule {
	/// Create a new conflict rule
	///
	/// # Arguments
	/// * `pattern` - Glob pattern (e.g., "*.log", "**/*.db")
	/// * `strategy` - Conflict resolution strategy for matching files
	///
	/// # Errors
	/// Returns error if pattern is invalid
	pub fn new(pattern: &str, strategy: ConflictResolution) -> Result<Self, String> {
		let glob = Glob::new(pattern).map_err(|e| format!("Invalid glob pattern: {}", e))?;

		Ok(ConflictRule { pattern: pattern.to_string(), matcher: glob.compile_matcher(), strategy })
	}

	/// Check if this rule matches the given path
	pub fn matches(&self, path: &Path) -> bool {
		self.matcher.is_match(path)
	}

	/// Get the strategy for this rule
	pub fn strategy(&self) -> &ConflictResolution {
		&self.strategy
	}

	/// Get the pattern for this rule
	pub fn pattern(&self) -> &str {
		&self.pattern
	}
}

/// A set of conflict resolution rules
#[derive(Debug, Clone)]
pub struct ConflictRuleSet {
	/// Rules in priority order (first match wins)
	rules: Vec<ConflictRule>,

	/// Default strategy if no rules match
	default_strategy: ConflictResolution,
}

impl ConflictRuleSet {
	/// Create a new rule set with default strategy
	pub fn new(default_strategy: ConflictResolution) -> Self {
		ConflictRuleSet { rules: Vec::new(), default_strategy }
	}

	/// Add a rule to the set
	///
	/// Rules are evaluated in the order they're added (first match wins)
	pub fn add_rule(&mut self, rule: ConflictRule) {
		self.rules.push(rule);
	}

	/// Find the appropriate strategy for a file path
	///
	/// Returns the strategy from the first matching rule, or default if no rules match
	pub fn strategy_for_path(&self, path: &Path) -> &ConflictResolution {
		for rule in &self.rules {
			if rule.matches(path) {
				return rule.strategy();
			}
		}
		&self.default_strategy
	}

	/// Get the number of rules
	pub fn rule_count(&self) -> usize {
		self.rules.len()
	}

	/// Get the default strategy
	pub fn default_strategy(&self) -> &ConflictResolution {
		&self.default_strategy
	}
}

impl Default for ConflictRuleSet {
	fn default() -> Self {
		Self::new(ConflictResolution::Interactive)
	}
}


// vim: ts=4
