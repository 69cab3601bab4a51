// crates/repo-law-core/src/runtime/validation.rs
// ============================================================================
// Module: Validation Context
// Description: Per-run diagnostic aggregation and compliance verdict.
// Purpose: Collect validation messages and surface errors immediately.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A [`ValidationContext`] is created fresh for each validation pass. It
//! appends messages without deduplication and computes the verdict on demand.
//! Error-kind messages are also forwarded to the audit sink at the moment they
//! are added.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::Finding;
use crate::core::RepoRef;
use crate::core::RuleName;
use crate::core::ValidationMessage;
use crate::interfaces::AuditSink;
use crate::interfaces::ValidationAuditEvent;

// ============================================================================
// SECTION: Validation Context
// ============================================================================

/// Ordered, append-only collection of validation messages for one run.
pub struct ValidationContext {
    /// Repository under validation.
    repo: RepoRef,
    /// Operator-visible channel for error messages.
    audit: Arc<dyn AuditSink>,
    /// Messages in emission order.
    messages: Vec<ValidationMessage>,
}

impl ValidationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(repo: RepoRef, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            repo,
            audit,
            messages: Vec::new(),
        }
    }

    /// Appends a message, surfacing error-kind messages to the audit sink.
    pub fn add(&mut self, message: ValidationMessage) {
        if message.is_error() {
            self.audit.record_validation(&ValidationAuditEvent::error(
                &self.repo,
                message.rule.as_str(),
                &message.reason,
            ));
        }
        self.messages.push(message);
    }

    /// Returns true when no error-kind message has been added.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.messages.iter().any(ValidationMessage::is_error)
    }

    /// Returns messages in emission order.
    #[must_use]
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Consumes the context and returns its messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }
}

// ============================================================================
// SECTION: Rule-Scoped Adder
// ============================================================================

/// `add` callback handed to a rule's validate capability.
///
/// Stamps every finding with the rule's name before recording it.
pub struct Findings<'a> {
    /// Rule the findings are attributed to.
    rule: &'a RuleName,
    /// Shared context of the validation pass.
    context: &'a mut ValidationContext,
}

impl<'a> Findings<'a> {
    /// Binds an adder to a rule and context.
    #[must_use]
    pub const fn new(rule: &'a RuleName, context: &'a mut ValidationContext) -> Self {
        Self {
            rule,
            context,
        }
    }

    /// Records a finding for the bound rule.
    pub fn add(&mut self, finding: Finding) {
        self.context.add(finding.into_message(self.rule.clone()));
    }

    /// Returns the verdict of the shared context so far.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.context.is_valid()
    }
}
