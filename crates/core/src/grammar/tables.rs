//! Command table types plus the mapping from table checks to diagnostics.

pub use scpi_toolchain_spec_tables::{
    BUILTIN_UNITS, BooleanAttrs, ChannelListAttrs, CharDataAttrs, CommandSpec, CommandTable,
    MAX_NUM_SUFFIX, MAX_PARAMS, NumericAttrs, NumericListAttrs, ParamKind, ParamSpec,
    TABLE_FORMAT_VERSION, TableIssue, TableIssueKind, Unit, UnitSpec, ValueRange,
};

use super::diag::{Diagnostic, Severity, codes};
use std::collections::BTreeMap;

/// Convert a table check result into a diagnostic.
///
/// Issues that make a spec unusable are errors; the rest are warnings.
pub fn issue_diagnostic(issue: &TableIssue) -> Diagnostic {
    let id = match &issue.kind {
        TableIssueKind::FormatVersion { .. } => codes::TABLE_VERSION_MISMATCH,
        TableIssueKind::EmptyKeywords => codes::TABLE_EMPTY_KEYWORDS,
        TableIssueKind::UnbalancedOptional => codes::TABLE_UNBALANCED_OPTIONAL,
        TableIssueKind::TooManySuffixes { .. } => codes::TABLE_TOO_MANY_SUFFIXES,
        TableIssueKind::TooManyParams { .. } => codes::TABLE_TOO_MANY_PARAMS,
        TableIssueKind::UnreachableParam { .. } => codes::TABLE_UNREACHABLE_PARAM,
        TableIssueKind::BadDefaultItem { .. } => codes::TABLE_BAD_DEFAULT_ITEM,
        TableIssueKind::BadAlternate { .. } => codes::TABLE_BAD_ALTERNATE,
        TableIssueKind::BadDimensions { .. } => codes::TABLE_BAD_DIMENSIONS,
    };
    let severity = if issue.kind.is_error() {
        Severity::Error
    } else {
        Severity::Warn
    };
    let mut context = BTreeMap::new();
    if let Some(command) = issue.command {
        context.insert("command".to_string(), command.to_string());
    }
    if let Some(param) = issue.param {
        context.insert("param".to_string(), param.to_string());
    }
    let diag = Diagnostic::new(id, severity, issue.kind.to_string(), None);
    if context.is_empty() {
        diag
    } else {
        diag.with_context(context)
    }
}
