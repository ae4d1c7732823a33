//! Naming convention checks: kebab-case paths, snake_case parameters and
//! fields, UPPER_SNAKE_CASE enum values.

use super::{case, entries, get, schemas, type_is};
use crate::error::MarketError;
use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use std::sync::OnceLock;

const BOOLEAN_PREFIXES: &[&str] = &["is_", "has_", "can_", "should_", "will_"];
const OPERATION_METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

/// Which group of names to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Paths,
    Parameters,
    /// Schema fields and enum values are checked in one pass.
    Fields,
    Enums,
}

impl std::str::FromStr for Scope {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Scope::All),
            "paths" => Ok(Scope::Paths),
            "parameters" => Ok(Scope::Parameters),
            "fields" => Ok(Scope::Fields),
            "enums" => Ok(Scope::Enums),
            _ => Err(MarketError::InvalidFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NamingIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub current: String,
    pub suggested: String,
    pub location: String,
    pub reason: String,
}

impl NamingIssue {
    fn new(
        issue_type: impl Into<String>,
        current: &str,
        suggested: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            issue_type: issue_type.into(),
            current: current.to_string(),
            suggested: suggested.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for NamingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} → {}", self.issue_type, self.current, self.suggested)?;
        write!(f, "\n  Location: {}", self.location)?;
        if !self.reason.is_empty() {
            write!(f, "\n  Reason: {}", self.reason)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamingReport {
    pub file: String,
    pub total_issues: usize,
    pub issues: Vec<NamingIssue>,
}

impl NamingReport {
    pub fn new(file: impl Into<String>, issues: Vec<NamingIssue>) -> Self {
        Self {
            file: file.into(),
            total_issues: issues.len(),
            issues,
        }
    }

    /// Issues grouped by type, groups in first-seen order.
    pub fn grouped(&self) -> Vec<(&str, Vec<&NamingIssue>)> {
        let mut groups: Vec<(&str, Vec<&NamingIssue>)> = Vec::new();
        for issue in &self.issues {
            match groups.iter_mut().find(|(t, _)| *t == issue.issue_type) {
                Some((_, list)) => list.push(issue),
                None => groups.push((issue.issue_type.as_str(), vec![issue])),
            }
        }
        groups
    }
}

pub fn check(doc: &Value, scope: Scope) -> Vec<NamingIssue> {
    let mut issues = Vec::new();
    if matches!(scope, Scope::All | Scope::Paths) {
        check_paths(doc, &mut issues);
    }
    if matches!(scope, Scope::All | Scope::Parameters) {
        check_parameters(doc, &mut issues);
    }
    if matches!(scope, Scope::All | Scope::Fields | Scope::Enums) {
        for (name, schema) in schemas(doc) {
            check_fields(schema, &format!("#/components/schemas/{name}"), &mut issues);
        }
    }
    issues
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

fn check_paths(doc: &Value, issues: &mut Vec<NamingIssue>) {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    static PARAM: OnceLock<Regex> = OnceLock::new();
    let version = VERSION.get_or_init(|| Regex::new(r"^/v\d+").unwrap());
    let param = PARAM.get_or_init(|| Regex::new(r"\{[^}]+\}").unwrap());

    let Some(paths) = get(doc, "paths") else {
        return;
    };

    for (path, _) in entries(paths) {
        let unversioned = version.replace(&path, "");
        let bare = param.replace_all(&unversioned, "");

        for part in bare.split('/').filter(|p| !p.is_empty()) {
            if !case::is_kebab_case(part) {
                let suggested = case::kebab_case(part);
                if suggested != part {
                    issues.push(NamingIssue::new(
                        "Path Segment",
                        part,
                        suggested,
                        path.as_str(),
                        "URI paths should use kebab-case",
                    ));
                }
            }

            if part.contains('_') {
                issues.push(NamingIssue::new(
                    "Path Segment",
                    part,
                    part.replace('_', "-"),
                    path.as_str(),
                    "Use hyphens instead of underscores in URI paths",
                ));
            }

            if part.chars().any(|c| c.is_ascii_uppercase()) {
                issues.push(NamingIssue::new(
                    "Path Segment",
                    part,
                    part.to_lowercase(),
                    path.as_str(),
                    "URI paths should be lowercase",
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

fn check_parameters(doc: &Value, issues: &mut Vec<NamingIssue>) {
    let Some(paths) = get(doc, "paths") else {
        return;
    };

    for (path, item) in entries(paths) {
        if let Some(params) = get(item, "parameters") {
            check_parameter_list(params, &path, issues);
        }
        for method in OPERATION_METHODS {
            if let Some(params) = get(item, method).and_then(|op| get(op, "parameters")) {
                let location = format!("{path} [{}]", method.to_uppercase());
                check_parameter_list(params, &location, issues);
            }
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn boolean_prefix(name: &str) -> Option<&'static str> {
    BOOLEAN_PREFIXES.iter().copied().find(|p| name.starts_with(p))
}

fn check_parameter_list(params: &Value, location: &str, issues: &mut Vec<NamingIssue>) {
    let Some(params) = params.as_sequence() else {
        return;
    };

    for param in params {
        let Some(name) = get(param, "name").and_then(Value::as_str) else {
            continue;
        };
        let param_in = get(param, "in").and_then(Value::as_str).unwrap_or("query");
        let kind = format!("{} Parameter", title_case(param_in));

        if matches!(param_in, "query" | "header") && !case::is_snake_case(name) {
            let suggested = case::snake_case(name);
            if suggested != name {
                issues.push(NamingIssue::new(
                    kind.as_str(),
                    name,
                    suggested,
                    format!("{location} ({param_in})"),
                    "Query and header parameters should use snake_case",
                ));
            }
        }

        if let Some(prefix) = boolean_prefix(name) {
            issues.push(NamingIssue::new(
                kind.as_str(),
                name,
                &name[prefix.len()..],
                location,
                format!("Boolean parameters should omit '{prefix}' prefix"),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Schema fields and enums
// ---------------------------------------------------------------------------

fn past_tense_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(created|updated|deleted|published)_time$").unwrap())
}

fn check_fields(schema: &Value, path: &str, issues: &mut Vec<NamingIssue>) {
    let Some(props) = get(schema, "properties") else {
        return;
    };

    for (field, field_schema) in entries(props) {
        let at = format!("{path}/properties/{field}");
        let lower = field.to_lowercase();

        if !case::is_snake_case(&field) {
            let suggested = case::snake_case(&field);
            if suggested != field {
                issues.push(NamingIssue::new(
                    "Field Name",
                    &field,
                    suggested,
                    at.as_str(),
                    "Field names should use snake_case",
                ));
            }
        }

        if let Some(prefix) = boolean_prefix(&field) {
            if type_is(field_schema, "boolean") {
                issues.push(NamingIssue::new(
                    "Field Name",
                    &field,
                    &field[prefix.len()..],
                    at.as_str(),
                    format!("Boolean fields should omit '{prefix}' prefix"),
                ));
            }
        }

        if lower.contains("time") || lower.contains("date") {
            if let Some(stem) = field.strip_suffix("_at") {
                issues.push(NamingIssue::new(
                    "Field Name",
                    &field,
                    format!("{stem}_time"),
                    at.as_str(),
                    "Time fields should end with '_time' not '_at'",
                ));
            }
            if past_tense_re().is_match(&field) {
                let stem = field.strip_suffix("d_time").unwrap_or(&field);
                issues.push(NamingIssue::new(
                    "Field Name",
                    &field,
                    format!("{stem}_time"),
                    at.as_str(),
                    "Use present tense: create_time not created_time",
                ));
            }
        }

        if let Some(rest) = field.strip_prefix("num_") {
            issues.push(NamingIssue::new(
                "Field Name",
                &field,
                format!("{rest}_count"),
                at.as_str(),
                "Use suffix '_count' instead of prefix 'num_'",
            ));
        }

        if lower.contains("url") && !lower.contains("uri") {
            issues.push(NamingIssue::new(
                "Field Name",
                &field,
                field.replace("url", "uri"),
                at.as_str(),
                "Use 'uri' instead of 'url' (all URLs are URIs)",
            ));
        }

        if let Some(values) = get(field_schema, "enum").and_then(Value::as_sequence) {
            for value in values.iter().filter_map(Value::as_str) {
                if case::is_upper_snake_case(value) {
                    continue;
                }
                let suggested = case::upper_snake_case(value);
                if suggested != value {
                    issues.push(NamingIssue::new(
                        "Enum Value",
                        value,
                        suggested,
                        at.as_str(),
                        "Enum values should use UPPER_SNAKE_CASE",
                    ));
                }
            }
        }

        if type_is(field_schema, "object") {
            check_fields(field_schema, &at, issues);
        }
    }
}
