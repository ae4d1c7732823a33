//! API design guideline checks for OpenAPI documents.

use super::{case, entries, get, has, schemas, type_is};
use crate::types::Severity;
use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use std::sync::OnceLock;

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];
const SUCCESS_CODES: &[&str] = &["200", "201", "204"];
const ERROR_REQUIRED: &[&str] = &["type", "title"];
const ERROR_RECOMMENDED: &[&str] = &["status", "detail", "instance", "trace_id"];
const MAX_PATH_SEGMENTS: usize = 4;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub path: String,
    pub suggestion: String,
}

impl Issue {
    fn new(severity: Severity, category: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.into(),
            path: String::new(),
            suggestion: String::new(),
        }
    }

    fn at(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;
        if !self.path.is_empty() {
            write!(f, "\n  Path: {}", self.path)?;
        }
        if !self.suggestion.is_empty() {
            write!(f, "\n  Suggestion: {}", self.suggestion)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub file: String,
    pub total_issues: usize,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn new(file: impl Into<String>, issues: Vec<Issue>, min: Severity) -> Self {
        let issues: Vec<Issue> = issues
            .into_iter()
            .filter(|i| i.severity.at_least(min))
            .collect();
        Self {
            file: file.into(),
            total_issues: issues.len(),
            issues,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.severity == severity).collect()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Run every rule against `doc`, in rule order.
pub fn validate(doc: &Value) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_structure(doc, &mut issues);
    check_versioning(doc, &mut issues);
    check_paths(doc, &mut issues);
    check_schemas(doc, &mut issues);
    check_responses(doc, &mut issues);
    check_error_schemas(doc, &mut issues);
    issues
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/v\d+(/|$)").unwrap())
}

fn version_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/v\d+").unwrap())
}

fn path_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^}]+\}").unwrap())
}

fn kebab_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9\-/{}]+$").unwrap())
}

fn check_structure(doc: &Value, issues: &mut Vec<Issue>) {
    match get(doc, "openapi").and_then(super::key_str) {
        None => issues.push(
            Issue::new(Severity::Error, "Structure", "Missing 'openapi' field")
                .suggest("Add 'openapi: 3.0.0' or higher"),
        ),
        Some(v) if !v.starts_with("3.") => issues.push(
            Issue::new(
                Severity::Warning,
                "Structure",
                format!("OpenAPI version {v} may not be supported"),
            )
            .suggest("Use OpenAPI 3.0 or higher"),
        ),
        Some(_) => {}
    }

    for field in ["info", "paths"] {
        if !has(doc, field) {
            issues.push(Issue::new(
                Severity::Error,
                "Structure",
                format!("Missing required field '{field}'"),
            ));
        }
    }

    if let Some(info) = get(doc, "info") {
        for field in ["title", "version"] {
            if !has(info, field) {
                issues.push(Issue::new(
                    Severity::Error,
                    "Info",
                    format!("Missing required info field '{field}'"),
                ));
            }
        }
    }
}

fn check_versioning(doc: &Value, issues: &mut Vec<Issue>) {
    let Some(paths) = get(doc, "paths") else {
        return;
    };
    let paths = entries(paths);
    let mut any_versioned = false;

    for (path, _) in &paths {
        if version_re().is_match(path) {
            any_versioned = true;
        } else {
            issues.push(
                Issue::new(
                    Severity::Error,
                    "Versioning",
                    format!("Path does not start with version: {path}"),
                )
                .at(path.as_str())
                .suggest("Paths should start with /v{major_version} (e.g., /v1)"),
            );
        }
    }

    if !any_versioned && !paths.is_empty() {
        issues.push(
            Issue::new(Severity::Error, "Versioning", "No versioned paths found")
                .suggest("All paths should start with /v{major_version}"),
        );
    }
}

fn check_paths(doc: &Value, issues: &mut Vec<Issue>) {
    let Some(paths) = get(doc, "paths") else {
        return;
    };

    for (path, _) in entries(paths) {
        let unversioned = version_prefix_re().replace(&path, "");
        let bare = path_param_re().replace_all(&unversioned, "");

        if !bare.is_empty() && !kebab_path_re().is_match(&bare) {
            issues.push(
                Issue::new(
                    Severity::Error,
                    "Naming",
                    format!("Path does not use kebab-case: {path}"),
                )
                .at(path.as_str())
                .suggest("Use kebab-case for URI paths (e.g., /validate-otp not /validate_otp)"),
            );
        }

        if bare.contains('_') {
            issues.push(
                Issue::new(
                    Severity::Error,
                    "Naming",
                    format!("Path contains underscores: {path}"),
                )
                .at(path.as_str())
                .suggest("Replace underscores with hyphens"),
            );
        }

        let depth = unversioned
            .split('/')
            .filter(|p| !p.is_empty() && !p.starts_with('{'))
            .count();
        if depth > MAX_PATH_SEGMENTS {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    "Resource Modeling",
                    format!("Path has deep nesting: {path}"),
                )
                .at(path.as_str())
                .suggest("Limit resource hierarchy to 2 levels"),
            );
        }
    }
}

fn check_schemas(doc: &Value, issues: &mut Vec<Issue>) {
    for (name, schema) in schemas(doc) {
        let path = format!("#/components/schemas/{name}");

        if let Some(props) = get(schema, "properties") {
            for (field, field_schema) in entries(props) {
                check_field_name(&field, &path, issues);
                check_field_schema(&field, field_schema, &format!("{path}/properties/{field}"), issues);
            }
        }

        if get(schema, "additionalProperties").and_then(Value::as_bool) == Some(false) {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    "Schema",
                    format!("Schema sets additionalProperties to false: {name}"),
                )
                .at(path.as_str())
                .suggest("Remove additionalProperties: false to allow forward compatibility"),
            );
        }
    }
}

fn check_field_name(field: &str, schema_path: &str, issues: &mut Vec<Issue>) {
    let at = format!("{schema_path}/properties/{field}");

    if !case::is_snake_case(field) {
        issues.push(
            Issue::new(
                Severity::Error,
                "Naming",
                format!("Field does not use snake_case: {field}"),
            )
            .at(at.as_str())
            .suggest(format!("Use snake_case: {}", case::snake_case(field))),
        );
    }

    if field.starts_with("is_") || field.starts_with("has_") {
        let bare = field.replace("is_", "").replace("has_", "");
        issues.push(
            Issue::new(
                Severity::Warning,
                "Naming",
                format!("Boolean field uses prefix: {field}"),
            )
            .at(at)
            .suggest(format!("Remove prefix: {bare}")),
        );
    }
}

fn check_field_schema(field: &str, schema: &Value, path: &str, issues: &mut Vec<Issue>) {
    let warn = |msg: String, suggestion: &str| {
        Issue::new(Severity::Warning, "Schema", msg)
            .at(path)
            .suggest(suggestion)
    };

    if type_is(schema, "string") {
        if !has(schema, "minLength") {
            issues.push(warn(
                format!("String field missing minLength: {field}"),
                "Add minLength constraint",
            ));
        }
        if !has(schema, "maxLength") {
            issues.push(warn(
                format!("String field missing maxLength: {field}"),
                "Add maxLength constraint (default: 255)",
            ));
        }
    } else if type_is(schema, "number") {
        issues.push(warn(
            format!("Field uses 'number' type: {field}"),
            "Use 'string' for decimals or 'integer' for whole numbers",
        ));
    } else if type_is(schema, "integer") {
        if !has(schema, "minimum") {
            issues.push(warn(
                format!("Integer field missing minimum: {field}"),
                "Add minimum constraint",
            ));
        }
        if !has(schema, "maximum") {
            issues.push(warn(
                format!("Integer field missing maximum: {field}"),
                "Add maximum constraint",
            ));
        }
    } else if type_is(schema, "array") && !has(schema, "maxItems") {
        issues.push(warn(
            format!("Array field missing maxItems: {field}"),
            "Add maxItems constraint (default: 32767)",
        ));
    }

    let nullable = match get(schema, "type") {
        Some(Value::String(t)) => t == "null",
        Some(Value::Sequence(types)) => types.iter().any(|t| t.as_str() == Some("null")),
        _ => false,
    };
    if nullable {
        issues.push(
            Issue::new(
                Severity::Error,
                "Schema",
                format!("Field allows null: {field}"),
            )
            .at(path)
            .suggest("Remove null type - use field absence for undefined"),
        );
    }
}

fn check_responses(doc: &Value, issues: &mut Vec<Issue>) {
    let Some(paths) = get(doc, "paths") else {
        return;
    };

    for (path, item) in entries(paths) {
        for (method, operation) in entries(item) {
            let upper = method.to_uppercase();
            if !HTTP_METHODS.contains(&upper.as_str()) {
                continue;
            }

            let Some(responses) = get(operation, "responses") else {
                issues.push(
                    Issue::new(
                        Severity::Error,
                        "Responses",
                        format!("Operation missing responses: {upper} {path}"),
                    )
                    .at(format!("{path}/{method}")),
                );
                continue;
            };

            let at = format!("{path}/{method}/responses");
            if !SUCCESS_CODES.iter().any(|c| has(responses, c)) {
                issues.push(
                    Issue::new(
                        Severity::Warning,
                        "Responses",
                        format!("No success response defined: {upper} {path}"),
                    )
                    .at(at.as_str())
                    .suggest("Add 200, 201, or 204 response"),
                );
            }
            if !has(responses, "400") && !has(responses, "4XX") {
                issues.push(
                    Issue::new(
                        Severity::Info,
                        "Responses",
                        format!("No 400 error response defined: {upper} {path}"),
                    )
                    .at(at)
                    .suggest("Add 400 Bad Request response"),
                );
            }
        }
    }
}

fn check_error_schemas(doc: &Value, issues: &mut Vec<Issue>) {
    if get(doc, "components").and_then(|c| get(c, "schemas")).is_none() {
        return;
    }

    let mut found = false;
    for (name, schema) in schemas(doc) {
        let lower = name.to_lowercase();
        if !(lower.contains("error") || lower.contains("problem")) {
            continue;
        }
        found = true;

        let Some(props) = get(schema, "properties") else {
            continue;
        };
        let at = format!("#/components/schemas/{name}");
        for field in ERROR_REQUIRED {
            if !has(props, field) {
                issues.push(
                    Issue::new(
                        Severity::Error,
                        "Error Handling",
                        format!("Error schema missing required field '{field}': {name}"),
                    )
                    .at(at.as_str())
                    .suggest(format!("Add '{field}' field per RFC 9457")),
                );
            }
        }
        for field in ERROR_RECOMMENDED {
            if !has(props, field) {
                issues.push(
                    Issue::new(
                        Severity::Info,
                        "Error Handling",
                        format!("Error schema missing recommended field '{field}': {name}"),
                    )
                    .at(at.as_str()),
                );
            }
        }
    }

    if !found {
        issues.push(
            Issue::new(Severity::Warning, "Error Handling", "No error schema found")
                .suggest("Define RFC 9457 compliant problem_detail schema"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    const CLEAN: &str = r#"
openapi: 3.0.3
info:
  title: Orders
  version: 1.0.0
paths:
  /v1/orders/{order_id}:
    get:
      responses:
        200:
          description: ok
        400:
          description: bad
components:
  schemas:
    ProblemDetail:
      type: object
      properties:
        type: {type: string, minLength: 1, maxLength: 255}
        title: {type: string, minLength: 1, maxLength: 255}
        status: {type: integer, minimum: 400, maximum: 599}
        detail: {type: string, minLength: 1, maxLength: 255}
        instance: {type: string, minLength: 1, maxLength: 255}
        trace_id: {type: string, minLength: 1, maxLength: 64}
"#;

    #[test]
    fn clean_document_has_no_issues() {
        assert!(validate(&doc(CLEAN)).is_empty(), "{:?}", validate(&doc(CLEAN)));
    }

    #[test]
    fn structure_and_info_fields() {
        let issues = validate(&doc("openapi: '2.0'\ninfo:\n  title: x\n"));
        let msgs = messages(&issues);
        assert!(msgs.contains(&"OpenAPI version 2.0 may not be supported"));
        assert!(msgs.contains(&"Missing required field 'paths'"));
        assert!(msgs.contains(&"Missing required info field 'version'"));
        assert!(issues.iter().any(|i| i.category == "Info"));
    }

    #[test]
    fn unversioned_and_snake_paths() {
        let issues = validate(&doc(
            "openapi: 3.1.0\ninfo: {title: a, version: b}\npaths:\n  /user_profiles: {}\n",
        ));
        let msgs = messages(&issues);
        assert!(msgs.contains(&"Path does not start with version: /user_profiles"));
        assert!(msgs.contains(&"No versioned paths found"));
        assert!(msgs.contains(&"Path does not use kebab-case: /user_profiles"));
        assert!(msgs.contains(&"Path contains underscores: /user_profiles"));
    }

    #[test]
    fn deep_nesting_is_a_warning() {
        let issues = validate(&doc(
            "openapi: 3.1.0\ninfo: {title: a, version: b}\npaths:\n  /v1/a/b/{id}/c/d/e: {}\n",
        ));
        let deep = issues
            .iter()
            .find(|i| i.category == "Resource Modeling")
            .unwrap();
        assert_eq!(deep.severity, Severity::Warning);
    }

    #[test]
    fn schema_field_rules() {
        let issues = validate(&doc(
            r#"
openapi: 3.0.0
info: {title: a, version: b}
paths: {}
components:
  schemas:
    Order:
      additionalProperties: false
      properties:
        orderId: {type: string, minLength: 1, maxLength: 10}
        is_paid: {type: boolean}
        total: {type: number}
        tags: {type: array}
        note: {type: [string, "null"], minLength: 0, maxLength: 5}
"#,
        ));
        let camel = issues
            .iter()
            .find(|i| i.message == "Field does not use snake_case: orderId")
            .unwrap();
        assert_eq!(camel.suggestion, "Use snake_case: order_id");
        assert_eq!(camel.path, "#/components/schemas/Order/properties/orderId");

        let msgs = messages(&issues);
        assert!(msgs.contains(&"Boolean field uses prefix: is_paid"));
        assert!(msgs.contains(&"Field uses 'number' type: total"));
        assert!(msgs.contains(&"Array field missing maxItems: tags"));
        assert!(msgs.contains(&"Field allows null: note"));
        assert!(msgs.contains(&"Schema sets additionalProperties to false: Order"));
        assert!(msgs.contains(&"No error schema found"));
    }

    #[test]
    fn response_rules() {
        let issues = validate(&doc(
            r#"
openapi: 3.0.0
info: {title: a, version: b}
paths:
  /v1/things:
    parameters: []
    get: {}
    post:
      responses:
        4XX: {description: bad}
"#,
        ));
        let msgs = messages(&issues);
        assert!(msgs.contains(&"Operation missing responses: GET /v1/things"));
        assert!(msgs.contains(&"No success response defined: POST /v1/things"));
        assert!(!msgs.iter().any(|m| m.starts_with("No 400")));
    }

    #[test]
    fn error_schema_fields() {
        let issues = validate(&doc(
            r#"
openapi: 3.0.0
info: {title: a, version: b}
paths: {}
components:
  schemas:
    ApiError:
      properties:
        title: {type: string, minLength: 1, maxLength: 9}
"#,
        ));
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.category == "Error Handling")
            .collect();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0].message, "Error schema missing required field 'type': ApiError");
        assert_eq!(errors[0].severity, Severity::Error);
    }

    #[test]
    fn report_filters_by_severity() {
        let issues = validate(&doc("info: {title: a, version: b}\npaths:\n  /v1/x:\n    get: {responses: {201: {}}}\n"));
        let report = Report::new("api.yaml", issues.clone(), Severity::Error);
        assert!(report.has_errors());
        assert!(report.issues.iter().all(|i| i.severity == Severity::Error));

        let everything = Report::new("api.yaml", issues, Severity::Info);
        assert!(everything.total_issues > report.total_issues);
        assert_eq!(everything.by_severity(Severity::Info).len(), 1);
    }
}
