//! RFC 9457 problem-detail schema generation.

use super::case;
use crate::error::{MarketError, Result};
use crate::types::OutputFormat;
use serde_json::{json, Map, Value};

const TRACE_ID_EXAMPLE: &str = "90957fca61718";

/// Which document to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Standard,
    Business,
    Responses,
    Catalog,
}

impl std::str::FromStr for SchemaKind {
    type Err = MarketError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "standard" => Ok(SchemaKind::Standard),
            "business" => Ok(SchemaKind::Business),
            "responses" => Ok(SchemaKind::Responses),
            "catalog" => Ok(SchemaKind::Catalog),
            _ => Err(MarketError::InvalidFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorSchemaRequest {
    pub code: Option<String>,
    pub title: Option<String>,
    pub fields: Vec<String>,
    pub api_name: Option<String>,
    pub base_path: Option<String>,
}

/// Problem `type` URI for `code` under `base_uri`.
fn type_uri(base_uri: &str, code: &str) -> String {
    format!("{}/{code}", base_uri.trim_end_matches('/'))
}

pub fn generate(kind: SchemaKind, req: &ErrorSchemaRequest, base_uri: &str) -> Result<Value> {
    match kind {
        SchemaKind::Standard => Ok(json!({
            "components": {
                "schemas": {
                    "ProblemDetail": problem_detail_schema(base_uri),
                    "ValidationError": validation_error_schema(base_uri),
                }
            }
        })),
        SchemaKind::Business => {
            let code = required(&req.code, "--code")?;
            let title = required(&req.title, "--title")?;
            let name = format!("{}Error", case::pascal_case(code));
            let mut schemas = Map::new();
            schemas.insert(name, business_error_schema(base_uri, code, title, &req.fields));
            Ok(json!({ "components": { "schemas": schemas } }))
        }
        SchemaKind::Responses => Ok(json!({
            "components": { "responses": error_responses(base_uri) }
        })),
        SchemaKind::Catalog => {
            let api_name = required(&req.api_name, "--api-name")?;
            let base_path = required(&req.base_path, "--base-path")?;
            Ok(error_catalog(base_uri, api_name, base_path))
        }
    }
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MarketError::MissingArgument(flag.to_string()))
}

/// Serialize a generated document. TypeScript is not a target here.
pub fn render(doc: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(doc)?)),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(doc)?),
        OutputFormat::Ts => Err(MarketError::InvalidFormat(format.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn problem_detail_schema(base_uri: &str) -> Value {
    json!({
        "type": "object",
        "title": "Problem Detail",
        "description": "RFC 9457 compliant error response",
        "required": ["type", "title", "trace_id"],
        "properties": {
            "type": {
                "type": "string",
                "format": "uri",
                "description": "URI reference identifying the problem type",
                "example": type_uri(base_uri, "invalid-request"),
            },
            "title": {
                "type": "string",
                "description": "Short, human-readable summary of the problem type",
                "example": "Request is not well-formed, syntactically incorrect, or violates schema.",
            },
            "status": {
                "type": "integer",
                "minimum": 400,
                "maximum": 599,
                "description": "HTTP status code for this occurrence of the problem",
                "example": 400,
            },
            "detail": {
                "type": "string",
                "description": "Human-readable explanation specific to this occurrence",
                "example": "The credit_card.expire_month field is required",
            },
            "instance": {
                "type": "string",
                "format": "uri-reference",
                "description": "URI reference identifying the specific occurrence",
                "example": "/v1/checkout/orders/123",
            },
            "trace_id": {
                "type": "string",
                "description": "Correlation and tracing identifier",
                "example": TRACE_ID_EXAMPLE,
            },
            "errors": {
                "type": "array",
                "description": "Array of detailed validation errors (for 400 Bad Request)",
                "items": { "$ref": "#/components/schemas/ValidationError" },
            },
        },
    })
}

fn validation_error_schema(base_uri: &str) -> Value {
    json!({
        "type": "object",
        "title": "Validation Error",
        "description": "Detailed validation error information",
        "required": ["code", "reason", "property", "location"],
        "properties": {
            "code": {
                "type": "string",
                "format": "uri",
                "description": "URI identifying the specific error code",
                "example": type_uri(base_uri, "missing-required-property"),
            },
            "reason": {
                "type": "string",
                "description": "Human-readable explanation of the error",
                "example": "A required field is missing.",
            },
            "property": {
                "type": "string",
                "description": "JSON Pointer to the field in error",
                "example": "/credit_card/expire_month",
            },
            "location": {
                "type": "string",
                "enum": ["body", "query", "path", "header"],
                "description": "Location of the field in the request",
                "example": "body",
            },
        },
    })
}

fn business_error_schema(base_uri: &str, code: &str, title: &str, fields: &[String]) -> Value {
    let uri = type_uri(base_uri, code);
    let mut all_of = vec![
        json!({ "$ref": "#/components/schemas/ProblemDetail" }),
        json!({
            "type": "object",
            "properties": {
                "type": { "type": "string", "format": "uri", "enum": [uri], "example": uri },
                "title": { "type": "string", "enum": [title], "example": title },
            },
        }),
    ];

    let extra: Map<String, Value> = fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(|f| {
            (
                f.to_string(),
                json!({ "type": "string", "description": format!("Additional context for {f}") }),
            )
        })
        .collect();
    if !extra.is_empty() {
        all_of.push(json!({ "type": "object", "properties": extra }));
    }

    json!({ "allOf": all_of })
}

/// (response name, status, problem code, description, title, detail)
const RESPONSES: &[(&str, u16, &str, &str, &str, Option<&str>)] = &[
    (
        "400BadRequest",
        400,
        "invalid-request",
        "Bad Request - Request is not well-formed, syntactically incorrect, or violates schema",
        "Request is not well-formed, syntactically incorrect, or violates schema.",
        None,
    ),
    (
        "401Unauthorized",
        401,
        "authentication-failure",
        "Unauthorized - Authentication failed",
        "Authentication failed due to invalid credentials.",
        None,
    ),
    (
        "403Forbidden",
        403,
        "authorization-failure",
        "Forbidden - Authorization failed due to insufficient permissions",
        "Authorization failed due to insufficient permissions.",
        None,
    ),
    (
        "404NotFound",
        404,
        "resource-not-found",
        "Not Found - The specified resource does not exist",
        "The specified resource does not exist.",
        None,
    ),
    (
        "409Conflict",
        409,
        "resource-conflict",
        "Conflict - Request conflicts with current state",
        "The server has detected a conflict while processing this request.",
        None,
    ),
    (
        "422UnprocessableEntity",
        422,
        "unprocessable-entity",
        "Unprocessable Entity - Request failed semantic validation",
        "The request cannot be processed due to semantic errors.",
        Some("Cannot void a payment that has already been captured"),
    ),
    (
        "500InternalServerError",
        500,
        "internal-server-error",
        "Internal Server Error - An unexpected error occurred",
        "An internal server error has occurred.",
        None,
    ),
];

fn error_responses(base_uri: &str) -> Map<String, Value> {
    RESPONSES
        .iter()
        .map(|(name, status, code, description, title, detail)| {
            let mut example = Map::new();
            example.insert("type".into(), json!(type_uri(base_uri, code)));
            example.insert("title".into(), json!(title));
            example.insert("status".into(), json!(status));
            if let Some(detail) = detail {
                example.insert("detail".into(), json!(detail));
            }
            example.insert("trace_id".into(), json!(TRACE_ID_EXAMPLE));
            if *status == 400 {
                example.insert(
                    "errors".into(),
                    json!([{
                        "code": type_uri(base_uri, "missing-required-property"),
                        "reason": "A required field is missing.",
                        "property": "/email_address",
                        "location": "body",
                    }]),
                );
            }

            let response = json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ProblemDetail" },
                        "example": example,
                    }
                }
            });
            (name.to_string(), response)
        })
        .collect()
}

fn error_catalog(base_uri: &str, api_name: &str, base_path: &str) -> Value {
    json!({
        "language": "en-US",
        "basePath": base_path,
        "title": api_name,
        "description": format!("All errors in {api_name} API"),
        "operations": [{
            "operationId": "resource.create",
            "errors": [
                {
                    "type": type_uri(base_uri, "out-of-credit"),
                    "title": "You do not have enough credit.",
                },
                {
                    "type": type_uri(base_uri, "amount-mismatch"),
                    "title": "Amount calculation mismatch.",
                },
            ],
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://errors.example.dev/";

    #[test]
    fn standard_has_problem_detail_and_validation_error() {
        let doc = generate(SchemaKind::Standard, &ErrorSchemaRequest::default(), BASE).unwrap();
        let schemas = &doc["components"]["schemas"];
        assert_eq!(schemas["ProblemDetail"]["required"], json!(["type", "title", "trace_id"]));
        assert_eq!(
            schemas["ProblemDetail"]["properties"]["type"]["example"],
            "https://errors.example.dev/invalid-request"
        );
        assert!(schemas["ValidationError"]["properties"]["location"]["enum"].is_array());
    }

    #[test]
    fn business_schema_name_and_fields() {
        let req = ErrorSchemaRequest {
            code: Some("out-of-credit".into()),
            title: Some("You do not have enough credit.".into()),
            fields: vec!["balance".into(), " cost ".into()],
            ..Default::default()
        };
        let doc = generate(SchemaKind::Business, &req, BASE).unwrap();
        let schema = &doc["components"]["schemas"]["OutOfCreditError"];
        let all_of = schema["allOf"].as_array().unwrap();
        assert_eq!(all_of.len(), 3);
        assert_eq!(
            all_of[1]["properties"]["type"]["enum"][0],
            "https://errors.example.dev/out-of-credit"
        );
        assert!(all_of[2]["properties"]["cost"].is_object());
    }

    #[test]
    fn business_without_fields_has_two_parts() {
        let req = ErrorSchemaRequest {
            code: Some("amount-mismatch".into()),
            title: Some("Mismatch".into()),
            ..Default::default()
        };
        let doc = generate(SchemaKind::Business, &req, BASE).unwrap();
        assert_eq!(
            doc["components"]["schemas"]["AmountMismatchError"]["allOf"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn business_and_catalog_require_arguments() {
        let empty = ErrorSchemaRequest::default();
        assert!(matches!(
            generate(SchemaKind::Business, &empty, BASE),
            Err(MarketError::MissingArgument(_))
        ));
        assert!(matches!(
            generate(SchemaKind::Catalog, &empty, BASE),
            Err(MarketError::MissingArgument(_))
        ));
    }

    #[test]
    fn responses_cover_standard_statuses() {
        let doc = generate(SchemaKind::Responses, &ErrorSchemaRequest::default(), BASE).unwrap();
        let responses = doc["components"]["responses"].as_object().unwrap();
        assert_eq!(responses.len(), 7);
        let bad = &responses["400BadRequest"]["content"]["application/json"]["example"];
        assert_eq!(bad["status"], 400);
        assert!(bad["errors"].is_array());
        let unprocessable = &responses["422UnprocessableEntity"]["content"]["application/json"]["example"];
        assert!(unprocessable["detail"].is_string());
    }

    #[test]
    fn catalog_and_yaml_render() {
        let req = ErrorSchemaRequest {
            api_name: Some("Payments".into()),
            base_path: Some("/v1/payments".into()),
            ..Default::default()
        };
        let doc = generate(SchemaKind::Catalog, &req, BASE).unwrap();
        assert_eq!(doc["description"], "All errors in Payments API");

        let yaml = render(&doc, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("basePath: /v1/payments"));
        assert!(render(&doc, OutputFormat::Ts).is_err());
    }
}
