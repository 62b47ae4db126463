#![deny(missing_docs)]

//! # Inspect Command
//!
//! Prints the contract fragments an exchange on `METHOD URI` would be checked
//! against.

use crate::error::CliResult;
use contract_assert_core::{
    AssertError, AssertResult, Contract, ContractExtractor, RequestTarget, Specification,
};
use serde_json::{json, Value};

/// Arguments for the inspect command.
#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// Swagger 2.0 document (JSON or YAML): a local path, `file://` or `http(s)://` URI.
    #[clap(long, env = "CONTRACT_ASSERT_SPEC")]
    pub spec: String,

    /// Request target, e.g. `/api/pets/1`.
    #[clap(long)]
    pub uri: String,

    /// HTTP method.
    #[clap(long, default_value = "GET")]
    pub method: String,

    /// Also resolve the response for this status code.
    #[clap(long)]
    pub status: Option<u16>,
}

/// Executes the inspection, printing pretty JSON to stdout.
pub fn execute(args: &InspectArgs) -> CliResult<()> {
    let spec = Specification::from_uri(&args.spec)?;
    let extractor = ContractExtractor::new(spec);
    let report = inspect(&extractor, &args.uri, &args.method, args.status)?;
    let output = serde_json::to_string_pretty(&report)
        .map_err(|e| crate::error::CliError::General(format!("JSON serialization failed: {}", e)))?;
    println!("{}", output);
    Ok(())
}

/// Builds the report for one operation.
pub fn inspect(
    extractor: &ContractExtractor,
    uri: &str,
    method: &str,
    status: Option<u16>,
) -> AssertResult<Value> {
    let target = RequestTarget::parse(uri)?;
    let path = target.path.as_str();
    let found = extractor.find_path(path)?;

    let request_body = optional_body(extractor.request_body(path, method))?;
    let mut report = json!({
        "template": found.template,
        "params": found.params,
        "request": {
            "mediaTypes": extractor.request_media_types(path, method)?,
            "headers": extractor.request_headers(path, method)?,
            "query": extractor.request_query(path, method)?,
            "body": request_body,
        },
    });

    if let Some(status) = status {
        let resolved = extractor.response_for(path, method, status)?;
        report["response"] = json!({
            "status": resolved.status_key,
            "mediaTypes": extractor.response_media_types(path, method)?,
            "headers": extractor.response_headers(path, method, status)?,
            "body": optional_body(extractor.response_body(path, method, status))?,
        });
    }

    Ok(report)
}

fn optional_body<T: serde::Serialize>(result: AssertResult<T>) -> AssertResult<Value> {
    match result {
        Ok(body) => Ok(json!(body)),
        Err(AssertError::BodyNotFound { .. }) => Ok(Value::Null),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> ContractExtractor {
        let spec = Specification::from_yaml_str(
            r#"
swagger: "2.0"
basePath: /api
produces: [application/json]
paths:
  /pets/{id}:
    get:
      parameters:
        - { name: id, in: path, required: true, type: integer }
        - { name: X-Trace, in: header, required: true, type: string }
      responses:
        default:
          description: error
          headers:
            X-Request-Id: { type: string }
"#,
        )
        .unwrap();
        ContractExtractor::new(spec)
    }

    #[test]
    fn test_inspect_request_and_default_response() {
        let report = inspect(&extractor(), "/api/pets/9", "get", Some(404)).unwrap();
        assert_eq!(report["template"], "/pets/{id}");
        assert_eq!(report["params"], json!({ "id": "9" }));
        assert_eq!(report["request"]["mediaTypes"], json!([]));
        assert_eq!(report["request"]["headers"]["required"], json!(["x-trace"]));
        assert_eq!(report["request"]["body"], Value::Null);
        assert_eq!(report["response"]["status"], "default");
        assert_eq!(report["response"]["mediaTypes"], json!(["application/json"]));
        assert_eq!(
            report["response"]["headers"]["required"],
            json!(["x-request-id"])
        );
    }

    #[test]
    fn test_inspect_unknown_path() {
        let err = inspect(&extractor(), "/elsewhere", "get", None).unwrap_err();
        assert!(matches!(err, AssertError::NoMatch { .. }));
    }
}
