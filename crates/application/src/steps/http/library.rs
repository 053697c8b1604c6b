//! The HTTP steps, registered by name.
//!
//! Arguments arrive as JSON values. Required arguments that are missing or of
//! the wrong type are rejected with [`StepError::InvalidArgument`]; exclusion
//! lists are read leniently, so anything but an array means no exclusions.

use llstep_domain::{Credentials, ExcludedFields, RequestSpec};
use serde_json::Value;

use super::Http;
use crate::extension::{StepDefinition, StepLibrary, StepOutcome};
use crate::{StepError, StepResult};

/// Step library exposing every [`Http`] operation by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSteps;

impl StepLibrary<Http> for HttpSteps {
    fn name(&self) -> &'static str {
        "http"
    }

    fn definitions(&self) -> Vec<StepDefinition<Http>> {
        vec![
            StepDefinition::public("http_client", http_client),
            StepDefinition::public("with_defaults", with_defaults),
            StepDefinition::public("force_authenticate", force_authenticate),
            StepDefinition::public("force_login", force_login),
            StepDefinition::public("login", login),
            StepDefinition::public("get", get),
            StepDefinition::public("delete", delete),
            StepDefinition::public("post", post),
            StepDefinition::public("put", put),
            StepDefinition::public("request", request),
            StepDefinition::public("status_code_is", status_code_is),
            StepDefinition::public("content_type_is", content_type_is),
            StepDefinition::public("response_json_is", response_json_is),
            StepDefinition::public("response_data_is", response_data_is),
            StepDefinition::public("assert_data", assert_data),
            StepDefinition::public("response_data_list_is", response_data_list_is),
            StepDefinition::public("response_url_is", response_url_is),
            StepDefinition::public(
                "response_location_header_is",
                response_location_header_is,
            ),
        ]
    }
}

fn http_client(http: &mut Http, _: &[Value]) -> StepOutcome {
    http.http_client()?;
    Ok(Value::Null)
}

fn with_defaults(http: &mut Http, args: &[Value]) -> StepOutcome {
    let overrides = headers_arg("with_defaults", args, 0)?;
    http.with_defaults(overrides)?;
    Ok(Value::Null)
}

fn force_authenticate(http: &mut Http, args: &[Value]) -> StepOutcome {
    let credentials = match args.first() {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<Credentials>(value.clone())
                .map_err(|e| invalid("force_authenticate", e.to_string()))?,
        ),
    };
    http.force_authenticate(credentials)?;
    Ok(Value::Null)
}

fn force_login(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.force_login(str_arg("force_login", args, 0)?)?;
    Ok(Value::Null)
}

fn login(http: &mut Http, args: &[Value]) -> StepOutcome {
    let username = str_arg("login", args, 0)?;
    let password = str_arg("login", args, 1)?;
    Ok(Value::Bool(http.login(username, password)?))
}

fn get(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.get(str_arg("get", args, 0)?)?;
    Ok(Value::Null)
}

fn delete(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.delete(str_arg("delete", args, 0)?)?;
    Ok(Value::Null)
}

fn post(http: &mut Http, args: &[Value]) -> StepOutcome {
    let path = str_arg("post", args, 0)?;
    let data = args.get(1).cloned().unwrap_or(Value::Null);
    http.post(path, data)?;
    Ok(Value::Null)
}

fn put(http: &mut Http, args: &[Value]) -> StepOutcome {
    let path = str_arg("put", args, 0)?;
    let data = args.get(1).cloned().unwrap_or(Value::Null);
    http.put(path, data)?;
    Ok(Value::Null)
}

fn request(http: &mut Http, args: &[Value]) -> StepOutcome {
    let spec = serde_json::from_value::<RequestSpec>(arg("request", args, 0)?.clone())
        .map_err(|e| invalid("request", e.to_string()))?;
    http.request(&spec)?;
    Ok(Value::Null)
}

fn status_code_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    let expected = arg("status_code_is", args, 0)?
        .as_u64()
        .and_then(|code| u16::try_from(code).ok())
        .ok_or_else(|| invalid("status_code_is", "expected a status code"))?;
    http.status_code_is(expected)?;
    Ok(Value::Null)
}

fn content_type_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.content_type_is(str_arg("content_type_is", args, 0)?)?;
    Ok(Value::Null)
}

fn response_json_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.response_json_is(arg("response_json_is", args, 0)?)?;
    Ok(Value::Null)
}

fn response_data_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    let expected = arg("response_data_is", args, 0)?;
    http.response_data_is(expected, &ExcludedFields::from_value(args.get(1)))?;
    Ok(Value::Null)
}

fn assert_data(http: &mut Http, args: &[Value]) -> StepOutcome {
    let expected = arg("assert_data", args, 0)?;
    let observed = arg("assert_data", args, 1)?;
    http.assert_data(expected, observed, &ExcludedFields::from_value(args.get(2)))?;
    Ok(Value::Null)
}

fn response_data_list_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    let expected = arg("response_data_list_is", args, 0)?
        .as_array()
        .ok_or_else(|| invalid("response_data_list_is", "expected a list of items"))?;
    http.response_data_list_is(expected, &ExcludedFields::from_value(args.get(1)))?;
    Ok(Value::Null)
}

fn response_url_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.response_url_is(str_arg("response_url_is", args, 0)?)?;
    Ok(Value::Null)
}

fn response_location_header_is(http: &mut Http, args: &[Value]) -> StepOutcome {
    http.response_location_header_is(str_arg("response_location_header_is", args, 0)?)?;
    Ok(Value::Null)
}

fn invalid(step: &str, reason: impl Into<String>) -> StepError {
    StepError::InvalidArgument {
        step: step.to_string(),
        reason: reason.into(),
    }
}

fn arg<'a>(step: &str, args: &'a [Value], index: usize) -> StepResult<&'a Value> {
    args.get(index)
        .ok_or_else(|| invalid(step, format!("missing argument {index}")))
}

fn str_arg<'a>(step: &str, args: &'a [Value], index: usize) -> StepResult<&'a str> {
    arg(step, args, index)?
        .as_str()
        .ok_or_else(|| invalid(step, format!("argument {index} must be a string")))
}

fn headers_arg(step: &str, args: &[Value], index: usize) -> StepResult<Vec<(String, String)>> {
    let Value::Object(fields) = arg(step, args, index)? else {
        return Err(invalid(step, format!("argument {index} must be an object")));
    };
    Ok(fields
        .iter()
        .map(|(name, value)| match value {
            Value::String(value) => (name.clone(), value.clone()),
            other => (name.clone(), other.to_string()),
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionRegistry, Visibility};
    use crate::ports::ScriptedHttpClient;
    use llstep_domain::ResponseSpec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn setup() -> (ExtensionRegistry, Http, ScriptedHttpClient) {
        let mut registry = ExtensionRegistry::new();
        registry.register_all_from(&HttpSteps);
        let handle = ScriptedHttpClient::new().with_account("ada", "pw");
        (registry, Http::with_client(handle.clone()), handle)
    }

    #[test]
    fn every_definition_is_registered() {
        let defs = HttpSteps.definitions();
        assert!(defs.iter().all(|d| d.visibility() == Visibility::Public));

        let (registry, _, _) = setup();
        let table = registry.steps::<Http>().unwrap();
        assert_eq!(table.len(), defs.len());
        for def in &defs {
            assert!(table.contains(def.name()), "{} is not registered", def.name());
        }
    }

    #[test]
    fn request_then_assert_by_name() {
        let (registry, mut http, handle) = setup();
        handle.respond_with(ResponseSpec::json(200, &json!({"id": 1, "name": "x"})));

        registry.call(&mut http, "get", &[json!("/items/1/")]).unwrap();
        registry.call(&mut http, "status_code_is", &[json!(200)]).unwrap();
        registry
            .call(&mut http, "response_data_is", &[json!({"name": "x"}), json!(null)])
            .unwrap();
        registry
            .call(&mut http, "response_json_is", &[json!({"id": 1})])
            .unwrap();

        let err = registry.call(&mut http, "status_code_is", &[json!(500)]).unwrap_err();
        assert!(err.is_assertion());
    }

    #[test]
    fn login_yields_a_boolean() {
        let (registry, mut http, _) = setup();
        let ok = registry.call(&mut http, "login", &[json!("ada"), json!("pw")]).unwrap();
        let rejected = registry.call(&mut http, "login", &[json!("ada"), json!("no")]).unwrap();
        assert_eq!(ok, json!(true));
        assert_eq!(rejected, json!(false));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let (registry, mut http, _) = setup();

        let err = registry.call(&mut http, "get", &[]).unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument { ref step, .. } if step == "get"));

        let err = registry.call(&mut http, "status_code_is", &[json!("200")]).unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument { .. }));

        let err = registry
            .call(&mut http, "force_authenticate", &[json!({"type": "unknown"})])
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument { .. }));
    }

    #[test]
    fn malformed_exclusions_mean_none() {
        let (registry, mut http, _) = setup();
        registry
            .call(
                &mut http,
                "assert_data",
                &[json!({"a": 1, "b": 2}), json!({"a": 1, "b": 2}), json!("b")],
            )
            .unwrap();
        let err = registry
            .call(
                &mut http,
                "assert_data",
                &[json!({"a": 1, "b": 2}), json!({"a": 1, "b": 3}), json!({"b": true})],
            )
            .unwrap_err();
        assert!(err.is_assertion());
    }

    #[test]
    fn full_request_and_headers() {
        let (registry, mut http, handle) = setup();
        handle.respond_with(ResponseSpec::json(204, &json!(null)));

        registry
            .call(&mut http, "with_defaults", &[json!({"X-Tenant": "t1", "X-Retry": 2})])
            .unwrap();
        registry
            .call(
                &mut http,
                "request",
                &[json!({"method": "PATCH", "path": "/items/1/", "body": {"a": 1}})],
            )
            .unwrap();

        let recorded = handle.last_request().unwrap();
        assert_eq!(recorded.request.path, "/items/1/");
        assert_eq!(
            recorded.defaults,
            vec![
                ("X-Tenant".to_string(), "t1".to_string()),
                ("X-Retry".to_string(), "2".to_string()),
            ]
        );
        registry.call(&mut http, "status_code_is", &[json!(204)]).unwrap();
    }
}
