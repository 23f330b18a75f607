//! Strategies that turn raw payloads into response bodies.

use http::StatusCode;
use serde_json::{Map, Value};

use super::RawValue;

/// Everything a strategy may use besides the data itself.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'a> {
    /// Configured envelope key (`"detail"` by default)
    pub verb: &'a str,
    /// Status the new response will carry
    pub status: StatusCode,
    /// Extra values passed by the caller, such as `errors`
    pub extras: &'a Map<String, Value>,
}

/// Converts raw data into the body of a new response.
///
/// Any `Fn(RawValue, &ConversionContext) -> Value` closure is a strategy:
///
/// ```
/// use heaven::{ConversionContext, ConversionStrategy, RawValue};
/// use serde_json::{json, Map};
///
/// let envelope = |data: RawValue, ctx: &ConversionContext<'_>| {
///     json!({
///         "data": data.into_json(),
///         "status_code": ctx.status.as_u16(),
///         "errors": ctx.extras.get("errors").cloned(),
///     })
/// };
///
/// let extras = Map::new();
/// let ctx = ConversionContext {
///     verb: "detail",
///     status: http::StatusCode::OK,
///     extras: &extras,
/// };
/// let body = envelope.convert(RawValue::from("done"), &ctx);
/// assert_eq!(body, json!({"data": "done", "status_code": 200, "errors": null}));
/// ```
pub trait ConversionStrategy {
    /// Produces the body for `data`.
    fn convert(&self, data: RawValue, ctx: &ConversionContext<'_>) -> Value;
}

impl<F> ConversionStrategy for F
where
    F: Fn(RawValue, &ConversionContext<'_>) -> Value,
{
    fn convert(&self, data: RawValue, ctx: &ConversionContext<'_>) -> Value {
        self(data, ctx)
    }
}

/// Wraps data as `{verb: data}`. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbEnvelope;

impl ConversionStrategy for VerbEnvelope {
    fn convert(&self, data: RawValue, ctx: &ConversionContext<'_>) -> Value {
        let mut body = Map::with_capacity(1);
        body.insert(ctx.verb.to_string(), data.into_json());
        Value::Object(body)
    }
}

/// Uses the data itself as the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ConversionStrategy for Passthrough {
    fn convert(&self, data: RawValue, _ctx: &ConversionContext<'_>) -> Value {
        data.into_json()
    }
}
