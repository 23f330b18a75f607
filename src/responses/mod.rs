//! Response formatting.
//!
//! A [`ResponseFormatter`] logs one message per response and returns a
//! finished response of a fixed kind. Plain data ([`Payload::Raw`]) is
//! converted into a body and built into a new response; a response built
//! elsewhere ([`Payload::Finished`]) is validated and returned as is.
//!
//! | Kind                      | Body                   | Pass-through check              |
//! |---------------------------|------------------------|---------------------------------|
//! | [`JsonResponse`]          | serialized JSON        | safe, decodes to an object      |
//! | [`RestResponse`]          | structured data        | data is an object               |
//! | [`HttpResponse`]          | opaque content         | JSON content decodes to object  |
//! | [`StreamingHttpResponse`] | chunks                 | status only                     |
//! | [`RedirectResponse`]      | `Location` header      | target present, 3xx status      |

mod artifact;
mod conversion;
mod formatter;
mod http;
mod json;
mod payload;
mod redirect;
mod rest;

pub use artifact::{BuildResponse, FinishedResponse, ResponseOptions};
pub use conversion::{ConversionContext, ConversionStrategy, Passthrough, VerbEnvelope};
pub use formatter::{RedirectTarget, ResponseFormatter};
pub use self::http::{HttpResponse, StreamingHttpResponse};
pub use json::JsonResponse;
pub use payload::{Payload, RawKind, RawTypes, RawValue};
pub use redirect::RedirectResponse;
pub use rest::RestResponse;

/// Formatter producing [`JsonResponse`]s.
pub type JsonFormatter<C = VerbEnvelope> = ResponseFormatter<JsonResponse, C>;
/// Formatter producing [`RestResponse`]s.
pub type RestFormatter<C = VerbEnvelope> = ResponseFormatter<RestResponse, C>;
/// Formatter producing [`HttpResponse`]s.
pub type HttpFormatter<C = VerbEnvelope> = ResponseFormatter<HttpResponse, C>;
/// Formatter producing [`StreamingHttpResponse`]s.
pub type StreamingFormatter<C = VerbEnvelope> = ResponseFormatter<StreamingHttpResponse, C>;
/// Formatter producing [`RedirectResponse`]s.
pub type RedirectFormatter = ResponseFormatter<RedirectResponse>;
