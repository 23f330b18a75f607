//! Response formatter demonstration.
//!
//! This example shows what request handlers get back from each formatter:
//! 1. Plain data wrapped in the `{"detail": ...}` envelope
//! 2. Finished responses passed through after validation
//! 3. Validation failures, logged before they are returned
//! 4. A custom conversion with status code and extra errors
//!
//! Run with: `cargo run --example response_views`

use heaven::{
    ConversionContext, FinishedResponse, HttpFormatter, HttpResponse, JsonFormatter,
    JsonResponse, RawValue, ResponseOptions, RestFormatter, Settings,
};
use http::StatusCode;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== Response Views Example ===\n");
    let settings = Settings::from_env()?;

    // Scenario 1: Plain data
    println!("--- Scenario 1: Plain data is wrapped ---");
    let json = JsonFormatter::new(&settings.responses)?;
    let response = json.log_response_as_info("Success", "Returned success", StatusCode::OK)?;
    println!("✓ JsonResponse body: {}", response.json()?);

    let rest = RestFormatter::new(&settings.responses)?;
    let response = rest.log_response_as_error(
        vec![json!("title is required"), json!("body is too long")],
        "Article form rejected",
        StatusCode::BAD_REQUEST,
    )?;
    println!("✓ RestResponse {} data: {}", response.status(), response.data());

    // Scenario 2: Finished responses
    println!("\n--- Scenario 2: Finished responses pass through ---");
    let built = JsonResponse::new(&json!({"id": 1, "title": "Hello"}))?
        .with_status(StatusCode::CREATED);
    let response = json.log_response_as_info(built, "Article created", StatusCode::OK)?;
    println!("✓ Kept own status {}", response.status());

    let html = HttpFormatter::new(&settings.responses)?;
    let page = HttpResponse::new("<h1>Articles</h1>");
    let response = html.log_response_as_info(page, "Rendered article list", StatusCode::OK)?;
    println!("✓ HTML response, {} bytes", response.content().len());

    // Scenario 3: Validation failures
    println!("\n--- Scenario 3: Invalid finished responses ---");
    let listing = JsonResponse::new_unsafe(&json!(["a", "b"]));
    match json.log_response_as_info(listing, "Listing", StatusCode::OK) {
        Ok(_) => println!("✗ Unsafe response accepted"),
        Err(e) => println!("✓ Rejected: {e}"),
    }

    // Scenario 4: Custom conversion
    println!("\n--- Scenario 4: Custom conversion ---");
    let api = JsonFormatter::new(&settings.responses)?.with_conversion(
        |data: RawValue, ctx: &ConversionContext<'_>| {
            json!({
                "data": data.into_json(),
                "status_code": ctx.status.as_u16(),
                "errors": ctx.extras.get("errors").cloned(),
            })
        },
    );
    let options = ResponseOptions::new(StatusCode::UNPROCESSABLE_ENTITY)
        .extra("errors", json!({"title": ["This field is required."]}));
    let response = api.log_response_as_error("Article rejected", "Invalid article", options)?;
    println!("✓ Envelope: {}", response.json()?);

    println!("\n=== Example Complete ===");
    Ok(())
}
