//! Redirect formatter demonstration.
//!
//! Run with: `cargo run --example redirect_views`

use heaven::{FinishedResponse, RedirectFormatter, RedirectResponse, Settings};
use http::StatusCode;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== Redirect Views Example ===\n");
    let settings = Settings::from_env()?;
    let redirects = RedirectFormatter::new(&settings.responses)?;

    println!("--- Locator ---");
    let response = redirects.log_redirect_as_info("/articles/7/", "Article saved", StatusCode::FOUND)?;
    let http = response.into_http();
    println!(
        "✓ {} -> {:?}",
        http.status(),
        http.headers().get(http::header::LOCATION)
    );

    println!("\n--- Finished redirect ---");
    let moved = RedirectResponse::permanent("https://example.com/blog/");
    let response = redirects.log_redirect_as_info(moved, "Blog moved", StatusCode::FOUND)?;
    println!("✓ Kept own status {}", response.status());

    println!("\n--- Rejected targets ---");
    for target in ["", "javascript:alert(1)"] {
        match redirects.log_redirect_as_error(target, "Bad redirect", StatusCode::FOUND) {
            Ok(_) => println!("✗ {target:?} accepted"),
            Err(e) => println!("✓ {target:?}: {e}"),
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
