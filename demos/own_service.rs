//! Defining a service for your own model.
//!
//! This example shows:
//! 1. A model and the in-memory store behind it
//! 2. Chained reads, each returning a new service handle
//! 3. Writes, and a read-only service refusing them
//! 4. Runtime failures being raised or suppressed
//!
//! Run with: `cargo run --example own_service`

use std::sync::Arc;

use heaven::services::{
    ErrorPolicy, Fields, InMemoryStore, LogMessages, Lookup, Model, Objects, Service, StoreError,
};
use heaven::Settings;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Article {
    id: Option<i64>,
    title: String,
    views: i64,
    published: bool,
}

impl Model for Article {
    const NAME: &'static str = "Article";
    const FIELDS: &'static [&'static str] = &["id", "title", "views", "published"];

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = Some(pk);
    }
}

fn messages(info: &str) -> LogMessages {
    LogMessages::new()
        .info(info)
        .error("Article service call failed")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== Own Service Example ===\n");
    let settings = Settings::from_env()?;
    let store = Arc::new(InMemoryStore::<Article>::new());
    let articles = Service::<Article>::new("ArticleService", store.clone(), &settings)?;

    // Scenario 1: Writes
    println!("--- Scenario 1: Creating rows ---");
    let created = articles.bulk_create(
        vec![
            Fields::new().set("title", "Ownership").set("views", 40),
            Fields::new().set("title", "Borrowing").set("views", 25),
            Fields::new().set("title", "Lifetimes").set("views", 60),
        ],
        messages("Created $objects$"),
    )?;
    if let Some(created) = created {
        println!("✓ {created}");
    }

    // Scenario 2: Chained reads
    println!("\n--- Scenario 2: Chained reads ---");
    if let Some(top) = articles.order_by(&["-views"], messages("Sorted articles"))? {
        if let Some(first) = top.first(messages("Most read: $objects$"))? {
            println!("✓ Most read handle: {first}");
            if let Some(published) =
                first.update(None, Fields::new().set("published", true), messages("Published $objects$"))?
            {
                println!("✓ Published: {:?}", published.objects().instance());
            }
        }
    }
    let count = articles
        .filter(Lookup::new().exact("published", false), messages("Drafts"))?
        .map(|drafts| drafts.count(messages("$objects$ drafts left")))
        .transpose()?
        .flatten();
    if let Some(Objects::Count(n)) = count.map(Service::into_objects) {
        println!("✓ {n} drafts");
    }
    println!("✓ Original handle untouched: {articles}");

    // Scenario 3: Read-only
    println!("\n--- Scenario 3: Read-only service ---");
    let reader = Service::<Article>::builder("ArticleReader", store.clone())
        .read_only(true)
        .build(&settings)?;
    match reader.delete(None, messages("Deleted")) {
        Ok(_) => println!("✗ Delete went through"),
        Err(e) => println!("✓ Refused: {e}"),
    }

    // Scenario 4: Runtime failures
    println!("\n--- Scenario 4: Runtime failures ---");
    match articles.get(Lookup::pk::<Article>(99), messages("Found $objects$")) {
        Ok(_) => println!("✗ Found a row that does not exist"),
        Err(e) => println!("✓ Raised after logging: {e}"),
    }

    let lenient = Service::<Article>::builder("ArticleService", store.clone())
        .error_policy(ErrorPolicy::Suppress)
        .build(&settings)?;
    store.fail_next(StoreError::Unavailable("connection reset".to_string()));
    match lenient.all(messages("Listed")) {
        Ok(None) => println!("✓ Suppressed after logging"),
        Ok(Some(_)) => println!("✗ Unexpected success"),
        Err(e) => println!("✗ Unexpected error: {e}"),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
