//! The built-in user service.
//!
//! Run with: `cargo run --example user_service`

use std::sync::Arc;

use heaven::services::users::check_password;
use heaven::services::{user_service, Fields, InMemoryStore, LogMessages, Lookup, User};
use heaven::Settings;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== User Service Example ===\n");
    let mut settings = Settings::from_env()?;
    settings.services.always_include_exception = true;

    let store = Arc::new(InMemoryStore::<User>::new().unique(&["username"]));
    let users = user_service(store, &settings)?;

    println!("--- Accounts ---");
    let messages = |info: &str| LogMessages::new().info(info).error("User service call failed");

    users.create(
        Fields::new()
            .set("username", "ada")
            .set("email", "ada@example.com")
            .set("password", "analytical-engine"),
        messages("Registered $objects$"),
    )?;
    users.create_superuser(
        Fields::new().set("username", "root").set("password", "toor"),
        messages("Registered superuser $objects$"),
    )?;

    if let Some(ada) = users.get(Lookup::new().exact("username", "ada"), messages("Loaded $objects$"))? {
        let user = ada.objects().instance();
        println!(
            "✓ Password check: {}",
            user.is_some_and(|u| check_password(u, "analytical-engine"))
        );

        if let Some(changed) = ada.set_password(None, "difference-engine", messages("Password changed"))? {
            let user = changed.objects().instance();
            println!(
                "✓ Old password rejected: {}",
                user.is_some_and(|u| !check_password(u, "analytical-engine"))
            );
        }
    }

    println!("\n--- Duplicate username ---");
    match users.create(Fields::new().set("username", "ada"), messages("Registered")) {
        Ok(_) => println!("✗ Duplicate accepted"),
        Err(e) => println!("✓ Raised after logging: {e}"),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
