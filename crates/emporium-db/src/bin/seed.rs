//! # Seed Data Generator
//!
//! Populates a database with demo categories, products and customers for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/emporium.db
//! cargo run -p emporium-db --bin seed
//!
//! # Specify database path
//! cargo run -p emporium-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! Skips when the database already holds products.

use std::env;
use std::sync::Arc;
use emporium_core::{CategoryDraft, CustomerDraft, ProductDraft};
use emporium_db::{Database, DbConfig, EntityStore};

/// Categories with their color and products: (name, price in cents, stock).
const CATALOG: &[(&str, &str, &[(&str, i64, i64)])] = &[
    (
        "Bebidas",
        "#1E88E5",
        &[
            ("Água Mineral 500ml", 250, 120),
            ("Refrigerante Cola 2L", 999, 48),
            ("Suco de Laranja 1L", 849, 30),
            ("Café Torrado 500g", 1890, 25),
        ],
    ),
    (
        "Mercearia",
        "#43A047",
        &[
            ("Arroz Branco 5kg", 2790, 40),
            ("Feijão Carioca 1kg", 899, 60),
            ("Açúcar Refinado 1kg", 499, 55),
            ("Óleo de Soja 900ml", 789, 0),
        ],
    ),
    (
        "Limpeza",
        "#8E24AA",
        &[
            ("Detergente 500ml", 299, 80),
            ("Sabão em Pó 1kg", 1299, 15),
            ("Água Sanitária 2L", 649, 22),
        ],
    ),
];

/// (name, email, city)
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Maria Silva", "maria.silva@example.com", "São Paulo"),
    ("João Souza", "joao.souza@example.com", "Campinas"),
    ("Ana Oliveira", "ana.oliveira@example.com", "Santos"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/emporium.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/emporium.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Emporium Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let entities = EntityStore::new(Arc::new(db));

    let existing = entities.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut products = 0;

    for (category, color, items) in CATALOG {
        let category_id = entities
            .categories()
            .create(CategoryDraft {
                name: category.to_string(),
                color: Some(color.to_string()),
                ..Default::default()
            })
            .await?;

        for (name, price_cents, quantity) in items.iter() {
            let draft = ProductDraft {
                name: name.to_string(),
                price_cents: *price_cents,
                quantity: *quantity,
                category_id: Some(category_id.clone()),
                ..Default::default()
            };
            if let Err(e) = entities.products().create(draft).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            products += 1;
        }
        println!("  {}: {} products", category, items.len());
    }

    for (name, email, city) in CUSTOMERS {
        entities
            .customers()
            .create(CustomerDraft {
                name: name.to_string(),
                email: Some(email.to_string()),
                city: Some(city.to_string()),
                ..Default::default()
            })
            .await?;
    }

    println!();
    println!(
        "✓ Generated {} categories, {} products, {} customers in {:?}",
        CATALOG.len(),
        products,
        CUSTOMERS.len(),
        start.elapsed()
    );
    println!("✓ Seed complete!");

    Ok(())
}
