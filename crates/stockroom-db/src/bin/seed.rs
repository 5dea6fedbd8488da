//! # Seed Data Generator
//!
//! Populates a development database with a small, realistic stockroom.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom_dev.db (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//!
//! # More logging
//! RUST_LOG=debug cargo run -p stockroom-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Units of measurement (piece, box, kg, litre, metre)
//! - Categories, each with a handful of products
//! - One inventory row per product
//! - A staff user (`storekeeper` / `storekeeper`) linked to its staff record
//! - A receipt, an issue and an adjustment per product

use chrono::{Duration, Utc};
use std::env;
use stockroom_core::{
    Decimal, NewProduct, NewStockAdjustment, NewStockIssue, NewStockReceipt, NewUser, RoleRef,
};
use stockroom_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_PATH: &str = "./stockroom_dev.db";

/// (name, abbreviation)
const UNITS: &[(&str, &str)] = &[
    ("Piece", "pc"),
    ("Box", "box"),
    ("Kilogram", "kg"),
    ("Litre", "l"),
    ("Metre", "m"),
];

/// (category, description, [(product, unit abbreviation, unit price)])
const CATALOG: &[(&str, &str, &[(&str, &str, &str)])] = &[
    (
        "Fasteners",
        "Screws, bolts, nails and anchors",
        &[
            ("Wood Screw 4x40", "box", "6.49"),
            ("Hex Bolt M8x50", "box", "12.90"),
            ("Wall Plug 6mm", "box", "3.25"),
            ("Framing Nail 90mm", "kg", "4.80"),
        ],
    ),
    (
        "Electrical",
        "Cable, switches and fittings",
        &[
            ("Twin & Earth 2.5mm", "m", "1.15"),
            ("Single Switch", "pc", "2.99"),
            ("Junction Box", "pc", "4.50"),
        ],
    ),
    (
        "Paint",
        "Interior and exterior coatings",
        &[
            ("White Emulsion", "l", "5.75"),
            ("Gloss Black", "l", "8.20"),
            ("Primer Undercoat", "l", "6.10"),
        ],
    ),
    (
        "Timber",
        "Sawn and planed timber",
        &[
            ("Pine 2x4", "m", "2.60"),
            ("Oak Board 20mm", "m", "14.00"),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from(DEFAULT_DB_PATH);

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
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_DB_PATH})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    db.verify_schema().await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(
            products = existing,
            "Database already has products; skipping seed. Delete the file to regenerate."
        );
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Staff user
    let storekeeper = db
        .users()
        .create(&NewUser {
            username: "storekeeper".to_string(),
            email: "storekeeper@example.com".to_string(),
            password: "storekeeper".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Keeper".to_string(),
            is_staff: true,
            is_superuser: false,
        })
        .await?;
    let staff = db.roles().add_staff(&storekeeper.id, "Stores").await?;
    db.roles()
        .link(&storekeeper.id, &RoleRef::from(&staff))
        .await?;
    info!(username = %storekeeper.username, "Created staff user");

    let mut units = Vec::with_capacity(UNITS.len());
    for (name, abbreviation) in UNITS {
        units.push(db.units().create(name, abbreviation).await?);
    }
    info!(count = units.len(), "Created units of measurement");

    let today = Utc::now().date_naive();
    let mut products = 0;

    for (category_name, description, items) in CATALOG {
        let category = db.categories().create(category_name, description).await?;

        for (index, (name, abbreviation, price)) in items.iter().enumerate() {
            let Some(unit) = units.iter().find(|u| u.abbreviation == *abbreviation) else {
                warn!(product = %name, unit = %abbreviation, "Unknown unit, skipping product");
                continue;
            };

            let product = db
                .products()
                .create(&NewProduct {
                    name: name.to_string(),
                    description: format!("{category_name}: {name}"),
                    category_id: Some(category.id.clone()),
                    unit_of_measurement_id: Some(unit.id.clone()),
                    unit_price: price.parse()?,
                    reorder_level: Decimal::from_whole(10),
                    reorder_quantity: Decimal::from_whole(50),
                })
                .await?;

            let received = Decimal::from_whole(40 + 10 * index as i64);
            let issued = Decimal::from_whole(5 + index as i64);
            let damaged = Decimal::from_whole(-1);

            db.receipts()
                .create(&NewStockReceipt {
                    product_id: product.id.clone(),
                    quantity_received: received,
                    date_received: today - Duration::days(14),
                    received_by: Some(storekeeper.id.clone()),
                    remarks: Some("Opening stock".to_string()),
                })
                .await?;

            db.issues()
                .create(&NewStockIssue {
                    product_id: product.id.clone(),
                    quantity_issued: issued,
                    date_issued: today - Duration::days(7),
                    issued_by: Some(storekeeper.id.clone()),
                    issued_to: "Site team".to_string(),
                    remarks: None,
                })
                .await?;

            db.adjustments()
                .create(&NewStockAdjustment {
                    product_id: product.id.clone(),
                    quantity_adjusted: damaged,
                    adjustment_reason: "Damaged in storage".to_string(),
                    date_adjusted: today - Duration::days(1),
                    adjusted_by: Some(storekeeper.id.clone()),
                    remarks: None,
                })
                .await?;

            // Movements are logs only; the stock row is written to match them.
            let row = db
                .inventory()
                .create(&product.id, received - issued + damaged)
                .await?;
            let label = db.inventory().label(&row.id).await?;
            info!(label = %label, "Stocked");

            products += 1;
        }
    }

    info!(
        products,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    let widgets = db.products().search("screw", 10).await?;
    info!(results = widgets.len(), "Search 'screw'");

    db.close().await;
    Ok(())
}
