//! # Seed Data Generator
//!
//! Populates the database with a realistic working ledger for development:
//! representatives, pharmacy clients, a product catalog, and a few months
//! of sales and collections in every lifecycle state.
//!
//! ## Usage
//! ```bash
//! # Generate 200 sales (default)
//! cargo run -p cartera-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p cartera-db --bin seed -- --sales 500
//!
//! # Specify database path
//! cargo run -p cartera-db --bin seed -- --db ./data/cartera.db
//! ```
//!
//! ## Generated Ledger
//! Sales are issued across the last ~110 days so confirmed collections
//! land in every aging bucket (A through D). Roughly:
//! - 70% of sales get a collection (some partial, some split cash/check)
//! - most collections are confirmed, some stay pending
//! - a few are voided before confirmation or reversed after it
//! - 10% of sales are voided outright
//!
//! Everything is derived arithmetically from the sale index, so two runs
//! against fresh databases produce the same ledger.

use std::env;

use chrono::{Datelike, Duration, Utc};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cartera_core::aging::RateSchedule;
use cartera_core::{Client, Money, Product, Representative};
use cartera_db::{CheckDetails, Database, DbConfig, SaleLine};

/// Field representatives with their assigned zones
const REPRESENTATIVES: &[(&str, &str)] = &[
    ("Elena Vargas", "Norte"),
    ("Marco Díaz", "Sur"),
    ("Lucía Fernández", "Centro"),
    ("Javier Morales", "Oriente"),
    ("Carmen Ruiz", "Poniente"),
    ("Andrés Castillo", "Litoral"),
];

/// Pharmacy clients with street addresses
const CLIENTS: &[(&str, &str)] = &[
    ("Farmacia San Rafael", "Av. Central 123"),
    ("Farmacia La Salud", "Calle 5 #44"),
    ("Botica del Centro", "Plaza Mayor 8"),
    ("Farmacia Santa Cruz", "Av. Libertad 210"),
    ("Droguería El Águila", "Carrera 12 #30"),
    ("Farmacia Moderna", "Blvd. Las Flores 55"),
    ("Farmacia del Valle", "Calle Real 77"),
    ("Botica San Martín", "Av. Juárez 340"),
    ("Farmacia La Esperanza", "Calle 18 #102"),
    ("Droguería Central", "Av. Bolívar 15"),
    ("Farmacia El Carmen", "Plaza Norte 3"),
    ("Farmacia Buen Precio", "Calle Comercio 91"),
    ("Botica La Merced", "Av. Las Palmas 402"),
    ("Farmacia San José", "Calle 9 #27"),
    ("Droguería La Paz", "Av. del Sol 188"),
    ("Farmacia Universal", "Carrera 4 #66"),
    ("Farmacia Los Andes", "Blvd. Mirador 29"),
    ("Botica Esmeralda", "Av. Colón 510"),
];

/// Product catalog: name and list price in cents
const PRODUCTS: &[(&str, i64)] = &[
    ("Amoxicillin 500mg x100", 18_500),
    ("Ibuprofen 400mg x50", 6_200),
    ("Paracetamol 500mg x100", 4_800),
    ("Omeprazole 20mg x30", 9_900),
    ("Loratadine 10mg x30", 5_400),
    ("Metformin 850mg x60", 11_200),
    ("Losartan 50mg x30", 8_700),
    ("Atorvastatin 20mg x30", 14_300),
    ("Azithromycin 500mg x6", 12_800),
    ("Cephalexin 500mg x20", 10_900),
    ("Diclofenac Gel 50g", 7_600),
    ("Salbutamol Inhaler", 15_800),
    ("Insulin NPH 10ml", 32_500),
    ("Enalapril 10mg x30", 6_900),
    ("Ranitidine 150mg x40", 7_200),
    ("Aspirin 100mg x90", 3_900),
    ("Vitamin C 1g x20", 4_500),
    ("Complejo B x30", 5_800),
    ("Suero Oral 500ml", 2_800),
    ("Alcohol Gel 1L", 6_500),
    ("Gasas Estériles x10", 3_200),
    ("Jeringas 5ml x100", 8_900),
    ("Guantes Látex x100", 12_500),
    ("Termómetro Digital", 9_800),
    ("Tensiómetro Aneroide", 28_900),
    ("Mascarillas x50", 7_500),
    ("Dexametasona 4mg x10", 8_100),
    ("Ketorolaco 10mg x20", 9_400),
    ("Clotrimazol Crema 20g", 5_600),
    ("Prednisona 5mg x30", 6_700),
];

/// Banks drawn on for check tenders
const BANKS: &[&str] = &[
    "Banco Nacional",
    "Banco del Pacífico",
    "Banco Industrial",
    "Banco de Occidente",
    "Banco Continental",
    "Banco Mercantil",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut sales_count: usize = 200;
    let mut db_path = String::from("./cartera_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-n" => {
                if i + 1 < args.len() {
                    sales_count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cartera Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --sales <N>    Number of sales to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./cartera_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cartera Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Sales: {}", sales_count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.registry().count_representatives().await?;
    if existing > 0 {
        println!("⚠ Database already has {} representatives", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let today = now.date_naive();

    // Registry: representatives, clients, products
    println!();
    println!("Seeding registry...");

    let mut rep_ids = Vec::with_capacity(REPRESENTATIVES.len());
    for (idx, (name, zone)) in REPRESENTATIVES.iter().enumerate() {
        let rep = Representative {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: Some(format!("555-{:04}", 40 + idx)),
            zone: Some(zone.to_string()),
            created_at: now,
        };
        db.registry().insert_representative(&rep).await?;
        rep_ids.push(rep.id);
    }

    let mut client_ids = Vec::with_capacity(CLIENTS.len());
    for (idx, (name, address)) in CLIENTS.iter().enumerate() {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            address: Some(address.to_string()),
            phone: Some(format!("555-{:04}", 100 + idx * 3)),
            pending_balance_cents: 0,
            created_at: now,
            updated_at: now,
        };
        db.registry().insert_client(&client).await?;
        client_ids.push(client.id);
    }

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, price_cents) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents: *price_cents,
            stock: 50_000,
            created_at: now,
            updated_at: now,
        };
        db.registry().insert_product(&product).await?;
        product_ids.push(product.id);
    }

    println!(
        "✓ Seeded {} representatives, {} clients, {} products",
        rep_ids.len(),
        client_ids.len(),
        product_ids.len()
    );

    // Ledger: sales and their collections
    println!();
    println!("Generating ledger...");

    let schedule = RateSchedule::default();
    let start = std::time::Instant::now();

    let mut sales_created = 0usize;
    let mut sales_shipped = 0usize;
    let mut sales_voided = 0usize;
    let mut collections_created = 0usize;
    let mut confirmed = 0usize;
    let mut voided = 0usize;
    let mut reversed = 0usize;

    for seed in 0..sales_count {
        let rep_id = &rep_ids[seed % rep_ids.len()];
        let client_id = &client_ids[(seed * 7) % client_ids.len()];

        // 1-3 distinct products per sale
        let line_count = 1 + seed % 3;
        let mut lines = Vec::with_capacity(line_count);
        for line in 0..line_count {
            let product_idx = (seed * 11 + line * 7) % product_ids.len();
            let quantity = (5 + (seed * 13 + line * 3) % 56) as i64;
            // Occasional negotiated discount off list price
            let unit_price_cents = if seed % 9 == 0 {
                Some(PRODUCTS[product_idx].1 * 9 / 10)
            } else {
                None
            };
            lines.push(SaleLine {
                product_id: product_ids[product_idx].clone(),
                quantity,
                unit_price_cents,
            });
        }

        // Issue dates spread over ~110 days so every aging bucket shows up
        let age_days = (seed * 23) % 110;
        let issued_on = today - Duration::days(age_days as i64);

        let sale = db
            .sales()
            .create(client_id, rep_id, issued_on, &lines, None)
            .await?;
        sales_created += 1;

        if seed % 3 == 0 {
            db.sales()
                .update_tracking(&sale.id, &format!("GU-{:06}", 4_200 + seed * 3))
                .await?;
            sales_shipped += 1;
        }

        match seed % 10 {
            // 10% voided outright, before any money moves
            8 => {
                db.sales().void(&sale.id).await?;
                sales_voided += 1;
            }
            // 70% get a collection
            0..=6 => {
                // Most pay in full, every 5th pays 60%
                let amount = if seed % 5 == 0 {
                    sale.total_cents * 3 / 5
                } else {
                    sale.total_cents
                };

                // Collections land somewhere between the sale date and today
                let collected_on =
                    issued_on + Duration::days(((seed * 19) % (age_days + 1)) as i64);

                // Every 4th tender splits half into a check, dated the day
                // it was tendered
                let (cash_cents, check_cents, check) = if seed % 4 == 0 {
                    let check_cents = amount / 2;
                    let details = CheckDetails {
                        bank: BANKS[(seed / 4) % BANKS.len()].to_string(),
                        number: format!("{:06}", 100_000 + seed * 37),
                        issued_on: Some(collected_on),
                    };
                    (amount - check_cents, check_cents, Some(details))
                } else {
                    (amount, 0, None)
                };

                let collection = db
                    .collections()
                    .create(
                        &sale.id, client_id, rep_id, collected_on, cash_cents, check_cents,
                        check, None,
                    )
                    .await?;
                collections_created += 1;

                match seed % 10 {
                    0..=4 => {
                        db.collections().confirm(&collection.id, &schedule).await?;
                        confirmed += 1;

                        // A few confirmed checks bounce later
                        if seed % 25 == 0 {
                            db.collections().reverse(&collection.id).await?;
                            reversed += 1;
                        }
                    }
                    6 => {
                        db.collections().void(&collection.id).await?;
                        voided += 1;
                    }
                    // 5: stays pending awaiting confirmation
                    _ => {}
                }
            }
            // 7, 9: sale stays open with no collection yet
            _ => {}
        }

        if sales_created % 50 == 0 {
            println!("  Generated {} sales...", sales_created);
        }
    }

    let elapsed = start.elapsed();
    let pending = collections_created - confirmed - voided;

    println!();
    println!("✓ Created {} sales in {:?}", sales_created, elapsed);
    println!("  {} shipped, {} voided", sales_shipped, sales_voided);
    println!(
        "✓ Registered {} collections: {} confirmed ({} later reversed), {} pending, {} voided",
        collections_created, confirmed, reversed, pending, voided
    );

    // Verify settlement aggregates
    println!();
    println!("Verifying settlement aggregates...");

    let weeks = db.settlement().weekly_aggregate(&rep_ids[0], None).await?;
    let earned: i64 = weeks.iter().map(|w| w.commission_cents).sum();
    println!(
        "  {}: {} settlement weeks, {} earned",
        REPRESENTATIVES[0].0,
        weeks.len(),
        Money::from_cents(earned)
    );

    let statement = db
        .settlement()
        .monthly_statement(&rep_ids[0], today.year(), today.month())
        .await?;
    println!(
        "  Statement {}-{:02}: {} rows, cash {}, checks {}, commission {}",
        statement.year,
        statement.month,
        statement.rows.len(),
        Money::from_cents(statement.totals.cash_cents),
        Money::from_cents(statement.totals.check_cents),
        Money::from_cents(statement.totals.commission_cents)
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes tracing for the seed run.
///
/// Defaults to warnings only so the progress output stays readable;
/// `RUST_LOG` overrides as usual.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
