//! Demo catalog seeding
//!
//! Fills an empty equipment table with a handful of listings so a fresh
//! deployment has something to browse.

use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use std::sync::Arc;

use crate::models::{Category, DutyType, Equipment};
use crate::repositories::{EquipmentRepository, NewEquipment};

fn demo_listing(
    name: &str,
    brand: Option<&str>,
    price: f64,
    rent: f64,
    category: Category,
    duty_type: DutyType,
    description: &str,
) -> NewEquipment {
    NewEquipment {
        name: name.to_string(),
        brand: brand.map(str::to_string),
        price,
        rent,
        category,
        duty_type,
        description: description.to_string(),
        image: None,
    }
}

fn demo_catalog() -> Vec<NewEquipment> {
    vec![
        demo_listing(
            "5075E Utility Tractor",
            Some("John Deere"),
            52000.0,
            180.0,
            Category::Tractors,
            DutyType::Medium,
            "75 hp utility tractor with front loader and 3-point hitch",
        ),
        demo_listing(
            "Lexion 8900 Combine",
            Some("Claas"),
            610000.0,
            1450.0,
            Category::Harvesters,
            DutyType::Heavy,
            "Class 9 combine harvester with 40 ft grain header",
        ),
        demo_listing(
            "Three-Disc Mounted Plow",
            None,
            3200.0,
            45.0,
            Category::Plows,
            DutyType::Light,
            "Category II mounted disc plow for primary tillage",
        ),
        demo_listing(
            "Trailed Boom Sprayer",
            Some("Amazone"),
            38000.0,
            220.0,
            Category::Sprayers,
            DutyType::Medium,
            "3000 litre trailed sprayer with 24 m boom",
        ),
        demo_listing(
            "Precision Planter 1775NT",
            Some("John Deere"),
            145000.0,
            560.0,
            Category::Seeders,
            DutyType::Premium,
            "16-row precision planter with vacuum metering",
        ),
        demo_listing(
            "Rotary Tiller 180",
            Some("Kubota"),
            4800.0,
            60.0,
            Category::Tillers,
            DutyType::Light,
            "1.8 m PTO-driven rotary tiller for seedbed preparation",
        ),
    ]
}

/// Inserts the demo catalog if the equipment table is empty.
///
/// Returns the number of listings created.
pub async fn seed_demo_catalog(db: &DatabaseConnection) -> Result<usize> {
    let existing = Equipment::find().count(db).await?;
    if existing > 0 {
        log::info!("Equipment table already has {} listings, skipping seed", existing);
        return Ok(0);
    }

    let repo = EquipmentRepository::new(Arc::new(db.clone()));
    let mut created = 0;
    for listing in demo_catalog() {
        let name = listing.name.clone();
        repo.add(listing).await?;
        log::info!("Seeded listing '{}'", name);
        created += 1;
    }

    log::info!("Demo catalog seeded with {} listings", created);
    Ok(created)
}
