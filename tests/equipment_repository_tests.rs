//! Integration tests for the equipment record store.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::time::Duration;

use rentals::error::RepositoryError;
use rentals::models::{Category, DutyType};
use rentals::repositories::{EquipmentFilter, EquipmentPatch, EquipmentRepository};
use test_utils::{sample_listing, setup_test_db_arc};
use uuid::Uuid;

async fn repository() -> EquipmentRepository {
    EquipmentRepository::new(setup_test_db_arc().await.unwrap())
}

#[tokio::test]
async fn add_assigns_id_and_timestamps() {
    let repo = repository().await;

    let created = repo
        .add(sample_listing("5075E Tractor", Category::Tractors, 150.0))
        .await
        .unwrap();

    assert_eq!(created.name, "5075E Tractor");
    assert_eq!(created.created_at, created.updated_at);
    assert!(created.is_complete());

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_all_returns_newest_first() {
    let repo = repository().await;

    let older = repo
        .add(sample_listing("Disc Plow", Category::Plows, 40.0))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let newer = repo
        .add(sample_listing("Combine", Category::Harvesters, 900.0))
        .await
        .unwrap();

    let all = repo.get_all().await.unwrap();
    let ids: Vec<Uuid> = all.iter().map(|listing| listing.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn get_by_id_reports_not_found() {
    let repo = repository().await;

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_merges_supplied_fields_only() {
    let repo = repository().await;
    let created = repo
        .add(sample_listing("5075E Tractor", Category::Tractors, 150.0))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let updated = repo
        .update(
            created.id,
            EquipmentPatch {
                rent: Some(50.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.rent, 50.0);
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.brand, created.brand);
    assert_eq!(updated.price, created.price);
    assert_eq!(updated.category, created.category);
    assert_eq!(updated.duty_type, created.duty_type);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.image, created.image);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn update_can_clear_optional_fields() {
    let repo = repository().await;
    let created = repo
        .add(sample_listing("5075E Tractor", Category::Tractors, 150.0))
        .await
        .unwrap();

    let updated = repo
        .update(
            created.id,
            EquipmentPatch {
                image: Some(None),
                duty_type: Some(DutyType::Heavy),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.image, None);
    assert!(!updated.is_complete());
    assert_eq!(updated.duty_type, DutyType::Heavy);
    assert_eq!(updated.brand, created.brand);
}

#[tokio::test]
async fn update_of_missing_listing_is_not_found() {
    let repo = repository().await;

    let err = repo
        .update(
            Uuid::new_v4(),
            EquipmentPatch {
                rent: Some(50.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn delete_returns_snapshot_and_second_delete_is_not_found() {
    let repo = repository().await;
    let created = repo
        .add(sample_listing("Disc Plow", Category::Plows, 40.0))
        .await
        .unwrap();

    let deleted = repo.delete(created.id).await.unwrap();
    assert_eq!(deleted, created);

    assert!(repo.get_by_id(created.id).await.unwrap_err().is_not_found());
    assert!(repo.delete(created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn filter_by_category_duty_and_rent() {
    let repo = repository().await;
    repo.add(sample_listing("Big Tractor", Category::Tractors, 300.0))
        .await
        .unwrap();
    let small = repo
        .add(sample_listing("Small Tractor", Category::Tractors, 80.0))
        .await
        .unwrap();
    repo.add(sample_listing("Sprayer", Category::Sprayers, 60.0))
        .await
        .unwrap();

    let tractors = repo
        .get_by_filter(EquipmentFilter {
            category: Some(Category::Tractors),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tractors.len(), 2);

    let cheap_tractors = repo
        .get_by_filter(EquipmentFilter {
            category: Some(Category::Tractors),
            max_rent: Some(100.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cheap_tractors, vec![small]);

    let premium = repo
        .get_by_filter(EquipmentFilter {
            duty_type: Some(DutyType::Premium),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(premium.is_empty());
}

#[tokio::test]
async fn filter_by_listing_email_is_always_empty() {
    let repo = repository().await;
    repo.add(sample_listing("Big Tractor", Category::Tractors, 300.0))
        .await
        .unwrap();

    let listings = repo
        .get_by_filter(EquipmentFilter::by_listing_email("owner@example.com"))
        .await
        .unwrap();
    assert!(listings.is_empty());
}

#[tokio::test]
async fn add_get_update_delete_scenario() {
    let repo = repository().await;

    let created = repo
        .add(sample_listing("5075E Tractor", Category::Tractors, 150.0))
        .await
        .unwrap();
    let all = repo.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, created.id);

    repo.update(
        created.id,
        EquipmentPatch {
            name: Some("5075E Utility Tractor".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.name, "5075E Utility Tractor");
    assert_eq!(fetched.rent, 150.0);

    repo.delete(created.id).await.unwrap();
    assert!(repo.get_all().await.unwrap().is_empty());
}
