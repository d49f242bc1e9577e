use chrono::{TimeZone, Utc};
use jobsift_core::models::Listing;
use jobsift_core::traits::ListingStore;
use uuid::Uuid;

use crate::integration::common::setup_test_db;

fn listing(url: &str) -> Listing {
    Listing {
        title: "Rust developer".into(),
        company: "Acme".into(),
        salary: "from 200000 RUR".into(),
        city: "Москва".into(),
        experience: "1–3 years".into(),
        url: url.into(),
        description: "Async services".into(),
        published_at: Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap(),
    }
}

#[tokio::test]
async fn create_and_get_search() {
    let (db, _container) = setup_test_db().await;
    let repo = db.search_repo();

    let created = repo.create("  rust  ", "Москва").await.unwrap();
    assert_eq!(created.query, "rust");
    assert_eq!(created.results_count, 0);

    let found = repo.get(created.id).await.unwrap().expect("search exists");
    assert_eq!(found.id, created.id);
    assert_eq!(found.city, "Москва");

    assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn save_listings_dedups_by_url_and_counts() {
    let (db, _container) = setup_test_db().await;
    let search = db.search_repo().create("rust", "Москва").await.unwrap();
    let store = db.listing_repo();

    let batch = vec![
        listing("https://hh.ru/vacancy/1"),
        listing("https://hh.ru/vacancy/2"),
        listing("https://hh.ru/vacancy/1"),
    ];
    let saved = store.save_listings(search.id, &batch).await.unwrap();
    assert_eq!(saved, 2);

    let again = store.save_listings(search.id, &batch).await.unwrap();
    assert_eq!(again, 0);

    let stored = store.list_for_search(search.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], batch[0]);
    assert_eq!(stored[1].url, "https://hh.ru/vacancy/2");

    let search = db.search_repo().get(search.id).await.unwrap().unwrap();
    assert_eq!(search.results_count, 2);
}

#[tokio::test]
async fn url_is_unique_across_searches() {
    let (db, _container) = setup_test_db().await;
    let first = db.search_repo().create("rust", "Москва").await.unwrap();
    let second = db.search_repo().create("rust", "Казань").await.unwrap();
    let store = db.listing_repo();

    store
        .save_listings(first.id, &[listing("https://hh.ru/vacancy/9")])
        .await
        .unwrap();
    let saved = store
        .save_listings(second.id, &[listing("https://hh.ru/vacancy/9")])
        .await
        .unwrap();

    assert_eq!(saved, 0);
    assert!(store.list_for_search(second.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn long_fields_are_truncated_and_short_titles_skipped() {
    let (db, _container) = setup_test_db().await;
    let search = db.search_repo().create("rust", "Москва").await.unwrap();
    let store = db.listing_repo();

    let mut long = listing("https://hh.ru/vacancy/long");
    long.title = "Т".repeat(250);
    long.description = "д".repeat(1500);
    let mut short = listing("https://hh.ru/vacancy/short");
    short.title = "X".into();

    let saved = store.save_listings(search.id, &[long, short]).await.unwrap();
    assert_eq!(saved, 1);

    let stored = store.list_for_search(search.id).await.unwrap();
    assert_eq!(stored[0].title.chars().count(), 200);
    assert_eq!(stored[0].description.chars().count(), 1000);
}

#[tokio::test]
async fn over_long_urls_are_skipped_not_truncated() {
    let (db, _container) = setup_test_db().await;
    let search = db.search_repo().create("rust", "Москва").await.unwrap();
    let store = db.listing_repo();

    let prefix = format!("https://hh.ru/vacancy/1?q={}", "a".repeat(500));
    let first = listing(&format!("{prefix}-first"));
    let second = listing(&format!("{prefix}-second"));
    let normal = listing("https://hh.ru/vacancy/7");

    let saved = store.save_listings(search.id, &[first, second, normal]).await.unwrap();
    assert_eq!(saved, 1);

    let stored = store.list_for_search(search.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].url, "https://hh.ru/vacancy/7");
}

#[tokio::test]
async fn health_check_succeeds() {
    let (db, _container) = setup_test_db().await;
    db.health_check().await.unwrap();
}
