// End-to-end flows: client + stores against a mocked API.

use std::sync::Arc;

use autoyard_rust::{
    ApiError, AutoyardClient, KeyValueStorage, MemoryStorage, Negotiations, SearchHistory,
    config::{ApiSettings, StorageSettings},
    market::scan_market,
    models::{NegotiationStatus, NegotiationUpdate, SearchFilters},
    negotiations::open_negotiations,
    storage,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NAMESPACE: &str = "autoyard";

fn test_client(base_url: &str) -> AutoyardClient {
    AutoyardClient::with_base_url(base_url, &ApiSettings::default())
        .expect("client construction should not fail")
}

fn car_json(id: i64, price: i64) -> serde_json::Value {
    serde_json::json!({ "car_id": id, "make": "Peugeot", "model": "308", "price": price })
}

async fn mount_car(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/theparking-eu/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "success": true, "data": car_json(id, 7000) })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn opening_negotiations_stores_pending_items() {
    let server = MockServer::start().await;
    mount_car(&server, 11).await;
    mount_car(&server, 12).await;

    let storage = Arc::new(MemoryStorage::new());
    let mut negotiations = Negotiations::open(storage.clone(), NAMESPACE, Some("u1"));
    let client = test_client(&server.uri());

    let opened = open_negotiations(&client, &mut negotiations, &[11, 12])
        .await
        .expect("negotiations should open");
    assert_eq!(opened, 2);

    let first = negotiations.get(11).expect("car 11 is negotiated");
    assert_eq!(first.status, NegotiationStatus::Pending);
    assert_eq!(first.user_id, "u1");
    assert!(first.search_criteria.id.starts_with("search_"));

    // Persisted under the user's key
    let reloaded = Negotiations::open(storage, NAMESPACE, Some("u1"));
    assert_eq!(reloaded.items().len(), 2);
}

#[tokio::test]
async fn failed_fetch_opens_nothing() {
    let server = MockServer::start().await;
    mount_car(&server, 11).await;

    Mock::given(method("GET"))
        .and(path("/theparking-eu/13"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let mut negotiations = Negotiations::open(storage, NAMESPACE, Some("u1"));
    let client = test_client(&server.uri());

    let err = open_negotiations(&client, &mut negotiations, &[11, 13])
        .await
        .expect_err("missing car fails the batch");

    assert!(matches!(err, ApiError::NotFound { id: 13, .. }));
    assert!(negotiations.items().is_empty());
}

#[tokio::test]
async fn negotiation_lifecycle_after_opening() {
    let server = MockServer::start().await;
    mount_car(&server, 21).await;

    let storage = Arc::new(MemoryStorage::new());
    let mut negotiations = Negotiations::open(storage.clone(), NAMESPACE, Some("u2"));
    let client = test_client(&server.uri());
    open_negotiations(&client, &mut negotiations, &[21]).await.expect("open");

    negotiations.update_negotiation(
        21,
        NegotiationUpdate {
            status: Some(NegotiationStatus::Active),
            current_offer: Some(6500),
            ..NegotiationUpdate::default()
        },
    );
    let item = negotiations.get(21).expect("still there");
    assert_eq!(item.status, NegotiationStatus::Active);
    assert_eq!(item.current_offer, Some(6500));

    negotiations.remove_negotiation(21);
    assert!(negotiations.get(21).is_none());

    let reloaded = Negotiations::open(storage, NAMESPACE, Some("u2"));
    assert!(reloaded.items().is_empty());
}

#[tokio::test]
async fn signed_out_user_opens_nothing_and_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut negotiations = Negotiations::open(Arc::new(MemoryStorage::new()), NAMESPACE, None);
    let client = test_client(&server.uri());

    let opened = open_negotiations(&client, &mut negotiations, &[1, 2])
        .await
        .expect("no-op");
    assert_eq!(opened, 0);
}

#[tokio::test]
async fn market_scan_records_search_history() {
    let server = MockServer::start().await;

    let cars: Vec<_> = [9000, 4000, 12000, 5000, 7000, 6000, 15000]
        .iter()
        .enumerate()
        .map(|(i, &price)| car_json(i as i64 + 1, price))
        .collect();

    Mock::given(method("POST"))
        .and(path("/theparking-eu/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": cars,
            "total": 7
        })))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let mut history = SearchHistory::open(storage.clone(), NAMESPACE, Some("u3"));
    let client = test_client(&server.uri());

    let filters = SearchFilters {
        make: Some("Peugeot".to_string()),
        ..SearchFilters::default()
    };
    let scan = scan_market(&client, &mut history, filters.clone())
        .await
        .expect("scan should succeed");

    let prices: Vec<i64> = scan.best_deals.iter().map(|c| c.price).collect();
    assert_eq!(prices, [4000, 5000, 6000, 7000, 9000]);
    assert_eq!(scan.stats.total_results, 7);
    assert_eq!(scan.stats.best_price, 4000);

    let record = scan.record.expect("signed-in scan is recorded");
    assert_eq!(record.results, 5);
    assert_eq!(record.filters, filters);

    let reloaded = SearchHistory::open(storage, NAMESPACE, Some("u3"));
    assert_eq!(reloaded.records().len(), 1);
    assert_eq!(reloaded.records()[0].id, record.id);
}

#[tokio::test]
async fn failed_scan_records_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/theparking-eu/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": "maintenance"
        })))
        .mount(&server)
        .await;

    let mut history = SearchHistory::open(Arc::new(MemoryStorage::new()), NAMESPACE, Some("u3"));
    let client = test_client(&server.uri());

    let err = scan_market(&client, &mut history, SearchFilters::default())
        .await
        .expect_err("scan should fail");
    assert_eq!(err.to_string(), "maintenance");
    assert!(history.records().is_empty());
}

#[test]
fn configured_file_storage_persists_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = StorageSettings {
        namespace: NAMESPACE.to_string(),
        data_dir: dir.path().join("data").display().to_string(),
    };
    let backend: Arc<dyn KeyValueStorage> =
        storage::open_configured(&settings).expect("storage should open");

    let mut history = SearchHistory::open(backend, &settings.namespace, Some("u4"));
    history.add_search(autoyard_rust::models::SearchRecord::new(
        "u4",
        SearchFilters::default(),
        3,
    ));

    assert!(dir.path().join("data/autoyard_search_history_u4.json").exists());

    let reopened = storage::open_configured(&settings).expect("storage should reopen");
    let history = SearchHistory::open(reopened, &settings.namespace, Some("u4"));
    assert_eq!(history.records().len(), 1);
    assert_eq!(history.records()[0].results, 3);
}
