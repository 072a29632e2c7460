//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the platform, the restaurant
//! registry and the storage API, and drive complete review and menu runs
//! end-to-end.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use zomato_scout::config::{
    ClientConfig, Config, CrawlerConfig, EndpointsConfig, OutputConfig, RegistryConfig,
    RetryConfig, SinkConfig,
};
use zomato_scout::crawler::Coordinator;
use zomato_scout::output::{DeliveryStatus, RunSummary};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REVIEWS_PATH: &str = "/webroutes/reviews/loadMore";
const MENU_PATH: &str = "/webroutes/getPage";

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let uri = server.uri();
    Config {
        crawler: CrawlerConfig {
            stop_threshold_days: 2,
            max_concurrent_requests: 4,
            request_delay_ms: 0,
            max_pages_per_restaurant: 10,
        },
        client: ClientConfig {
            timeout_secs: 5,
            ..ClientConfig::default()
        },
        retry: RetryConfig {
            max_attempts: 3,
            backoff_ms: 10, // Very short for testing
            retryable_status_codes: vec![429, 500, 502, 503, 504],
        },
        endpoints: EndpointsConfig {
            base_url: uri.clone(),
            short_url_base: uri.clone(),
        },
        registry: RegistryConfig {
            url: format!("{}/registry", uri),
            query: "SELECT * FROM competitor_master_data;".to_string(),
            headers: BTreeMap::from([("x-api-key".to_string(), "registry-key".to_string())]),
        },
        sink: SinkConfig {
            url: format!("{}/sink", uri),
            reviews_table: "competitor_zomato_reviews".to_string(),
            menu_table: "competitor_zomato_item_details".to_string(),
            menu_database: "dev".to_string(),
            headers: BTreeMap::new(),
        },
        output: OutputConfig::default(),
    }
}

/// 2024-01-10 12:00, so a two-day threshold keeps reviews from 2024-01-08 on
fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn restaurant_row(res_id: &str, brand: &str) -> Value {
    json!({
        "res_id": res_id,
        "competitor_id": 7,
        "brand_name": brand,
        "city": "Pune",
        "sub_zone": "Baner",
        "platform": "zomato"
    })
}

/// Builds a review listing body; reviews are (id, timestamp) in newest-first order
fn review_page(reviews: &[(&str, &str)], current: u32, total: u32) -> Value {
    let mut map = serde_json::Map::new();
    for (id, timestamp) in reviews {
        map.insert(
            id.to_string(),
            json!({
                "reviewId": id,
                "reviewText": format!("Review {}", id),
                "ratingV2": 4,
                "ratingV2Text": "Very Good",
                "timestamp": timestamp
            }),
        );
    }

    json!({
        "entities": {"REVIEWS": map},
        "page_data": {"sections": {"SECTION_REVIEWS": {
            "currentPage": current,
            "numberOfPages": total
        }}}
    })
}

async fn mount_registry(server: &MockServer, rows: Value) {
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

async fn mount_sink(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/sink"))
        .respond_with(ResponseTemplate::new(status).set_body_string("{}"))
        .mount(server)
        .await;
}

async fn mount_review_page(server: &MockServer, res_id: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(REVIEWS_PATH))
        .and(query_param("res_id", res_id))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Returns the JSON bodies posted to the storage API
async fn sink_uploads(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/sink")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

/// Returns the pages requested for a restaurant's review listing
async fn requested_pages(server: &MockServer, res_id: &str) -> Vec<u32> {
    let mut pages: Vec<u32> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == REVIEWS_PATH)
        .filter(|request| {
            request
                .url
                .query_pairs()
                .any(|(key, value)| key == "res_id" && value == res_id)
        })
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .collect();
    pages.sort_unstable();
    pages
}

fn review_ids(upload: &Value) -> Vec<String> {
    upload["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["review_id"].as_str().unwrap().to_string())
        .collect()
}

async fn run_reviews(config: Config) -> RunSummary {
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_reference_time(reference_time())
        .run_reviews()
        .await
}

#[tokio::test]
async fn test_review_crawl_stops_at_first_stale_review() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    mount_review_page(
        &server,
        "101",
        1,
        review_page(&[("r1", "2 hours ago"), ("r2", "yesterday")], 1, 5),
    )
    .await;
    mount_review_page(
        &server,
        "101",
        2,
        review_page(
            &[("r3", "2 days ago"), ("r4", "3 days ago"), ("r5", "5 hours ago")],
            2,
            5,
        ),
    )
    .await;

    let summary = run_reviews(create_test_config(&server)).await;

    // r4 is dated 2024-01-07: it and everything after it are discarded
    let uploads = sink_uploads(&server).await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(review_ids(&uploads[0]), vec!["r1", "r2", "r3"]);
    assert_eq!(uploads[0]["tableName"], "competitor_zomato_reviews");
    assert_eq!(uploads[0]["ignoreDuplicates"], 1);

    let dates: Vec<&str> = uploads[0]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["review_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-01-10", "2024-01-09", "2024-01-08"]);

    let first = &uploads[0]["data"][0];
    assert_eq!(first["brand_name"], "Biryani House");
    assert_eq!(first["competitor_id"], "7");
    assert_eq!(first["res_id"], "101");
    assert_eq!(first["rating"], 4.0);
    assert_eq!(first["review_type"], "Very Good");

    // Page 3 is never requested even though the listing has five pages
    assert_eq!(requested_pages(&server, "101").await, vec![1, 2]);

    assert_eq!(summary.records_collected, 3);
    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.outcomes.get("stale_review"), Some(&1));
    assert_eq!(summary.delivery, DeliveryStatus::Delivered { records: 3 });
    assert!(summary.is_clean());
}

#[tokio::test]
async fn test_review_crawl_stops_on_last_page() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    mount_review_page(&server, "101", 1, review_page(&[("r1", "today")], 1, 2)).await;
    mount_review_page(&server, "101", 2, review_page(&[("r2", "1 hour ago")], 2, 2)).await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(requested_pages(&server, "101").await, vec![1, 2]);
    assert_eq!(review_ids(&sink_uploads(&server).await[0]), vec!["r1", "r2"]);
    assert_eq!(summary.outcomes.get("last_page"), Some(&1));
}

#[tokio::test]
async fn test_review_crawl_stops_on_unrecognized_date() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    mount_review_page(
        &server,
        "101",
        1,
        review_page(&[("r1", "today"), ("r2", "Jan 05, 2024"), ("r3", "today")], 1, 3),
    )
    .await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(requested_pages(&server, "101").await, vec![1]);
    assert_eq!(review_ids(&sink_uploads(&server).await[0]), vec!["r1"]);
    assert_eq!(summary.outcomes.get("unrecognized_date"), Some(&1));
}

#[tokio::test]
async fn test_malformed_page_isolates_one_restaurant() {
    let server = MockServer::start().await;
    mount_registry(
        &server,
        json!([
            restaurant_row("101", "Biryani House"),
            restaurant_row("202", "Pizza Place")
        ]),
    )
    .await;
    mount_sink(&server, 201).await;

    mount_review_page(&server, "101", 1, review_page(&[("a1", "today")], 1, 3)).await;
    Mock::given(method("GET"))
        .and(path(REVIEWS_PATH))
        .and(query_param("res_id", "101"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    mount_review_page(&server, "202", 1, review_page(&[("b1", "yesterday")], 1, 2)).await;
    mount_review_page(&server, "202", 2, review_page(&[("b2", "2 days ago")], 2, 2)).await;

    let summary = run_reviews(create_test_config(&server)).await;

    // Restaurant 101 keeps what it emitted before the bad page
    let uploads = sink_uploads(&server).await;
    assert_eq!(uploads.len(), 1);
    let mut ids = review_ids(&uploads[0]);
    ids.sort();
    assert_eq!(ids, vec!["a1", "b1", "b2"]);

    assert_eq!(requested_pages(&server, "101").await, vec![1, 2]);
    assert_eq!(summary.restaurants, 2);
    assert_eq!(summary.failed_restaurants, vec!["101".to_string()]);
    assert_eq!(summary.outcomes.get("malformed_payload"), Some(&1));
    assert_eq!(summary.outcomes.get("last_page"), Some(&1));
    assert_eq!(summary.delivery, DeliveryStatus::Delivered { records: 3 });
}

#[tokio::test]
async fn test_retries_transient_status() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    // First attempt fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path(REVIEWS_PATH))
        .and(query_param("res_id", "101"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_review_page(&server, "101", 1, review_page(&[("r1", "today")], 1, 1)).await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(requested_pages(&server, "101").await, vec![1, 1]);
    assert_eq!(summary.records_collected, 1);
    assert_eq!(summary.outcomes.get("last_page"), Some(&1));
    assert!(summary.failed_restaurants.is_empty());
}

#[tokio::test]
async fn test_retries_unlisted_server_error() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    // 520 is not in the configured list but is still a server error
    Mock::given(method("GET"))
        .and(path(REVIEWS_PATH))
        .and(query_param("res_id", "101"))
        .respond_with(ResponseTemplate::new(520))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_review_page(&server, "101", 1, review_page(&[("r1", "today")], 1, 1)).await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(requested_pages(&server, "101").await, vec![1, 1]);
    assert_eq!(review_ids(&sink_uploads(&server).await[0]), vec!["r1"]);
    assert_eq!(summary.outcomes.get("last_page"), Some(&1));
    assert!(summary.failed_restaurants.is_empty());
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    Mock::given(method("GET"))
        .and(path(REVIEWS_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(summary.outcomes.get("fetch_failed"), Some(&1));
    assert_eq!(summary.failed_restaurants, vec!["101".to_string()]);
    // Delivery is still attempted with the (empty) record set
    assert_eq!(summary.delivery, DeliveryStatus::Delivered { records: 0 });
}

#[tokio::test]
async fn test_non_retryable_status_is_not_retried() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;

    Mock::given(method("GET"))
        .and(path(REVIEWS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(summary.outcomes.get("fetch_failed"), Some(&1));
}

#[tokio::test]
async fn test_delivery_failure_is_reported() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    // Only 201 counts as success
    mount_sink(&server, 200).await;
    mount_review_page(&server, "101", 1, review_page(&[("r1", "today")], 1, 1)).await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert_eq!(sink_uploads(&server).await.len(), 1);
    assert!(matches!(summary.delivery, DeliveryStatus::Failed { .. }));
    assert!(!summary.is_clean());
}

#[tokio::test]
async fn test_registry_failure_still_posts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;
    mount_sink(&server, 201).await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert!(summary.registry_error.is_some());
    assert_eq!(summary.restaurants, 0);

    let uploads = sink_uploads(&server).await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0]["data"], json!([]));
}

#[tokio::test]
async fn test_registry_request_carries_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .and(header("x-api-key", "registry-key"))
        .and(body_json(json!({"query": "SELECT * FROM competitor_master_data;"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    mount_sink(&server, 201).await;

    let summary = run_reviews(create_test_config(&server)).await;

    assert!(summary.registry_error.is_none());
    assert_eq!(summary.restaurants, 0);
}

#[tokio::test]
async fn test_review_export_written_locally() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;
    mount_review_page(
        &server,
        "101",
        1,
        review_page(&[("r1", "today"), ("r2", "yesterday")], 1, 1),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("scraped_reviews.json");

    let mut config = create_test_config(&server);
    config.output.export_path = Some(export_path.display().to_string());
    run_reviews(config).await;

    let exported: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    let ids: Vec<&str> = exported
        .iter()
        .map(|record| record["review_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

fn menu_payload() -> Value {
    json!({"page_data": {"order": {"menuList": {"menus": [
        {"menu": {"name": "Biryani", "categories": [
            {"category": {"name": "Chicken", "items": [
                {"item": {
                    "name": "Chicken Dum Biryani",
                    "price": 349,
                    "rating": {"value": 4.3, "total_rating_text": "120 ratings"},
                    "tag_objects": [{"title": {"text": "BESTSELLER"}}]
                }},
                {"item": {"name": "Chicken 65 Biryani", "price": "299", "rating": {}}}
            ]}}
        ]}},
        {"menu": {"name": "Desserts", "categories": [
            {"category": {"name": "Sweets", "items": [
                {"item": {"name": "Gulab Jamun", "price": 99}}
            ]}}
        ]}}
    ]}}}})
}

async fn mount_short_link(server: &MockServer, res_id: &str, page_path: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/r/{}", res_id)))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/{}", server.uri(), page_path).as_str()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", page_path)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;
}

async fn run_menu(config: Config) -> RunSummary {
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_reference_time(reference_time())
        .run_menu()
        .await
}

#[tokio::test]
async fn test_menu_crawl_through_short_link() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;
    mount_short_link(&server, "101", "pune/biryani-house-baner").await;

    Mock::given(method("GET"))
        .and(path(MENU_PATH))
        .and(query_param("page_url", "/pune/biryani-house-baner/order"))
        .and(query_param("isMobile", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(menu_payload()))
        .mount(&server)
        .await;

    let summary = run_menu(create_test_config(&server)).await;

    let uploads = sink_uploads(&server).await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0]["tableName"], "competitor_zomato_item_details");
    assert_eq!(uploads[0]["database"], "dev");
    assert!(uploads[0].get("ignoreDuplicates").is_none());

    let items = uploads[0]["data"].as_array().unwrap();
    let names: Vec<&str> = items
        .iter()
        .map(|item| item["item_name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Chicken Dum Biryani", "Chicken 65 Biryani", "Gulab Jamun"]
    );

    assert_eq!(items[0]["main_category"], "Biryani");
    assert_eq!(items[0]["category"], "Chicken");
    assert_eq!(items[0]["price"], 349.0);
    assert_eq!(items[0]["rating"], "4.3");
    assert_eq!(items[0]["rating_count"], "120");
    assert_eq!(items[0]["tag"], "BESTSELLER");
    assert_eq!(items[0]["date"], "2024-01-10");
    assert_eq!(items[0]["subzone"], "Baner");
    assert_eq!(items[1]["rating"], "");
    assert_eq!(items[1]["tag"], Value::Null);
    assert_eq!(items[2]["main_category"], "Desserts");

    assert_eq!(summary.records_collected, 3);
    assert_eq!(summary.delivery, DeliveryStatus::Delivered { records: 3 });
}

#[tokio::test]
async fn test_menu_crawl_without_items_skips_delivery() {
    let server = MockServer::start().await;
    mount_registry(&server, json!([restaurant_row("101", "Biryani House")])).await;
    mount_sink(&server, 201).await;
    mount_short_link(&server, "101", "pune/closed-kitchen").await;

    Mock::given(method("GET"))
        .and(path(MENU_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"page_data": {"order": {"menuList": {"menus": []}}}})),
        )
        .mount(&server)
        .await;

    let summary = run_menu(create_test_config(&server)).await;

    assert!(sink_uploads(&server).await.is_empty());
    assert_eq!(summary.delivery, DeliveryStatus::Skipped);
    assert_eq!(summary.failed_restaurants, vec!["101".to_string()]);
    assert_eq!(summary.outcomes.get("failed"), Some(&1));
}
