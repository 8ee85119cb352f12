//! Integration tests for the cache-aside PokeAPI client
//!
//! Each test runs its own mock PokeAPI and counts the requests that reach it.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pokedex::api::{ApiError, PokeClient};

fn pikachu() -> serde_json::Value {
    json!({
        "id": 25,
        "name": "pikachu",
        "base_experience": 112,
        "height": 4,
        "weight": 60,
        "abilities": [
            {"ability": {"name": "static", "url": "https://pokeapi.co/api/v2/ability/9/"}, "is_hidden": false, "slot": 1}
        ],
        "stats": [
            {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/"}}
        ],
        "types": [
            {"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}
        ],
        "order": 35
    })
}

fn client_for(server: &MockServer, ttl: Duration) -> PokeClient {
    PokeClient::new(ttl).unwrap().with_base_url(server.uri())
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .len()
}

#[tokio::test]
async fn test_pokemon_miss_then_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu()))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_secs(60));

    let first = client.get_pokemon("pikachu").await.unwrap();
    assert_eq!(first.name, "pikachu");
    assert_eq!(first.types[0].kind.name, "electric");
    assert_eq!(request_count(&server).await, 1);

    let second = client.get_pokemon("pikachu").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(request_count(&server).await, 1);

    client.shutdown();
}

#[tokio::test]
async fn test_location_area_miss_then_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/location-area/canalave-city-area"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "canalave-city-area",
            "pokemon_encounters": [
                {"pokemon": {"name": "tentacool", "url": "https://pokeapi.co/api/v2/pokemon/72/"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_secs(60));

    let first = client.get_location_area("canalave-city-area").await.unwrap();
    let second = client.get_location_area("canalave-city-area").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.pokemon_names().collect::<Vec<_>>(), vec!["tentacool"]);
    assert_eq!(request_count(&server).await, 1);
    client.shutdown();
}

#[tokio::test]
async fn test_location_area_pages_are_cached_by_url() {
    let server = MockServer::start().await;
    let next = format!("{}/location-area?offset=20&limit=20", server.uri());

    Mock::given(method("GET"))
        .and(path("/location-area"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 21,
            "next": next,
            "previous": null,
            "results": [{"name": "canalave-city-area", "url": "https://pokeapi.co/api/v2/location-area/1/"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/location-area"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 21,
            "next": null,
            "previous": format!("{}/location-area?offset=0&limit=20", server.uri()),
            "results": [{"name": "pastoria-city-area", "url": "https://pokeapi.co/api/v2/location-area/21/"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_secs(60));

    let first = client.list_location_areas(None).await.unwrap();
    assert_eq!(first.count, 21);
    assert_eq!(first.next.as_deref(), Some(next.as_str()));
    assert!(first.previous.is_none());

    let second = client.list_location_areas(first.next.as_deref()).await.unwrap();
    assert_eq!(second.results[0].name, "pastoria-city-area");
    assert!(second.next.is_none());

    // The previous pointer is the canonical first page URL, so this is a hit
    let back = client
        .list_location_areas(second.previous.as_deref())
        .await
        .unwrap();
    assert_eq!(back, first);
    let again = client.list_location_areas(None).await.unwrap();
    assert_eq!(again, first);

    assert_eq!(request_count(&server).await, 2);
    client.shutdown();
}

#[tokio::test]
async fn test_remote_error_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu()))
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_secs(60));

    let err = client.get_pokemon("pikachu").await.unwrap_err();
    assert!(matches!(err, ApiError::RemoteError { status: 503 }));
    assert!(client.cache().is_empty());

    let pokemon = client.get_pokemon("pikachu").await.unwrap();
    assert_eq!(pokemon.id, 25);
    assert_eq!(request_count(&server).await, 2);
    client.shutdown();
}

#[tokio::test]
async fn test_not_found_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_secs(60));

    for _ in 0..2 {
        let err = client.get_pokemon("missingno").await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteError { status: 404 }));
    }
    assert_eq!(request_count(&server).await, 2);
    client.shutdown();
}

#[tokio::test]
async fn test_malformed_body_is_decode_error_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/location-area/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": \"not a number\""))
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_secs(60));

    let err = client.get_location_area("broken").await.unwrap_err();
    assert!(matches!(err, ApiError::DecodeError(_)));

    let err = client.get_location_area("broken").await.unwrap_err();
    assert!(matches!(err, ApiError::DecodeError(_)));
    assert_eq!(request_count(&server).await, 2);
    assert!(client.cache().is_empty());
    client.shutdown();
}

#[tokio::test]
async fn test_expired_entry_is_fetched_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu()))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server, Duration::from_millis(100));

    client.get_pokemon("pikachu").await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    client.get_pokemon("pikachu").await.unwrap();

    assert_eq!(request_count(&server).await, 2);
    client.shutdown();
}
