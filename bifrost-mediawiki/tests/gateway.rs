//! Integration tests for the gateway against a mocked upstream wiki.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bifrost_mediawiki::client::RetryPolicy;
use bifrost_mediawiki::{ApiClient, Gateway, Pagination, ResolvedInteraction};

fn gateway(server: &MockServer) -> Gateway {
    let client = ApiClient::builder()
        .base_url(format!("{}/w/api.php", server.uri()))
        .retry(RetryPolicy {
            retries: 3,
            backoff: Duration::from_millis(1),
        })
        .build();
    Gateway::new(client)
}

fn lsd_ask_body() -> serde_json::Value {
    json!({
        "query": {
            "results": {
                "LSD": {
                    "fulltext": "LSD",
                    "fullurl": "https://psychonautwiki.org/wiki/LSD"
                }
            }
        }
    })
}

fn lsd_browse_body() -> serde_json::Value {
    json!({
        "query": {
            "subject": "LSD#0#",
            "data": [
                {"property": "Oral_common_min_dose", "dataitem": [{"type": 1, "item": "75"}]},
                {"property": "Oral_common_max_dose", "dataitem": [{"type": 1, "item": "150"}]},
                {"property": "Oral_dose_units", "dataitem": [{"type": 2, "item": "µg"}]},
                {"property": "Psychoactive_class", "dataitem": [{"type": 9, "item": "Psychedelics#0#"}]},
                {"property": "_SKEY", "dataitem": [{"type": 2, "item": "LSD"}]}
            ]
        }
    })
}

#[tokio::test]
async fn query_lookup_enriches_and_caches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "ask"))
        .and(query_param("query", "[[:LSD]]|limit=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lsd_ask_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "browsebysubject"))
        .and(query_param("subject", "LSD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lsd_browse_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let page = Pagination {
        limit: Some(1),
        offset: None,
    };

    let substances = gateway.enriched_substances("LSD", page).await.unwrap();
    assert_eq!(substances.len(), 1);
    let lsd = &substances[0];
    assert_eq!(lsd.name, "LSD");
    assert_eq!(lsd.url.as_deref(), Some("https://psychonautwiki.org/wiki/LSD"));

    let record = lsd.record.as_ref().expect("enriched record");
    assert_eq!(
        record.class.psychoactive,
        Some(vec!["Psychedelics".to_owned()])
    );
    let oral = record.roa.get("oral").expect("oral roa");
    assert_eq!(oral.dose.units.as_deref(), Some("µg"));

    // Re-running within the TTL serves both payloads from cache; the
    // `.expect(1)` mocks verify that no further upstream calls happen.
    let again = gateway.enriched_substances("LSD", page).await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].record, substances[0].record);
}

#[tokio::test]
async fn empty_title_lookup_falls_back_to_common_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("query", "[[:acid]]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {"results": []}})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param(
            "query",
            "[[common_name::acid]]|[[Category:psychoactive_substance]]",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(lsd_ask_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let pages = gateway
        .search_substances("acid", Pagination::default())
        .await
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].name, "LSD");
}

#[tokio::test]
async fn exhausted_fallbacks_yield_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {"results": []}})))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let pages = gateway
        .search_substances("nonexistent", Pagination::default())
        .await
        .unwrap();
    assert!(pages.is_empty());
}

#[tokio::test]
async fn transient_upstream_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lsd_ask_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let pages = gateway
        .search_substances("LSD", Pagination::default())
        .await
        .unwrap();
    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn summary_extracts_two_paragraphs() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("page", "LSD"))
        .and(query_param("prop", "text"))
        .and(query_param("section", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parse": {
                "text": {
                    "*": "<p>First paragraph.[1]</p><p>Second paragraph.</p><p>Third.</p>"
                }
            }
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    assert_eq!(
        gateway.summary("LSD").await.as_deref(),
        Some("First paragraph. Second paragraph.")
    );
}

#[tokio::test]
async fn summary_is_none_on_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    assert_eq!(gateway.summary("LSD").await, None);
}

#[tokio::test]
async fn images_derive_hashed_urls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("prop", "images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parse": {"images": ["File:LSD.svg"]}
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let images = gateway.images("LSD").await.expect("image list");
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0].thumb,
        "https://psychonautwiki.org/w/thumb.php?f=File:LSD.svg&width=100"
    );
    assert_eq!(
        images[0].image,
        "https://psychonautwiki.org/w/images/a/a7/File:LSD.svg"
    );
}

#[tokio::test]
async fn effects_by_substance_reads_printouts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("query", "[[:LSD]]|?Effect|limit=50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {
                "results": {
                    "LSD": {
                        "printouts": {
                            "Effect": [
                                {"fulltext": "Euphoria", "fullurl": "https://psychonautwiki.org/wiki/Euphoria"}
                            ]
                        }
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let effects = gateway
        .effects_by_substance(
            "LSD",
            Pagination {
                limit: Some(50),
                offset: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].name, "Euphoria");
}

#[tokio::test]
async fn interaction_resolution_collapses_to_stub_on_no_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {"results": []}})))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let resolved = gateway.resolve_interaction("Alcohol").await.unwrap();
    assert_eq!(resolved, ResolvedInteraction::Stub("Alcohol".to_owned()));
}

#[tokio::test]
async fn interaction_resolution_enriches_single_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lsd_ask_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "browsebysubject"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lsd_browse_body()))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let resolved = gateway.resolve_interaction("LSD").await.unwrap();
    match resolved {
        ResolvedInteraction::Match(data) => {
            assert_eq!(data.name, "LSD");
            assert!(data.record.is_some());
        }
        ResolvedInteraction::Stub(_) => panic!("expected an enriched match"),
    }
}
