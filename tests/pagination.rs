//! Paged loading of the URL dashboard through the API client

mod common;

use common::{client, token};
use serde_json::json;
use shrinkurl_client::domain::{PageState, ShortUrl};
use shrinkurl_client::protocol::network::{ErrorKind, PagedList};
use shrinkurl_client::store::TokenStore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "originalUrl": format!("https://example.com/{id}"),
        "shortCode": format!("c{id}"),
        "clickCount": id * 2,
    })
}

async fn mount_page(server: &MockServer, page: u32, body: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/urls/paginated"))
        .and(query_param("page", page.to_string().as_str()))
        .and(query_param("size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn loads_until_exhausted_then_stops_calling() {
    let server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens(&token("a", 600), Some("r"));

    mount_page(&server, 0, json!({ "items": [url(1), url(2)], "hasMore": true }), 1).await;
    mount_page(&server, 1, json!({ "urls": [url(3)], "hasMore": false }), 1).await;

    let client = client(&server.uri(), &tokens);
    let list = PagedList::<ShortUrl>::new(2);

    let first = list
        .load_next(|page, size| client.urls_page(page, size))
        .await
        .unwrap();
    assert_eq!(first.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 2]);

    let second = list
        .load_next(|page, size| client.urls_page(page, size))
        .await
        .unwrap();
    assert_eq!(second.len(), 1);

    for _ in 0..2 {
        let again = list
            .load_next(|page, size| client.urls_page(page, size))
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    assert_eq!(list.items().len(), 3);
    assert_eq!(
        list.state(),
        PageState {
            page_index: 2,
            page_size: 2,
            exhausted: true,
            loading: false,
        }
    );
}

#[tokio::test]
async fn failed_page_can_be_retried() {
    let server = MockServer::start().await;
    let tokens = TokenStore::in_memory();

    Mock::given(method("GET"))
        .and(path("/api/urls/paginated"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 0, json!({ "items": [url(1)], "hasMore": true }), 1).await;

    let client = client(&server.uri(), &tokens);
    let list = PagedList::<ShortUrl>::new(2);

    let error = list
        .load_next(|page, size| client.urls_page(page, size))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Http);
    assert_eq!(list.state(), PageState::new(2));

    let loaded = list
        .load_next(|page, size| client.urls_page(page, size))
        .await
        .unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(list.state().page_index, 1);
}
