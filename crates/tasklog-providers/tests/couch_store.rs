// CouchDB `_find` client against a mock server.
use mockito::{Matcher, Server};
use serde_json::json;
use tasklog_providers::{CouchConfig, CouchStore, ProviderErrorCode, RunContext, TaskStore};

fn store(url: &str, page_size: usize) -> CouchStore {
    let config = CouchConfig::new(url, "tasks")
        .unwrap()
        .with_credentials("user", "pass")
        .with_page_size(page_size);
    CouchStore::new(config).unwrap()
}

fn doc(id: &str, times: &[i64]) -> serde_json::Value {
    json!({"_id": id, "_rev": "1-x", "db": "Tasks", "title": id.to_uppercase(), "times": times})
}

#[tokio::test]
async fn follows_bookmarks_until_a_short_page() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("POST", "/tasks/_find")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(
            json!({"selector": {"db": {"$eq": "Tasks"}}, "limit": 2}),
        ))
        .with_status(200)
        .with_body(
            json!({"docs": [doc("a", &[1, 2]), doc("b", &[])], "bookmark": "b1"}).to_string(),
        )
        .create_async()
        .await;

    let second = server
        .mock("POST", "/tasks/_find")
        .match_body(Matcher::PartialJson(json!({"bookmark": "b1"})))
        .with_status(200)
        .with_body(json!({"docs": [doc("c", &[3, 4, 5])], "bookmark": "b2"}).to_string())
        .create_async()
        .await;

    let records = store(&server.url(), 2)
        .find_tasks(&RunContext::unbounded())
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(records[0].title, "A");
    assert_eq!(records[2].times, Some(vec![3, 4, 5]));

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn empty_full_page_stops_paging() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/tasks/_find")
        .with_status(200)
        .with_body(r#"{"docs": [], "bookmark": "nil"}"#)
        .expect(1)
        .create_async()
        .await;

    let records = store(&server.url(), 25)
        .find_tasks(&RunContext::unbounded())
        .await
        .unwrap();
    assert!(records.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn warning_does_not_fail_the_query() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/tasks/_find")
        .with_status(200)
        .with_body(
            json!({
                "docs": [doc("a", &[1, 2])],
                "bookmark": "b1",
                "warning": "No matching index found, create an index to optimize query time."
            })
            .to_string(),
        )
        .create_async()
        .await;

    let records = store(&server.url(), 25)
        .find_tasks(&RunContext::unbounded())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn unauthorized_is_an_authentication_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/tasks/_find")
        .with_status(401)
        .with_body(r#"{"error":"unauthorized","reason":"Name or password is incorrect."}"#)
        .create_async()
        .await;

    let err = store(&server.url(), 25)
        .find_tasks(&RunContext::unbounded())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    assert_eq!(err.provider(), Some("couchdb"));
}

#[tokio::test]
async fn missing_database_is_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/tasks/_find")
        .with_status(404)
        .with_body(r#"{"error":"not_found","reason":"Database does not exist."}"#)
        .create_async()
        .await;

    let err = store(&server.url(), 25)
        .find_tasks(&RunContext::unbounded())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::NotFound);
}

#[tokio::test]
async fn garbage_body_is_an_invalid_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/tasks/_find")
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let err = store(&server.url(), 25)
        .find_tasks(&RunContext::unbounded())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
}
