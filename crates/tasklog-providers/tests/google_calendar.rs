// Google Calendar client, pager and deleter against a mock server.
use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};
use serde_json::json;
use tasklog_core::filter_instant_events;
use tasklog_providers::google::{
    GoogleCalendar, GoogleCalendarClient, GoogleConfig, OAuthCredentials, TokenInfo, TokenStorage,
};
use tasklog_providers::{
    CalendarApi, CalendarPager, EventDeleter, ListQuery, ProviderErrorCode, RunContext,
};

fn calendar_with_token(
    server: &Server,
    dir: &tempfile::TempDir,
    tokens: TokenInfo,
) -> GoogleCalendar {
    let config = GoogleConfig::new(OAuthCredentials::new("id", "secret"))
        .with_token_path(dir.path().join("tokens.json"))
        .with_endpoints(server.url(), format!("{}/token", server.url()));
    TokenStorage::new(&config.token_path).save(&tokens).unwrap();
    GoogleCalendar::new(config).unwrap()
}

fn fresh_token() -> TokenInfo {
    TokenInfo::new("tok", Some("refresh".into()), Some(3600), vec![])
}

fn timed(id: &str, start: &str, end: &str) -> serde_json::Value {
    json!({"id": id, "summary": id, "start": {"dateTime": start}, "end": {"dateTime": end}})
}

#[tokio::test]
async fn list_sends_fixed_query_and_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer tok")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("timeMax".into(), "2024-03-15T12:00:00+00:00".into()),
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
            Matcher::UrlEncoded("maxResults".into(), "50".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({"items": [timed("a", "2024-03-15T10:00:00Z", "2024-03-15T10:00:00Z")]})
                .to_string(),
        )
        .create_async()
        .await;

    let client =
        GoogleCalendarClient::new(server.url(), std::time::Duration::from_secs(5), "test")
            .unwrap();
    let time_max = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let query = ListQuery::new("primary", time_max).with_max_results(50);

    let page = client.list_events_page("tok", &query).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.next_page_token.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn pager_walks_cursor_pages_in_order() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    let first = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Regex(
            "^timeMax=[^&]+&singleEvents=true&orderBy=startTime$".into(),
        ))
        .with_status(200)
        .with_body(
            json!({
                "items": [
                    timed("a", "2024-03-15T09:00:00Z", "2024-03-15T09:00:00Z"),
                    timed("b", "2024-03-15T10:00:00Z", "2024-03-15T10:30:00Z")
                ],
                "nextPageToken": "p2"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let second = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
        .with_status(200)
        .with_body(
            json!({"items": [timed("c", "2024-03-15T11:00:00Z", "2024-03-15T10:55:00Z")]})
                .to_string(),
        )
        .create_async()
        .await;

    let calendar = calendar_with_token(&server, &dir, fresh_token());
    let events = CalendarPager::new(&calendar, "primary")
        .collect_all(&RunContext::unbounded())
        .await
        .unwrap();

    let ids: Vec<_> = events.iter().map(|e| e.id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn cleanup_deletes_only_instant_events() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    let _list = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"items": [
                {"id": "allday", "start": {"date": "2024-03-15"}, "end": {"date": "2024-03-16"}},
                timed("thirty", "2024-03-15T10:00:00Z", "2024-03-15T10:30:00Z"),
                timed("zero", "2024-03-15T11:00:00Z", "2024-03-15T11:00:00Z"),
                timed("negative", "2024-03-15T12:00:00Z", "2024-03-15T11:55:00Z")
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let delete_zero = server
        .mock("DELETE", "/calendars/primary/events/zero")
        .match_header("authorization", "Bearer tok")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let delete_negative = server
        .mock("DELETE", "/calendars/primary/events/negative")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let delete_other = server
        .mock("DELETE", Matcher::Regex("/events/(allday|thirty)$".into()))
        .expect(0)
        .create_async()
        .await;

    let calendar = calendar_with_token(&server, &dir, fresh_token());
    let ctx = RunContext::unbounded();
    let events = CalendarPager::new(&calendar, "primary")
        .collect_all(&ctx)
        .await
        .unwrap();
    let outcome = filter_instant_events(events);
    assert_eq!(outcome.skipped_all_day, 1);

    let report = EventDeleter::new(&calendar, "primary")
        .delete_all(&outcome.eligible, &ctx)
        .await;

    assert_eq!(report.deleted, vec!["zero", "negative"]);
    assert!(report.is_complete());
    delete_zero.assert_async().await;
    delete_negative.assert_async().await;
    delete_other.assert_async().await;
}

#[tokio::test]
async fn delete_statuses() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    let _gone = server
        .mock("DELETE", "/calendars/primary/events/gone")
        .with_status(410)
        .create_async()
        .await;
    let _missing = server
        .mock("DELETE", "/calendars/primary/events/missing")
        .with_status(404)
        .create_async()
        .await;
    let _limited = server
        .mock("DELETE", "/calendars/primary/events/busy")
        .with_status(429)
        .with_header("Retry-After", "30")
        .create_async()
        .await;
    let _forbidden = server
        .mock("DELETE", "/calendars/primary/events/theirs")
        .with_status(403)
        .create_async()
        .await;

    let calendar = calendar_with_token(&server, &dir, fresh_token());

    assert!(calendar.delete_event("primary", "gone").await.is_ok());

    let err = calendar.delete_event("primary", "missing").await.unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::NotFound);

    let err = calendar.delete_event("primary", "busy").await.unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::RateLimited);
    assert!(err.message().contains("30 seconds"));

    let err = calendar.delete_event("primary", "theirs").await.unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
}

#[tokio::test]
async fn expired_token_is_refreshed_and_persisted() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    let refresh = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh".into()),
            Matcher::UrlEncoded("client_id".into(), "id".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token": "fresh", "expires_in": 3599, "token_type": "Bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body(r#"{"items": []}"#)
        .expect(2)
        .create_async()
        .await;

    let mut expired = fresh_token();
    expired.expires_at = Some(Utc::now() - chrono::Duration::minutes(5));
    let calendar = calendar_with_token(&server, &dir, expired);

    let query = ListQuery::new("primary", Utc::now());
    calendar.list_events_page(&query).await.unwrap();
    // second call reuses the refreshed token
    calendar.list_events_page(&query).await.unwrap();

    refresh.assert_async().await;
    list.assert_async().await;

    let cached = TokenStorage::new(dir.path().join("tokens.json"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(cached.access_token, "fresh");
    assert_eq!(cached.refresh_token.as_deref(), Some("refresh"));
}

#[tokio::test]
async fn rejected_refresh_is_an_authentication_error() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    let _refresh = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#)
        .create_async()
        .await;

    let mut expired = fresh_token();
    expired.expires_at = Some(Utc::now() - chrono::Duration::minutes(5));
    let calendar = calendar_with_token(&server, &dir, expired);

    let err = calendar
        .list_events_page(&ListQuery::new("primary", Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
}
