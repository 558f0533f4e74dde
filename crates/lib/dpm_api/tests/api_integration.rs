//! Integration tests: build the router over seeded in-memory state and drive
//! it with `oneshot`.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use dpm_api::{AppState, config::ApiConfig};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    dpm_api::router(AppState::new(ApiConfig::for_tests()))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, headers, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, req).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, json) = send_json(
        app,
        request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": username, "password": password})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login as {username}: {json}");
    json["accessToken"].as_str().expect("accessToken").to_string()
}

fn names(page: &Value, key: &str) -> Vec<String> {
    page["content"]
        .as_array()
        .expect("content array")
        .iter()
        .map(|row| row[key].as_str().unwrap_or_default().to_string())
        .collect()
}

fn first_code(errors: &Value) -> &str {
    errors[0]["code"].as_str().expect("error code")
}

async fn id_of(app: &Router, token: &str, path: &str, key: &str, name: &str) -> i64 {
    let (_, page) = send_json(app, request(Method::GET, path, Some(token), None)).await;
    page["content"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row[key] == name)
        .and_then(|row| row["id"].as_i64())
        .unwrap_or_else(|| panic!("{name} not found under {path}"))
}

#[tokio::test]
async fn login_sets_jwt_cookie_and_returns_token() {
    let app = app();
    let (status, headers, body) = send(
        &app,
        request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": "unity-admin", "password": "password"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie");
    assert!(cookie.starts_with("JWT="), "unexpected cookie: {cookie}");

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["username"], "unity-admin@test.test");
    assert_eq!(json["tokenType"], "Bearer");
    assert!(json["roles"].as_array().unwrap().contains(&json!("ADMIN")));
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = app();
    let (status, errors) = send_json(
        &app,
        request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": "unity-admin", "password": "nope"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_code(&errors), "unauthorized");
    assert!(errors[0]["id"].is_string());
}

#[tokio::test]
async fn token_info_without_session_is_no_content() {
    let app = app();
    let (status, _, body) = send(&app, request(Method::GET, "/api/token_info", None, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn token_info_reports_roles_and_group_permissions() {
    let app = app();
    let admin = login(&app, "unity-admin", "password").await;
    let (status, info) =
        send_json(&app, request(Method::GET, "/api/token_info", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["active"], true);
    assert_eq!(info["roles"][0], "ADMIN");
    assert!(info.get("isAdmin").is_none());

    let member = login(&app, "kstanley@test.test", "password").await;
    let (_, info) =
        send_json(&app, request(Method::GET, "/api/token_info", Some(&member), None)).await;
    assert!(!info["roles"].as_array().unwrap().contains(&json!("ADMIN")));
    assert_eq!(info["permissionsByGroup"][0]["groupName"], "Alpha");
    assert_eq!(info["permissionsByGroup"][0]["isApplicationAdmin"], true);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = app();
    let (status, errors) = send_json(&app, request(Method::GET, "/api/groups", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_code(&errors), "unauthorized");
}

#[tokio::test]
async fn jwt_cookie_authenticates() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let req = Request::builder()
        .uri("/api/groups")
        .header(header::COOKIE, format!("JWT={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, page) = send_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalSize"], 4);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let (status, headers, _) =
        send(&app, request(Method::GET, "/api/logout", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let (status, _) =
        send_json(&app, request(Method::GET, "/api/groups", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) =
        send(&app, request(Method::GET, "/api/token_info", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn admin_creates_lists_and_rejects_duplicate_group() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let draft = json!({"name": "Test Group", "description": "created in a test"});
    let (status, group) =
        send_json(&app, request(Method::POST, "/api/groups", Some(&token), Some(draft.clone())))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["name"], "Test Group");

    let (_, page) = send_json(&app, request(Method::GET, "/api/groups", Some(&token), None)).await;
    assert!(names(&page, "name").contains(&"Test Group".to_string()));

    let (status, errors) =
        send_json(&app, request(Method::POST, "/api/groups", Some(&token), Some(draft))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_code(&errors), "group.exists");
}

#[tokio::test]
async fn short_names_are_rejected_with_codes() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let (status, errors) = send_json(
        &app,
        request(
            Method::POST,
            "/api/applications",
            Some(&token),
            Some(json!({"name": "ab", "group": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        first_code(&errors),
        "application.name.cannot-be-less-than-three-characters"
    );
}

#[tokio::test]
async fn members_only_see_their_groups() {
    let app = app();
    let token = login(&app, "kstanley", "password").await;
    let (_, page) = send_json(&app, request(Method::GET, "/api/groups", Some(&token), None)).await;
    assert_eq!(names(&page, "name"), vec!["Alpha"]);

    let (_, page) =
        send_json(&app, request(Method::GET, "/api/applications", Some(&token), None)).await;
    assert_eq!(names(&page, "name"), vec!["Application One"]);

    let (status, _) = send_json(
        &app,
        request(Method::GET, "/api/super-users", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn group_admin_flags_gate_mutations() {
    let app = app();
    let admin = login(&app, "unity-admin", "password").await;
    let alpha = id_of(&app, &admin, "/api/groups", "name", "Alpha").await;
    let beta = id_of(&app, &admin, "/api/groups", "name", "Beta").await;

    let member = login(&app, "kstanley", "password").await;
    let (status, _) = send_json(
        &app,
        request(
            Method::POST,
            "/api/groups",
            Some(&member),
            Some(json!({"name": "Not Allowed"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, app_json) = send_json(
        &app,
        request(
            Method::POST,
            "/api/applications",
            Some(&member),
            Some(json!({"name": "Member App", "group": alpha})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app_json["groupName"], "Alpha");

    let (status, _) = send_json(
        &app,
        request(
            Method::POST,
            "/api/applications",
            Some(&member),
            Some(json!({"name": "Member App", "group": beta})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn filter_is_case_insensitive_substring() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let (_, page) = send_json(
        &app,
        request(Method::GET, "/api/applications?filter=TWO", Some(&token), None),
    )
    .await;
    assert_eq!(names(&page, "name"), vec!["Application Two"]);

    let (_, page) = send_json(
        &app,
        request(Method::GET, "/api/users?filter=kstan", Some(&token), None),
    )
    .await;
    assert_eq!(names(&page, "email"), vec!["kstanley@test.test"]);
}

#[tokio::test]
async fn topic_kinds_are_listed() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let (status, kinds) =
        send_json(&app, request(Method::GET, "/api/topics/kinds", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kinds, json!(["B", "C"]));
}

#[tokio::test]
async fn search_returns_public_entities_to_any_session() {
    let app = app();
    let (status, _) = send_json(&app, request(Method::GET, "/api/search", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = login(&app, "unity-admin", "password").await;
    for (name, public) in [("Open Lab", true), ("Closed Lab", false)] {
        let (status, _) = send_json(
            &app,
            request(
                Method::POST,
                "/api/groups",
                Some(&admin),
                Some(json!({"name": name, "isPublic": public})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let member = login(&app, "kstanley@test.test", "password").await;
    let (status, page) = send_json(
        &app,
        request(
            Method::GET,
            "/api/search?query=LAB&groups=true",
            Some(&member),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalSize"], 1);
    assert_eq!(page["content"][0]["type"], "GROUP");
    assert_eq!(page["content"][0]["entity"]["name"], "Open Lab");

    let (_, page) = send_json(
        &app,
        request(
            Method::GET,
            "/api/search?query=lab&topics=true",
            Some(&member),
            None,
        ),
    )
    .await;
    assert_eq!(page["totalSize"], 0);
}

#[tokio::test]
async fn rotated_bind_token_invalidates_the_previous_one() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let application = id_of(&app, &token, "/api/applications", "name", "Application One").await;
    let topic = id_of(&app, &token, "/api/topics", "name", "Test Topic 123").await;

    let bind_uri = format!("/api/applications/{application}/bind-token");
    let (_, _, first) = send(&app, request(Method::POST, &bind_uri, Some(&token), None)).await;
    let (_, _, second) = send(&app, request(Method::POST, &bind_uri, Some(&token), None)).await;
    let (first, second) = (String::from_utf8(first).unwrap(), String::from_utf8(second).unwrap());
    assert_ne!(first, second);

    let grant = |bind_token: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/api/application_permissions/{topic}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("APPLICATION_BIND_TOKEN", bind_token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"read": true, "write": false}).to_string()))
            .unwrap()
    };
    let (status, errors) = send_json(&app, grant(&first)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_code(&errors), "application.bind-token.invalid");

    let (status, permission) = send_json(&app, grant(&second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(permission["applicationName"], "Application One");
    assert_eq!(permission["read"], true);

    let (_, page) = send_json(
        &app,
        request(
            Method::GET,
            &format!("/api/application_permissions/topic/{topic}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(page["totalSize"], 1);
}

#[tokio::test]
async fn generated_password_lets_the_application_log_in() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let application = id_of(&app, &token, "/api/applications", "name", "Application Two").await;
    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/applications/{application}/password"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let passphrase = String::from_utf8(body).unwrap();

    let (status, json) = send_json(
        &app,
        request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": application.to_string(), "password": passphrase})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "Application Two");
    assert_eq!(json["roles"], json!(["APPLICATION"]));
}

#[tokio::test]
async fn membership_flag_toggle_persists() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let (_, page) = send_json(
        &app,
        request(Method::GET, "/api/users?filter=jgilbert", Some(&token), None),
    )
    .await;
    let row = page["content"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["groupName"] == "Alpha")
        .cloned()
        .unwrap();
    assert_eq!(row["isTopicAdmin"], false);
    let id = row["id"].as_i64().unwrap();

    let mut draft = row.clone();
    draft["isTopicAdmin"] = json!(true);
    let (status, _) = send_json(
        &app,
        request(Method::PUT, &format!("/api/users/{id}"), Some(&token), Some(draft)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, user) =
        send_json(&app, request(Method::GET, &format!("/api/users/{id}"), Some(&token), None))
            .await;
    assert_eq!(user["isTopicAdmin"], true);
}

#[tokio::test]
async fn deleted_entities_are_not_found() {
    let app = app();
    let token = login(&app, "unity-admin", "password").await;
    let topic = id_of(&app, &token, "/api/topics", "name", "Test Topic 456").await;
    let uri = format!("/api/topics/{topic}");

    let (status, _, _) = send(&app, request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, errors) = send_json(&app, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_code(&errors), "topic.not-found");

    let (status, _) = send_json(&app, request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
