//! End-to-end tests: serve the reference backend on an ephemeral port and
//! drive it with the real client.

use std::time::Duration;

use axum::Json;
use axum::routing::get;
use dpm_api::{AppState, config::ApiConfig};
use dpm_api_client::{
    Applications, Client, ClientConfig, ClientError, Groups, ListView, RefreshOutcome,
};
use dpm_core::display::flag_mark;
use dpm_core::{EntityKind, SessionContext};
use dpm_core::group_context::{GroupContext, GroupRef};
use dpm_core::models::{
    AccessPermissionBody, ApplicationDraft, GroupDraft, SearchRequest, SuperUserDraft, TopicDraft,
    UserDraft,
};
use serde_json::json;

async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn spawn_backend() -> String {
    serve(dpm_api::router(AppState::new(ApiConfig::for_tests()))).await
}

fn client_for(base_url: &str) -> Client {
    Client::new(
        ClientConfig::new(base_url).expect("config"),
        SessionContext::new(),
    )
    .expect("client")
}

async fn logged_in(base_url: &str, username: &str) -> Client {
    let client = client_for(base_url);
    client.login(username, "password").await.expect("login");
    client
}

async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

async fn group_ref(client: &Client, name: &str) -> GroupRef {
    let groups = client.groups().list(Some(name)).await.expect("groups");
    let group = groups
        .iter()
        .find(|g| g.name == name)
        .unwrap_or_else(|| panic!("group {name}"));
    GroupRef::from(group)
}

#[tokio::test]
async fn login_populates_the_session_and_logout_clears_it() {
    let url = spawn_backend().await;
    let client = client_for(&url);
    assert!(!client.session().is_authenticated());

    let profile = client.login("unity-admin", "password").await.unwrap();
    assert_eq!(profile.name, "unity-admin@test.test");
    assert!(client.session().is_authenticated());
    assert!(client.session().is_admin());
    assert!(client.session().state().show_super_user_tab());

    client.logout().await.unwrap();
    assert!(!client.session().is_authenticated());
    assert!(!client.session().is_admin());
    assert!(client.token().await.is_none());
}

#[tokio::test]
async fn group_member_is_authenticated_but_not_admin() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "kstanley@test.test").await;
    assert!(client.session().is_authenticated());
    assert!(!client.session().is_admin());
    let profile = client.session().profile().unwrap();
    assert_eq!(profile.permissions_by_group[0].group_name, "Alpha");
}

#[tokio::test]
async fn legacy_is_admin_payload_still_yields_admin() {
    let router = axum::Router::new().route(
        "/api/token_info",
        get(|| async { Json(json!({"active": true, "username": "legacy-admin", "isAdmin": true})) }),
    );
    let url = serve(router).await;
    let client = client_for(&url);
    let profile = client.refresh_session().await.unwrap().expect("profile");
    assert!(profile.is_admin());
    assert!(client.session().is_authenticated());
    assert!(client.session().is_admin());
}

#[tokio::test]
async fn no_session_means_logged_out() {
    let url = spawn_backend().await;
    let client = client_for(&url);
    assert!(client.refresh_session().await.unwrap().is_none());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn bad_credentials_are_an_auth_error() {
    let url = spawn_backend().await;
    let client = client_for(&url);
    let err = client.login("unity-admin", "wrong").await.unwrap_err();
    assert!(err.is_auth());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn created_group_appears_and_deleted_group_disappears() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;

    let group = client
        .groups()
        .create(&GroupDraft::named("Test Group"))
        .await
        .unwrap();
    let names: Vec<String> = client
        .groups()
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert!(names.contains(&"Test Group".to_string()));

    client.groups().delete(group.id).await.unwrap();
    let names: Vec<String> = client
        .groups()
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert!(!names.contains(&"Test Group".to_string()));

    let err = client.groups().show(group.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(err.codes(), ["group.not-found".to_string()]);
    let err = client.groups().delete(group.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn list_reads_past_the_first_page() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;

    for n in 0..105 {
        client
            .groups()
            .create(&GroupDraft::named(format!("Bulk {n:03}")))
            .await
            .unwrap();
    }
    client
        .groups()
        .create(&GroupDraft::named("Zulu Group"))
        .await
        .unwrap();

    let groups = client.groups().list(None).await.unwrap();
    assert!(groups.len() >= 106);
    assert!(groups.iter().any(|g| g.name == "Zulu Group"));

    let bulk = client.groups().list(Some("bulk")).await.unwrap();
    assert_eq!(bulk.len(), 105);
}

#[tokio::test]
async fn search_spans_kinds_and_pages() {
    let url = spawn_backend().await;
    let admin = logged_in(&url, "unity-admin").await;
    let lab = admin
        .groups()
        .create(&GroupDraft {
            is_public: true,
            ..GroupDraft::named("Open Lab")
        })
        .await
        .unwrap();
    let mut context = GroupContext::default();
    context.focus().unwrap();
    context.choose(GroupRef::from(&lab)).unwrap();
    for n in 0..3 {
        admin
            .applications()
            .create_in(
                &context,
                &ApplicationDraft {
                    is_public: true,
                    description: Some("lab instrument".into()),
                    ..ApplicationDraft::named(format!("Sample Rig {n}"))
                },
            )
            .await
            .unwrap();
    }

    let member = logged_in(&url, "kstanley@test.test").await;
    let request = SearchRequest {
        size: Some(2),
        ..SearchRequest::new(Some("lab"))
    };
    let hits = member.search(&request).await.unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].kind(), EntityKind::Group);
    assert!(hits[1..].iter().all(|h| h.kind() == EntityKind::Application));

    let only_groups = member
        .search(&SearchRequest::new(Some("lab")).only(&[EntityKind::Group]))
        .await
        .unwrap();
    assert_eq!(only_groups.len(), 1);
    assert_eq!(only_groups[0].id(), lab.id);
}

#[tokio::test]
async fn duplicate_and_invalid_drafts_are_validation_errors() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;

    let err = client
        .groups()
        .create(&GroupDraft::named("Alpha"))
        .await
        .unwrap_err();
    assert_eq!(err.codes(), ["group.exists".to_string()]);

    let err = client
        .super_users()
        .create(&SuperUserDraft {
            email: "not-an-email".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.codes(), ["email.is-not-format".to_string()]);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn group_scoped_create_needs_a_selected_group() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;
    let mut context = GroupContext::default();

    let err = client
        .topics()
        .create_in(&context, &TopicDraft::named("Test Topic"))
        .await
        .unwrap_err();
    assert_eq!(err.codes(), ["group-context.required".to_string()]);

    context.focus().unwrap();
    context.type_query("gam").unwrap();
    let groups = client.groups().list(None).await.unwrap();
    let candidates = context.candidates(&groups);
    assert_eq!(candidates.len(), 1);
    context.choose(GroupRef::from(candidates[0])).unwrap();
    assert!(context.can_create());

    let topic = client
        .topics()
        .create_in(&context, &TopicDraft::named("Test Topic"))
        .await
        .unwrap();
    assert_eq!(topic.group_name, "Gamma");
    assert_eq!(topic.canonical_name, format!("{}.Test Topic", topic.group));

    let in_gamma = client
        .topics()
        .list_in(topic.group, None)
        .await
        .unwrap();
    assert_eq!(in_gamma.len(), 1);
}

#[tokio::test]
async fn application_filter_is_case_insensitive_and_stateless() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;
    let mut context = GroupContext::default();
    context.focus().unwrap();
    context.choose(group_ref(&client, "Alpha").await).unwrap();
    client
        .applications()
        .create_in(&context, &ApplicationDraft::named("Network Tool"))
        .await
        .unwrap();

    let mut view: ListView<Applications> = ListView::new();
    assert!(matches!(
        view.search(&client, "one").await,
        RefreshOutcome::Updated(1)
    ));
    assert!(matches!(
        view.search(&client, "two").await,
        RefreshOutcome::Updated(2)
    ));
    let names: Vec<&str> = view.rows().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Application Two", "Network Tool"]);

    let direct: Vec<String> = client
        .applications()
        .list(Some("TWO"))
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(direct, names);
}

#[tokio::test]
async fn rotating_the_bind_token_invalidates_the_old_one() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;
    let app = client.applications().list(Some("Application One")).await.unwrap()[0].id;
    let topic = client.topics().list(Some("Test Topic 123")).await.unwrap()[0].id;

    let first = client.applications().generate_bind_token(app).await.unwrap();
    let second = client.applications().generate_bind_token(app).await.unwrap();
    assert_ne!(first, second);

    let access = AccessPermissionBody {
        read_partitions: ["sensors".to_string()].into(),
        ..AccessPermissionBody::new(true, true)
    };
    let err = client
        .application_permissions()
        .add_application_to_topic(topic, &first, &access)
        .await
        .unwrap_err();
    assert_eq!(err.codes(), ["application.bind-token.invalid".to_string()]);

    let permission = client
        .application_permissions()
        .add_application_to_topic(topic, &second, &access)
        .await
        .unwrap();
    assert_eq!(permission.topic_name, "Test Topic 123");
    assert!(permission.read_partitions.contains("sensors"));
    assert!(permission.write_partitions.is_empty());

    let narrowed = AccessPermissionBody {
        write_partitions: ["ops".to_string()].into(),
        ..AccessPermissionBody::new(false, true)
    };
    let permission = client
        .application_permissions()
        .update(permission.id, &narrowed)
        .await
        .unwrap();
    assert!(!permission.read);
    assert!(permission.read_partitions.is_empty());
    assert!(permission.write_partitions.contains("ops"));

    let by_app = client
        .application_permissions()
        .by_application(app)
        .await
        .unwrap();
    assert_eq!(by_app.total_size, 1);

    client
        .application_permissions()
        .remove(permission.id)
        .await
        .unwrap();
    assert!(
        client
            .application_permissions()
            .by_topic(topic)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn generated_password_logs_the_application_in() {
    let url = spawn_backend().await;
    let admin = logged_in(&url, "unity-admin").await;
    let app = admin.applications().list(Some("Application Two")).await.unwrap()[0].id;
    let first = admin.applications().generate_password(app).await.unwrap();
    let second = admin.applications().generate_password(app).await.unwrap();
    assert_ne!(first, second);

    let application = client_for(&url);
    assert!(application.login(&app.to_string(), &first).await.is_err());
    let profile = application.login(&app.to_string(), &second).await.unwrap();
    assert_eq!(profile.name, "Application Two");
    assert!(!profile.is_admin());
}

#[tokio::test]
async fn toggled_admin_flag_persists() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;
    let user = client
        .users()
        .list(Some("jgilbert"))
        .await
        .unwrap()
        .into_iter()
        .find(|u| u.group_name == "Beta")
        .unwrap();
    assert_eq!(flag_mark(user.is_application_admin), "-");

    let draft = UserDraft {
        is_application_admin: true,
        ..UserDraft::from(&user)
    };
    client.users().update(user.id, &draft).await.unwrap();

    let refetched = client.users().show(user.id).await.unwrap();
    assert_eq!(flag_mark(refetched.is_application_admin), "✓");
}

#[tokio::test]
async fn rejected_session_clears_the_context() {
    let url = spawn_backend().await;
    let first = logged_in(&url, "unity-admin").await;
    let second = client_for(&url);
    second.set_token(first.token().await).await;
    second.refresh_session().await.unwrap();
    assert!(second.session().is_authenticated());

    first.logout().await.unwrap();

    let err = second.groups().list(None).await.unwrap_err();
    assert!(err.is_auth());
    assert!(!second.session().is_authenticated());
}

#[tokio::test]
async fn refused_action_keeps_the_session() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "kstanley@test.test").await;

    let err = client
        .super_users()
        .create(&SuperUserDraft {
            email: "x@test.test".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)));
    assert!(!err.is_auth());
    assert!(client.session().is_authenticated());
    assert!(client.token().await.is_some());

    assert!(client.groups().list(None).await.is_ok());
}

#[tokio::test]
async fn failed_refresh_keeps_the_last_good_rows() {
    let url = spawn_backend().await;
    let client = logged_in(&url, "unity-admin").await;
    let mut view: ListView<Groups> = ListView::new();
    assert!(matches!(
        view.refresh(&client).await,
        RefreshOutcome::Updated(4)
    ));

    let offline = client_for(&dead_url().await);
    let outcome = view.refresh(&offline).await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Failed(ClientError::Network(_))
    ));
    assert_eq!(view.rows().len(), 4);
    assert!(view.notice().is_some());

    assert!(matches!(
        view.refresh(&client).await,
        RefreshOutcome::Updated(4)
    ));
    assert!(view.notice().is_none());
}

#[tokio::test]
async fn unmounted_view_discards_the_response() {
    let router = axum::Router::new().route(
        "/api/groups",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({"content": [], "totalSize": 0, "pageNumber": 0, "size": 100}))
        }),
    );
    let url = serve(router).await;
    let client = client_for(&url);
    let mut view: ListView<Groups> = ListView::new();

    let unmount = view.unmount_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        unmount.cancel();
    });
    assert!(matches!(
        view.refresh(&client).await,
        RefreshOutcome::Discarded
    ));
    assert!(!view.is_mounted());
    assert!(view.rows().is_empty());
    assert!(view.notice().is_none());
}
