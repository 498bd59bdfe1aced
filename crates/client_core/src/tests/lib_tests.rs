use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, State},
    http::{HeaderMap as AxumHeaders, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use shared::domain::InstanceType;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    sessions_view::{SessionDialog, SessionsView},
    AuthContext,
};

const DEFAULT_INSTANCE: &str = "partner-demo.lacework.net";

#[derive(Clone, Default)]
struct ServerState {
    sessions: Arc<Mutex<Vec<Session>>>,
    upserts: Arc<Mutex<Vec<SessionUpsert>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    registrations: Arc<Mutex<Vec<(String, Registration)>>>,
}

fn expires() -> DateTime<Utc> {
    "2025-06-01T00:00:00Z".parse().expect("timestamp")
}

fn stored(name: &str) -> Session {
    Session {
        name: name.to_string(),
        instance_type: InstanceType::Default,
        url: String::new(),
        sub_account: String::new(),
        access_key_id: String::new(),
        secret_key: String::new(),
        user_group: shared::domain::DEFAULT_USER_GROUP.to_string(),
        created_by: "lead@example.com".to_string(),
        updated_by: String::new(),
        created_at: None,
        updated_at: None,
        expires_at: expires(),
        reg_count: 0,
    }
}

fn error(status: StatusCode, message: &str) -> AxumResponse {
    (status, Json(serde_json::json!({ "message": message, "error": {} }))).into_response()
}

async fn list_sessions(State(state): State<ServerState>) -> Json<Vec<Session>> {
    Json(state.sessions.lock().await.clone())
}

async fn create_session(
    State(state): State<ServerState>,
    Json(body): Json<SessionUpsert>,
) -> AxumResponse {
    let mut sessions = state.sessions.lock().await;
    if sessions.iter().any(|s| s.name == body.name) {
        return error(StatusCode::BAD_REQUEST, "name taken");
    }
    let mut session = stored(&body.name);
    session.instance_type = body.instance_type;
    session.user_group = body.user_group.clone();
    session.created_by = body.created_by.clone().unwrap_or_default();
    sessions.push(session);
    state.upserts.lock().await.push(body);
    StatusCode::CREATED.into_response()
}

async fn delete_sessions(
    State(state): State<ServerState>,
    Json(body): Json<DeleteSessionsRequest>,
) -> AxumResponse {
    let mut sessions = state.sessions.lock().await;
    if body.sessions.iter().any(|name| name == "locked") {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "cannot delete locked");
    }
    sessions.retain(|s| !body.sessions.contains(&s.name));
    state.deleted.lock().await.extend(body.sessions);
    StatusCode::OK.into_response()
}

async fn session_by_name(Path(name): Path<String>) -> AxumResponse {
    if name == "defaultinstance" {
        return format!("{DEFAULT_INSTANCE}\n").into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn update_session(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    Json(body): Json<SessionUpsert>,
) -> AxumResponse {
    let mut sessions = state.sessions.lock().await;
    let Some(session) = sessions.iter_mut().find(|s| s.name == name) else {
        return error(StatusCode::NOT_FOUND, "session not found");
    };
    session.user_group = body.user_group.clone();
    session.updated_by = body.updated_by.clone().unwrap_or_default();
    state.upserts.lock().await.push(body);
    StatusCode::OK.into_response()
}

async fn register(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    Json(body): Json<Registration>,
) -> AxumResponse {
    if !state.sessions.lock().await.iter().any(|s| s.name == name) {
        return error(StatusCode::BAD_REQUEST, "session has expired");
    }
    state.registrations.lock().await.push((name, body));
    StatusCode::CREATED.into_response()
}

async fn userinfo(headers: AxumHeaders) -> AxumResponse {
    let signed_in = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("_oauth2_proxy="));
    if signed_in {
        Json(serde_json::json!({ "email": "ops@example.com", "user": "ops" })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn plain_failure() -> AxumResponse {
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}

async fn spawn_api_server(state: ServerState) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route(
            "/api/sessions/",
            get(list_sessions)
                .post(create_session)
                .delete(delete_sessions),
        )
        .route(
            "/api/sessions/:name",
            get(session_by_name).put(update_session),
        )
        .route("/api/register/:name", post(register))
        .route("/oauth2/userinfo", get(userinfo))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(api_url: String, auth_cookie: Option<&str>) -> EventEngineClient {
    let settings = ClientSettings {
        api_url,
        auth_cookie: auth_cookie.map(str::to_string),
        request_timeout_secs: 5,
        ..ClientSettings::default()
    };
    EventEngineClient::new(&settings).expect("client")
}

fn seeded(names: &[&str]) -> ServerState {
    let state = ServerState::default();
    state
        .sessions
        .try_lock()
        .expect("fresh state")
        .extend(names.iter().map(|name| stored(name)));
    state
}

fn signed_in() -> AuthContext {
    AuthContext::with_user(shared::domain::AuthenticatedUser {
        email: "ops@example.com".to_string(),
    })
}

#[tokio::test]
async fn lists_sessions_and_default_instance() {
    let url = spawn_api_server(seeded(&["summit", "reinvent"])).await;
    let client = client_for(url, None);

    let sessions = client.list_sessions().await.expect("list");
    let names: Vec<_> = sessions.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["summit", "reinvent"]);

    let default = client.default_instance().await.expect("default instance");
    assert_eq!(default.as_deref(), Some(DEFAULT_INSTANCE));
}

#[tokio::test]
async fn create_failure_keeps_add_dialog_open_with_server_message() {
    let state = seeded(&["taken"]);
    let url = spawn_api_server(state.clone()).await;
    let client = client_for(url, None);
    let auth = signed_in();

    let mut view = SessionsView::new(5, expires()).expect("view");
    let load = view.load();
    view.apply(execute(&client, load).await);

    view.launch_add(expires());
    view.edit_form(crate::form::SessionEdit::Name("taken".into()))
        .expect("valid name");
    let command = view.confirm(&auth).expect("create command");
    view.apply(execute(&client, command).await);

    assert_eq!(view.dialog(), Some(SessionDialog::Add));
    let modal = view.error().expect("error modal");
    assert_eq!(modal.message, "name taken");
    assert_eq!(view.form().fields().name, "taken");
    assert!(state.upserts.lock().await.is_empty());

    assert_eq!(view.dismiss_error(), None);
    assert_eq!(view.dialog(), Some(SessionDialog::Add));
}

#[tokio::test]
async fn create_success_refetches_and_resets_form() {
    let state = seeded(&["summit"]);
    let url = spawn_api_server(state.clone()).await;
    let client = client_for(url, None);
    let auth = signed_in();

    let mut view = SessionsView::new(5, expires()).expect("view");
    view.launch_add(expires());
    view.edit_form(crate::form::SessionEdit::Name("kubecon".into()))
        .expect("valid name");
    let command = view.confirm(&auth).expect("create command");
    view.apply(execute(&client, command).await);

    assert_eq!(view.dialog(), None);
    assert!(view.error().is_none());
    assert!(view.form().fields().name.is_empty());
    assert_eq!(view.table().rows().len(), 2);

    let upserts = state.upserts.lock().await;
    assert_eq!(upserts[0].created_by.as_deref(), Some("ops@example.com"));
    assert_eq!(upserts[0].updated_by, None);
}

#[tokio::test]
async fn update_targets_original_name_with_updater() {
    let state = seeded(&["summit"]);
    let url = spawn_api_server(state.clone()).await;
    let client = client_for(url, None);

    let mut view = SessionsView::new(5, expires()).expect("view");
    view.apply(execute(&client, ApiCommand::ListSessions).await);
    view.toggle_row("summit");
    assert!(view.launch_edit());
    view.edit_form(crate::form::SessionEdit::UserGroup(
        "LACEWORK_USER_GROUP_POWER_USER".into(),
    ))
    .expect("group");

    let command = view.confirm(&signed_in()).expect("update command");
    assert!(matches!(&command, ApiCommand::UpdateSession { name, .. } if name == "summit"));
    view.apply(execute(&client, command).await);

    assert_eq!(view.dialog(), None);
    let row = view.table().find("summit").expect("row");
    assert_eq!(row.user_group, "LACEWORK_USER_GROUP_POWER_USER");
    assert_eq!(row.updated_by, "ops@example.com");
}

#[tokio::test]
async fn bulk_delete_sends_selected_names() {
    let state = seeded(&["a_one", "b_two", "c_three"]);
    let url = spawn_api_server(state.clone()).await;
    let client = client_for(url, None);

    let mut view = SessionsView::new(5, expires()).expect("view");
    view.apply(execute(&client, ApiCommand::ListSessions).await);
    view.toggle_row("a_one");
    view.toggle_row("c_three");
    assert!(view.launch_delete());

    let command = view.confirm(&signed_in()).expect("delete command");
    view.apply(execute(&client, command).await);

    assert_eq!(*state.deleted.lock().await, ["a_one", "c_three"]);
    assert_eq!(view.table().rows().len(), 1);
    assert!(view.table().selection().is_empty());
    assert_eq!(view.dialog(), None);
}

#[tokio::test]
async fn failed_delete_dismissal_reloads_and_closes_dialog() {
    let state = seeded(&["locked", "open"]);
    let url = spawn_api_server(state).await;
    let client = client_for(url, None);

    let mut view = SessionsView::new(5, expires()).expect("view");
    view.apply(execute(&client, ApiCommand::ListSessions).await);
    view.set_all_selected(true);
    assert!(view.launch_delete());
    let command = view.confirm(&signed_in()).expect("delete command");
    view.apply(execute(&client, command).await);

    assert_eq!(
        view.error().map(|e| e.message.as_str()),
        Some("cannot delete locked")
    );
    assert_eq!(view.dialog(), Some(SessionDialog::ConfirmDelete));

    let reload = view.dismiss_error().expect("reload command");
    assert_eq!(reload, ApiCommand::ListSessions);
    assert_eq!(view.dialog(), None);
    view.apply(execute(&client, reload).await);
    assert_eq!(view.table().rows().len(), 2);
}

#[tokio::test]
async fn register_surfaces_server_message() {
    let state = seeded(&["summit"]);
    let url = spawn_api_server(state.clone()).await;
    let client = client_for(url, None);
    let registration = Registration {
        email: "ada@example.com".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        company: "Engines".into(),
    };

    client
        .register("summit", &registration)
        .await
        .expect("registered");
    assert_eq!(state.registrations.lock().await[0].1, registration);

    let err = client
        .register("gone", &registration)
        .await
        .expect_err("expired session");
    assert_eq!(err.user_message(), "session has expired");
}

#[tokio::test]
async fn userinfo_reflects_proxy_cookie() {
    let url = spawn_api_server(ServerState::default()).await;

    let anonymous = client_for(url.clone(), None);
    assert_eq!(anonymous.current_user().await.expect("userinfo"), None);

    let cookie = client_for(url, Some("_oauth2_proxy=abc123"));
    let user = cookie.current_user().await.expect("userinfo");
    assert_eq!(user.map(|u| u.email), Some("ops@example.com".to_string()));
}

#[tokio::test]
async fn non_json_error_falls_back_to_status_text() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route("/api/sessions/", get(plain_failure));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = client_for(format!("http://{addr}"), None);
    let err = client.list_sessions().await.expect_err("bad gateway");
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.status, 502);
            assert!(api.message.starts_with("request failed with status 502"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn endpoint_keeps_base_path_and_trailing_slash() {
    let settings = ClientSettings {
        api_url: "https://ee.example.com/backend".into(),
        ..ClientSettings::default()
    };
    let client = EventEngineClient::new(&settings).expect("client");
    assert_eq!(
        client.endpoint(&["api", "sessions", ""]).as_str(),
        "https://ee.example.com/backend/api/sessions/"
    );
    assert_eq!(
        client.endpoint(&["api", "register", "summit"]).as_str(),
        "https://ee.example.com/backend/api/register/summit"
    );
}

#[test]
fn rejects_unusable_api_url() {
    let settings = ClientSettings {
        api_url: "mailto:ops@example.com".into(),
        ..ClientSettings::default()
    };
    assert!(matches!(
        EventEngineClient::new(&settings),
        Err(ClientError::Config(_))
    ));
}
