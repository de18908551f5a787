/// End-to-end tests driving the full router against an in-memory database
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use nilai_dashboard::{admin::Role, config::ServerConfig, db, server, AppContext};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    ctx: AppContext,
}

impl TestApp {
    async fn new() -> Self {
        let pool = db::create_memory_pool().await.unwrap();
        let ctx = AppContext::with_pool(ServerConfig::default(), pool)
            .await
            .unwrap();
        Self {
            router: server::build_router(ctx.clone()),
            ctx,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn superadmin(&self) -> String {
        self.login("Fann", "admin").await
    }

    /// Create a regular admin and return its token
    async fn regular_admin(&self) -> String {
        let root = self.superadmin().await;
        let (status, _) = self
            .send(
                Method::POST,
                "/api/admins",
                Some(&root),
                Some(json!({ "username": "operator", "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.login("operator", "secret1").await
    }
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");

    let (status, body) = app.send(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Endpoint not found" }));
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "  Fann  ", "password": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"]["username"], "Fann");
    assert_eq!(body["admin"]["role"], "superadmin");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "Fann");
    assert!(me.get("password").is_none());

    app.ctx.activity.flush().await;
    let (_, stats) = app
        .send(Method::GET, "/api/dashboard/stats", Some(&token), None)
        .await;
    assert_eq!(stats["recentActivity"][0]["action"], "LOGIN");
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await;

    let (status, wrong_password) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "Fann", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "Fann" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = TestApp::new().await;

    for uri in ["/api/users", "/api/nilai", "/api/dashboard/stats", "/api/auth/me"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert!(body["error"].is_string());

        let (status, _) = app
            .send(Method::GET, uri, Some("not.a.token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    // Token signed with another secret
    let foreign = nilai_dashboard::auth::TokenIssuer::new(
        "another-secret-that-is-also-long-enough",
        chrono::Duration::hours(24),
    )
    .issue(1, "Fann", Role::SuperAdmin)
    .unwrap();
    let (status, _) = app
        .send(Method::GET, "/api/admins", Some(&foreign), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_superadmin() {
    let app = TestApp::new().await;
    let token = app.regular_admin().await;

    let requests = [
        (Method::GET, "/api/admins", None),
        (
            Method::POST,
            "/api/admins",
            Some(json!({ "username": "x", "password": "secret1" })),
        ),
        (
            Method::PUT,
            "/api/admins/2",
            Some(json!({ "password": "secret2" })),
        ),
        (Method::DELETE, "/api/admins/2", None),
        (Method::DELETE, "/api/admins/1", None),
    ];

    for (method, uri, body) in requests {
        let (status, _) = app.send(method.clone(), uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
    }

    // Nothing changed: the operator can still log in with the old password
    app.login("operator", "secret1").await;
}

#[tokio::test]
async fn test_admin_management() {
    let app = TestApp::new().await;
    let root = app.superadmin().await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/admins",
            Some(&root),
            Some(json!({ "username": "  sari ", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["username"], "sari");
    assert_eq!(created["role"], "admin");
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/admins",
            Some(&root),
            Some(json!({ "username": "sari", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already exists");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admins",
            Some(&root),
            Some(json!({ "username": "short", "password": "12345" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = app.send(Method::GET, "/api/admins", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Fann", "sari"]);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/admins/{}", id),
            Some(&root),
            Some(json!({ "password": "changed1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    app.login("sari", "changed1").await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/admins/999",
            Some(&root),
            Some(json!({ "password": "changed1" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(Method::DELETE, "/api/admins/1", Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "The super admin cannot be deleted");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admins/{}", id), Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admins/{}", id), Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_and_grade_scenario() {
    let app = TestApp::new().await;
    let token = app.superadmin().await;
    let token = Some(token.as_str());

    let (status, user) = app
        .send(
            Method::POST,
            "/api/users",
            token,
            Some(json!({ "nim": "A1", "nama": "Budi" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["id"], 1);
    assert_eq!(user["nim"], "A1");
    assert_eq!(user["nama"], "Budi");

    let (status, grade) = app
        .send(
            Method::POST,
            "/api/nilai",
            token,
            Some(json!({ "user_id": 1, "pertemuan": 1, "nilai": 90 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(grade["nim"], "A1");
    assert_eq!(grade["nama"], "Budi");
    assert_eq!(grade["nilai"], 90.0);
    let grade_id = grade["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/nilai",
            token,
            Some(json!({ "user_id": 1, "pertemuan": 1, "nilai": 50 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pertemuan 1"));

    let (status, _) = app.send(Method::DELETE, "/api/users/1", token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::GET, &format!("/api/nilai/{}", grade_id), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, "/api/users/1", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_validation_and_duplicates() {
    let app = TestApp::new().await;
    let token = app.superadmin().await;
    let token = Some(token.as_str());

    let (status, _) = app
        .send(Method::POST, "/api/users", token, Some(json!({ "nim": "A1", "nama": "Budi" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(Method::POST, "/api/users", token, Some(json!({ "nim": "A1", "nama": "Sari" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NIM already registered");

    let (status, _) = app
        .send(Method::POST, "/api/users", token, Some(json!({ "nim": " ", "nama": "Sari" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(Method::POST, "/api/users", token, Some(json!("not an object")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.send(Method::GET, "/api/users/abc", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::PUT, "/api/users/42", token, Some(json!({ "nim": "Z9", "nama": "Nobody" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.send(Method::GET, "/api/users?search=bud", token, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_grades_do_not_mutate() {
    let app = TestApp::new().await;
    let token = app.superadmin().await;
    let token = Some(token.as_str());

    app.send(Method::POST, "/api/users", token, Some(json!({ "nim": "A1", "nama": "Budi" })))
        .await;

    for body in [
        json!({ "user_id": 1, "pertemuan": 17, "nilai": 80 }),
        json!({ "user_id": 1, "pertemuan": 0, "nilai": 80 }),
        json!({ "user_id": 1, "pertemuan": 2, "nilai": 100.5 }),
        json!({ "user_id": 1, "pertemuan": 2, "nilai": -1 }),
        json!({ "user_id": 1, "pertemuan": 2 }),
    ] {
        let (status, _) = app.send(Method::POST, "/api/nilai", token, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/api/nilai",
            token,
            Some(json!({ "user_id": 9, "pertemuan": 2, "nilai": 80 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    let (_, list) = app.send(Method::GET, "/api/nilai", token, None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, grade) = app
        .send(
            Method::POST,
            "/api/nilai",
            token,
            Some(json!({ "user_id": 1, "pertemuan": 2, "nilai": 80 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/nilai/{}", grade["id"]);

    for body in [
        json!({ "user_id": 1, "pertemuan": 17, "nilai": 80 }),
        json!({ "user_id": 1, "pertemuan": 2, "nilai": 101 }),
    ] {
        let (status, _) = app.send(Method::PUT, &uri, token, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, unchanged) = app.send(Method::GET, &uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["pertemuan"], 2);
    assert_eq!(unchanged["nilai"], 80.0);

    let (status, _) = app.send(Method::GET, "/api/nilai?pertemuan=abc", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.send(Method::GET, "/api/nilai?pertemuan=", token, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_grade_update_and_filters() {
    let app = TestApp::new().await;
    let token = app.superadmin().await;
    let token = Some(token.as_str());

    app.send(Method::POST, "/api/users", token, Some(json!({ "nim": "A1", "nama": "Budi" })))
        .await;
    let (_, first) = app
        .send(
            Method::POST,
            "/api/nilai",
            token,
            Some(json!({ "user_id": "1", "pertemuan": "1", "nilai": "70" })),
        )
        .await;
    app.send(
        Method::POST,
        "/api/nilai",
        token,
        Some(json!({ "user_id": 1, "pertemuan": 2, "nilai": 85, "notes": "quiz" })),
    )
    .await;

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/nilai/{}", first["id"]),
            token,
            Some(json!({ "user_id": 1, "pertemuan": 3, "nilai": 95 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["pertemuan"], 3);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/nilai/999",
            token,
            Some(json!({ "user_id": 1, "pertemuan": 3, "nilai": 95 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Nilai not found");

    let (_, session) = app.send(Method::GET, "/api/nilai?pertemuan=2", token, None).await;
    assert_eq!(session.as_array().unwrap().len(), 1);
    assert_eq!(session[0]["notes"], "quiz");

    let (_, all) = app.send(Method::GET, "/api/nilai", token, None).await;
    let sessions: Vec<i64> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["pertemuan"].as_i64().unwrap())
        .collect();
    assert_eq!(sessions, vec![2, 3]);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = TestApp::new().await;
    let token = app.superadmin().await;
    let token = Some(token.as_str());

    let (status, empty) = app.send(Method::GET, "/api/dashboard/stats", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["avgNilai"], "0");
    assert_eq!(empty["totalAdmins"], 1);

    app.send(Method::POST, "/api/users", token, Some(json!({ "nim": "A1", "nama": "Budi" })))
        .await;
    app.send(Method::POST, "/api/users", token, Some(json!({ "nim": "A2", "nama": "Sari" })))
        .await;
    for (user_id, nilai) in [(1, 90), (2, 75)] {
        app.send(
            Method::POST,
            "/api/nilai",
            token,
            Some(json!({ "user_id": user_id, "pertemuan": 1, "nilai": nilai })),
        )
        .await;
    }
    app.ctx.activity.flush().await;

    let (_, stats) = app.send(Method::GET, "/api/dashboard/stats", token, None).await;
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalNilai"], 2);
    assert_eq!(stats["todayUsers"], 2);
    assert_eq!(stats["avgNilai"], "82.5");
    assert_eq!(stats["chartData"][0]["count"], 2);
    assert_eq!(stats["recentActivity"][0]["action"], "CREATE_NILAI");
    assert_eq!(stats["recentActivity"][2]["action"], "CREATE");
}

#[tokio::test]
async fn test_restart_with_renamed_seed_keeps_one_superadmin() {
    let pool = db::create_memory_pool().await.unwrap();
    AppContext::with_pool(ServerConfig::default(), pool.clone())
        .await
        .unwrap();

    let mut renamed = ServerConfig::default();
    renamed.bootstrap.superadmin_username = "root2".to_string();
    let ctx = AppContext::with_pool(renamed, pool).await.unwrap();

    let superadmins: Vec<String> = ctx
        .admins
        .list()
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.role == Role::SuperAdmin)
        .map(|a| a.username)
        .collect();
    assert_eq!(superadmins, vec!["Fann".to_string()]);
}

async fn preflight(router: &Router, origin: &str) -> Option<String> {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/users")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    response
        .headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new().await;
    assert_eq!(
        preflight(&app.router, "http://anywhere.test").await.as_deref(),
        Some("*")
    );

    let mut config = ServerConfig::default();
    config.service.cors_origins = vec!["http://localhost:5173".to_string()];
    let pool = db::create_memory_pool().await.unwrap();
    let ctx = AppContext::with_pool(config, pool).await.unwrap();
    let router = server::build_router(ctx);

    assert_eq!(
        preflight(&router, "http://localhost:5173").await.as_deref(),
        Some("http://localhost:5173")
    );
    assert_eq!(preflight(&router, "http://evil.test").await, None);
}
