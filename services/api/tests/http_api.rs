//! End-to-end checks of the HTTP surface over the in-memory store.

use api_lib::{
    adapters::LogNotifier,
    config::Config,
    web::{
        api_router,
        middleware::ADMIN_TOKEN_HEADER,
        state::{AppState, Stores},
    },
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use debt_tracker_core::{clock::FixedClock, memory::MemoryStore, Category};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_TOKEN: &str = "s3cret";

struct TestApp {
    router: Router,
    store: MemoryStore,
    clock: Arc<FixedClock>,
}

fn test_app() -> TestApp {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "ADMIN_TOKEN" => Some(ADMIN_TOKEN.to_string()),
        _ => None,
    })
    .unwrap();
    let store = MemoryStore::new();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap(),
    ));
    let state = AppState::new(
        Stores::shared(Arc::new(store.clone())),
        Arc::new(LogNotifier::new()),
        clock.clone(),
        Arc::new(config),
    );
    TestApp {
        router: api_router(Arc::new(state)),
        store,
        clock,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cookie, body)
    }

    /// Signs up a fresh account and returns its session cookie and user id.
    async fn signup(&self, email: &str) -> (String, Uuid) {
        let (status, cookie, body) = self
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = body["user_id"].as_str().unwrap().parse().unwrap();
        (cookie.unwrap(), user_id)
    }

    async fn create_debt(&self, cookie: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self
            .send(Method::POST, "/debts", Some(cookie), Some(body))
            .await;
        (status, body)
    }
}

impl TestApp {
    /// Seeds a global category the way the default-categories migration does.
    async fn global_category(&self, name: &str) -> Uuid {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            user_id: None,
        };
        self.store.insert_category(category.clone()).await;
        category.id
    }
}

fn lent_to_carol(due_date: &str) -> Value {
    json!({
        "type": "lent",
        "peer_name": "Carol",
        "amount": 25.0,
        "due_date": due_date,
        "reminder_enabled": true
    })
}

#[tokio::test]
async fn debt_routes_require_a_session() {
    let app = test_app();

    let (status, _, _) = app.send(Method::GET, "/debts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send(Method::GET, "/debts", Some("session=bogus"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_logout() {
    let app = test_app();
    let (_, user_id) = app.signup("dana@example.com").await;

    let (status, _, _) = app
        .send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "dana@example.com", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "dana@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "dana@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], json!(user_id.to_string()));
    let cookie = cookie.unwrap();

    let (status, _, _) = app.send(Method::GET, "/debts", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = app
        .send(Method::POST, "/auth/logout", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = app.send(Method::GET, "/debts", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_list_and_pay_a_debt() {
    let app = test_app();
    let (cookie, user_id) = app.signup("erin@example.com").await;

    let (status, created) = app.create_debt(&cookie, lent_to_carol("2024-06-20")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["type"], "lent");
    assert_eq!(created["user_id"], json!(user_id.to_string()));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _, listed) = app.send(Method::GET, "/debts", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let pay_uri = format!("/debts/{}/pay", id);
    let (status, _, paid) = app.send(Method::POST, &pay_uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");

    let (status, _, _) = app.send(Method::POST, &pay_uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = app
        .send(
            Method::PUT,
            &format!("/debts/{}", id),
            Some(&cookie),
            Some(lent_to_carol("2024-06-21")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_debts_are_rejected() {
    let app = test_app();
    let (cookie, _) = app.signup("finn@example.com").await;

    let (status, _) = app.create_debt(&cookie, lent_to_carol("2024-06-01")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.create_debt(&cookie, lent_to_carol("June 20th")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unknown_type = lent_to_carol("2024-06-20");
    unknown_type["type"] = json!("gifted");
    let (status, _) = app.create_debt(&cookie, unknown_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut zero = lent_to_carol("2024-06-20");
    zero["amount"] = json!(0.0);
    let (status, _) = app.create_debt(&cookie, zero).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn another_users_debt_is_forbidden() {
    let app = test_app();
    let (owner, _) = app.signup("gale@example.com").await;
    let (intruder, _) = app.signup("hale@example.com").await;

    let (_, created) = app.create_debt(&owner, lent_to_carol("2024-06-20")).await;
    let uri = format!("/debts/{}", created["id"].as_str().unwrap());

    let (status, _, _) = app.send(Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(Method::POST, &format!("{}/pay", uri), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(
            Method::GET,
            &format!("/debts/{}", Uuid::new_v4()),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upcoming_lists_only_the_window() {
    let app = test_app();
    let (cookie, _) = app.signup("ivy@example.com").await;
    app.create_debt(&cookie, lent_to_carol("2024-06-12")).await;
    app.create_debt(&cookie, lent_to_carol("2024-06-17")).await;
    app.create_debt(&cookie, lent_to_carol("2024-06-18")).await;
    app.create_debt(&cookie, lent_to_carol("2024-07-30")).await;

    // Today is 2024-06-10, so the default window ends on 2024-06-17.
    let (status, _, upcoming) = app
        .send(Method::GET, "/debts/upcoming", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let due_dates: Vec<&str> = upcoming
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["due_date"].as_str().unwrap())
        .collect();
    assert_eq!(due_dates, vec!["2024-06-12", "2024-06-17"]);

    let (status, _, _) = app
        .send(Method::GET, "/debts/upcoming?days=0", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .send(
            Method::GET,
            &format!("/debts/upcoming?days={}", i64::MAX),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reposting_a_debt_id_is_a_conflict() {
    let app = test_app();
    let (cookie, _) = app.signup("lee@example.com").await;
    let mut body = lent_to_carol("2024-06-20");
    body["id"] = json!(Uuid::new_v4());

    let (status, first) = app.create_debt(&cookie, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    body["amount"] = json!(99.0);
    let (status, _) = app.create_debt(&cookie, body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, _, stored) = app
        .send(
            Method::GET,
            &format!("/debts/{}", first["id"].as_str().unwrap()),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(stored["amount"], json!(25.0));
}

#[tokio::test]
async fn expenses_can_be_recorded_edited_and_deleted() {
    let app = test_app();
    let (cookie, user_id) = app.signup("mo@example.com").await;
    let transport = app.global_category("Transport").await;

    let (status, _, created) = app
        .send(
            Method::POST,
            "/expenses",
            Some(&cookie),
            Some(json!({ "amount": 12.5, "note": "bus", "expense_date": "2024-06-09" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], json!(user_id.to_string()));
    assert_eq!(created["category_id"], Value::Null);
    let uri = format!("/expenses/{}", created["id"].as_str().unwrap());

    let (status, _, updated) = app
        .send(
            Method::PUT,
            &uri,
            Some(&cookie),
            Some(json!({ "category_id": transport })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["category_id"], json!(transport));
    assert_eq!(updated["note"], "bus");

    let (status, _, listed) = app
        .send(
            Method::GET,
            &format!("/expenses?category_id={}", transport),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _, _) = app
        .send(
            Method::GET,
            "/expenses?from_date=2024-06-10&to_date=2024-06-01",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app.send(Method::DELETE, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app.send(Method::GET, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_expenses_are_rejected() {
    let app = test_app();
    let (cookie, _) = app.signup("nia@example.com").await;
    let (other, _) = app.signup("oz@example.com").await;

    let (_, _, private) = app
        .send(
            Method::POST,
            "/categories",
            Some(&other),
            Some(json!({ "name": "Secret" })),
        )
        .await;

    for body in [
        json!({ "amount": 0.0, "expense_date": "2024-06-09" }),
        json!({ "amount": 5.0, "expense_date": "yesterday" }),
        json!({ "amount": 5.0, "expense_date": "2024-06-09", "category_id": Uuid::new_v4() }),
        json!({ "amount": 5.0, "expense_date": "2024-06-09", "category_id": private["id"] }),
    ] {
        let (status, _, _) = app
            .send(Method::POST, "/expenses", Some(&cookie), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _, _) = app
        .send(
            Method::POST,
            "/expenses",
            None,
            Some(json!({ "amount": 5.0, "expense_date": "2024-06-09" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn another_users_expense_is_forbidden() {
    let app = test_app();
    let (owner, _) = app.signup("pat@example.com").await;
    let (intruder, _) = app.signup("quinn@example.com").await;

    let (_, _, created) = app
        .send(
            Method::POST,
            "/expenses",
            Some(&owner),
            Some(json!({ "amount": 40.0, "expense_date": "2024-06-09" })),
        )
        .await;
    let uri = format!("/expenses/{}", created["id"].as_str().unwrap());

    let (status, _, _) = app.send(Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(Method::DELETE, &uri, Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, listed) = app
        .send(Method::GET, "/expenses", Some(&intruder), None)
        .await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn categories_are_listed_renamed_and_guarded() {
    let app = test_app();
    let (cookie, user_id) = app.signup("rae@example.com").await;
    let food = app.global_category("Food").await;

    let (status, _, created) = app
        .send(
            Method::POST,
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Books" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], json!(user_id.to_string()));
    let uri = format!("/categories/{}", created["id"].as_str().unwrap());

    let (status, _, listed) = app
        .send(Method::GET, "/categories", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Books", "Food"]);

    let (status, _, renamed) = app
        .send(
            Method::PUT,
            &uri,
            Some(&cookie),
            Some(json!({ "name": "Novels" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Novels");

    let global_uri = format!("/categories/{}", food);
    let (status, _, _) = app
        .send(
            Method::PUT,
            &global_uri,
            Some(&cookie),
            Some(json!({ "name": "Snacks" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(Method::DELETE, &global_uri, Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(
            Method::POST,
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app.send(Method::DELETE, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app.send(Method::GET, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn weekly_report_aggregates_and_validates_the_window() {
    let app = test_app();
    let (cookie, _) = app.signup("jo@example.com").await;
    let food = app.global_category("Food").await;
    let (status, _, _) = app
        .send(
            Method::POST,
            "/expenses",
            Some(&cookie),
            Some(json!({ "amount": 30.0, "category_id": food, "expense_date": "2024-06-11" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.create_debt(&cookie, lent_to_carol("2024-06-14")).await;

    let (status, _, report) = app
        .send(
            Method::GET,
            "/reports/weekly?start=2024-06-10&end=2024-06-16",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_expense"], json!(30.0));
    assert_eq!(report["total_lent"], json!(25.0));
    assert_eq!(report["total_borrowed"], json!(0.0));
    assert_eq!(report["category_breakdown"][0]["category_name"], "Food");

    let (status, _, _) = app
        .send(
            Method::GET,
            "/reports/weekly?start=2024-06-16&end=2024-06-10",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .send(Method::GET, "/reports/weekly?start=2024-06-10", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_sweeps_need_the_token_and_move_debts() {
    let app = test_app();
    let (cookie, _) = app.signup("kai@example.com").await;
    let (_, soon) = app.create_debt(&cookie, lent_to_carol("2024-06-11")).await;
    app.create_debt(&cookie, lent_to_carol("2024-06-15")).await;

    let (status, _, _) = app
        .send(Method::POST, "/admin/sweeps/overdue", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = |uri: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(ADMIN_TOKEN_HEADER, ADMIN_TOKEN)
            .body(Body::empty())
            .unwrap()
    };

    // 2024-06-12: the first debt is a day late, the second is three days out.
    app.clock.advance(Duration::days(2));

    let (status, _, body) = app.call(admin("/admin/sweeps/overdue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["affected"], json!(1));

    let (_, _, body) = app.call(admin("/admin/sweeps/overdue")).await;
    assert_eq!(body["affected"], json!(0));

    let soon_id: Uuid = soon["id"].as_str().unwrap().parse().unwrap();
    let stored = app.store.debt(soon_id).await.unwrap();
    assert_eq!(stored.status.as_str(), "overdue");

    let (status, _, body) = app.call(admin("/admin/sweeps/reminders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reminded"], json!(1));
    assert_eq!(body["debts"][0]["due_date"], "2024-06-15");

    let (_, _, body) = app.call(admin("/admin/sweeps/reminders")).await;
    assert_eq!(body["reminded"], json!(0));
}
