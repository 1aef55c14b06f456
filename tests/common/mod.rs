// Shared harness: a fresh data directory, app state and router per test
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use tawzi::auth::Role;
use tawzi::config::Config;
use tawzi::state::AppState;
use tawzi::users::{NewUser, User, UserRepository};
use tawzi::{db, routes};

pub const BOUNDARY: &str = "tawzi-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        adjust(&mut config);
        config.resolve_paths(dir.path());
        std::fs::create_dir_all(config.uploads_path()).expect("uploads dir");

        let pool = db::create_pool(&config.db_path()).expect("pool");
        db::run_migrations(&pool).expect("migrations");

        let state = AppState::new(pool, config.clone());
        let router = routes::router(&config).with_state(state.clone());

        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub async fn user(&self, username: &str, role: Role) -> User {
        self.state
            .users()
            .create(&NewUser {
                username: username.into(),
                password: format!("{}-pass", username),
                role,
                is_active: true,
            })
            .await
            .expect("create user")
    }

    /// Logs in through the form and returns the `name=value` cookie pair.
    pub async fn login(&self, username: &str) -> String {
        let body = format!("username={}&password={}-pass", username, username);
        let response = self
            .send(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login failed for {}", username);
        session_cookie(&response).expect("session cookie")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, cookie: &str, body: &str) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_multipart(&self, uri: &str, cookie: &str, body: Vec<u8>) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("tawzi_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Builds a multipart body from text fields and `(filename, content_type, bytes)` files.
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// A complete create-form submission for a half product at a manual location.
pub fn half_product_form() -> Vec<u8> {
    Multipart::new()
        .file("images", "front.png", "image/png", b"\x89PNG fake image bytes")
        .text("product_type", "half")
        .text("product_value", "")
        .text("location_mode", "manual")
        .text("location_url", "https://maps.google.com/?q=24.7136,46.6753")
        .finish()
}
