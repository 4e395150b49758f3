use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{AppState, routes};

mod auth;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::daily_logs::router(&state))
        .merge(routes::auth::router())
        .layer(from_fn_with_state(state.clone(), auth::require_write_auth));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest_service("/media", ServeDir::new(&state.config().media_root))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config().cors_origins))
        .with_state(state)
}

/// An empty allow-list (the default) keeps the permissive development
/// behavior; listing origins restricts browsers to exactly those.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ];
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(methods)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use config::{AuthConfig, ServerConfig};
    use db::DBService;
    use tower::ServiceExt;

    use crate::AppState;

    const BOUNDARY: &str = "bitacora-test-boundary";

    // The TempDir guard is returned so the sqlite file and media root are
    // removed when the test ends.
    async fn setup_app() -> (axum::Router, tempfile::TempDir) {
        let temp_root = tempfile::tempdir().unwrap();

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            temp_root.path().join("db.sqlite").to_string_lossy()
        );
        let db = DBService::new(&db_url).await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: db_url,
            media_root: temp_root.path().to_path_buf(),
            cors_origins: Vec::new(),
            auth: AuthConfig {
                secret: "test-secret".to_string(),
                username: "admin".to_string(),
                password: "sekrit".to_string(),
                access_ttl_secs: 1800,
                refresh_ttl_secs: 604800,
            },
        };
        (super::router(AppState::new(db, config)), temp_root)
    }

    fn multipart_body(fields: &[(&str, &str)]) -> Body {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn obtain_access_token(app: &axum::Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/token/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"username":"admin","password":"sekrit"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        json["data"]["access"].as_str().unwrap().to_string()
    }

    async fn create_log(app: &axum::Router, token: &str, nombre: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dailylog/")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[
                        ("project_name", "bitacora"),
                        ("project_type", "backend"),
                        ("nombre_tarea", nombre),
                        ("descripcion", "Patched token refresh"),
                        ("horas", "2.5"),
                        ("tecnologias_utilizadas", "Rust, axum"),
                    ]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _media) = setup_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn writes_require_a_token() {
        let (app, _media) = setup_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dailylog/")
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[("nombre_tarea", "x")]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let (app, _media) = setup_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/token/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"wrong"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_issues_a_new_access_token() {
        let (app, _media) = setup_app().await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/token/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"sekrit"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        let refresh = json["data"]["refresh"].as_str().unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/token/refresh/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(r#"{{"refresh":"{refresh}"}}"#)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["data"]["access"].as_str().is_some());
    }

    #[tokio::test]
    async fn access_token_is_not_a_valid_refresh_token() {
        let (app, _media) = setup_app().await;
        let access = obtain_access_token(&app).await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/token/refresh/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(r#"{{"refresh":"{access}"}}"#)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn created_log_round_trips_through_detail() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        let created = create_log(&app, &token, "Fix login bug").await;
        assert_eq!(created["success"], true);
        assert_eq!(created["data"]["nombre_tarea"], "Fix login bug");
        assert_eq!(created["data"]["horas"], 2.5);
        let id = created["data"]["id"].as_i64().unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/dailylog/{id}/"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["nombre_tarea"], "Fix login bug");
        assert_eq!(json["data"]["descripcion"], "Patched token refresh");
        assert_eq!(json["data"]["project_type"], "backend");
    }

    #[tokio::test]
    async fn list_reports_count_and_pages() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        for i in 0..12 {
            create_log(&app, &token, &format!("tarea {i}")).await;
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/dailylog/?page=1&page_size=10")
                    .header(header::HOST, "localhost:8000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["count"], 12);
        assert_eq!(json["data"]["results"].as_array().unwrap().len(), 10);
        assert!(
            json["data"]["next"]
                .as_str()
                .unwrap()
                .contains("/api/dailylog/?page=2")
        );
        assert!(json["data"]["previous"].is_null());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/dailylog/?page=2&page_size=10")
                    .header(header::HOST, "localhost:8000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["data"]["results"].as_array().unwrap().len(), 2);
        assert!(json["data"]["next"].is_null());
        assert!(
            json["data"]["previous"]
                .as_str()
                .unwrap()
                .contains("page=1")
        );
    }

    #[tokio::test]
    async fn validation_errors_come_back_per_field() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dailylog/")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[
                        ("project_name", "bitacora"),
                        ("nombre_tarea", "tarea"),
                        ("tecnologias_utilizadas", "Rust"),
                        ("horas", "25"),
                    ]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["data"]["horas"][0].as_str().unwrap().contains("24"));
    }

    #[tokio::test]
    async fn create_without_technologies_is_rejected() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dailylog/")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[
                        ("project_name", "bitacora"),
                        ("nombre_tarea", "tarea"),
                        ("horas", "2"),
                    ]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(
            json["data"]["tecnologias_utilizadas"][0],
            "This field is required."
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/dailylog/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["data"]["count"], 0);
    }

    #[tokio::test]
    async fn patch_updates_the_publication_link() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        let created = create_log(&app, &token, "publicar").await;
        let id = created["data"]["id"].as_i64().unwrap();
        assert!(created["data"]["link_publicacion_linkedin"].is_null());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/dailylog/{id}/"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[(
                        "link_publicacion_linkedin",
                        "https://linkedin.com/post/1",
                    )]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/dailylog/{id}/"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(
            json["data"]["link_publicacion_linkedin"],
            "https://linkedin.com/post/1"
        );
        assert_eq!(json["data"]["nombre_tarea"], "publicar");
    }

    #[tokio::test]
    async fn put_replaces_the_record_and_keeps_untouched_images() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;

        let mut body = String::new();
        for (name, value) in [
            ("project_name", "bitacora"),
            ("nombre_tarea", "original"),
            ("descripcion", "primer intento"),
            ("tecnologias_utilizadas", "Rust"),
            ("horas", "2"),
        ] {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"imagen_1\"; filename=\"captura.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{BOUNDARY}--\r\n"
        ));
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dailylog/")
                    .header(header::HOST, "localhost:8000")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["data"]["id"].as_i64().unwrap();

        // A PUT with no image parts leaves the stored image alone; an
        // absent optional field is cleared by the full replacement.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/dailylog/{id}/"))
                    .header(header::HOST, "localhost:8000")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[
                        ("project_name", "bitacora"),
                        ("nombre_tarea", "renombrada"),
                        ("tecnologias_utilizadas", "Rust, axum"),
                        ("horas", "3.5"),
                    ]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["nombre_tarea"], "renombrada");
        assert_eq!(json["data"]["horas"], 3.5);
        assert!(json["data"]["descripcion"].is_null());
        assert!(
            json["data"]["imagen_1_url"]
                .as_str()
                .unwrap()
                .ends_with("captura.png")
        );

        // Required fields are revalidated on PUT.
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/dailylog/{id}/"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(multipart_body(&[
                        ("project_name", "bitacora"),
                        ("horas", "3.5"),
                    ]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["data"]["nombre_tarea"][0], "This field is required.");
    }

    #[tokio::test]
    async fn delete_without_token_leaves_the_record() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        let created = create_log(&app, &token, "persistente").await;
        let id = created["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/dailylog/{id}/"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/dailylog/{id}/"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/dailylog/{id}/"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/dailylog/{id}/"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uploaded_image_gets_an_absolute_url() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;

        let mut body = String::new();
        for (name, value) in [
            ("project_name", "bitacora"),
            ("nombre_tarea", "con captura"),
            ("tecnologias_utilizadas", "Rust, Tauri"),
            ("horas", "1"),
        ] {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"imagen_1\"; filename=\"captura.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{BOUNDARY}--\r\n"
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dailylog/")
                    .header(header::HOST, "localhost:8000")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, multipart_content_type())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        let url = json["data"]["imagen_1_url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8000/media/dailylog/"));
        assert!(url.ends_with("captura.png"));
    }

    #[tokio::test]
    async fn unknown_search_returns_empty_results() {
        let (app, _media) = setup_app().await;
        let token = obtain_access_token(&app).await;
        create_log(&app, &token, "Fix login bug").await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/dailylog/?search=kubernetes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["count"], 0);
        assert_eq!(json["data"]["results"].as_array().unwrap().len(), 0);
    }
}
