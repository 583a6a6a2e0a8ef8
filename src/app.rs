use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::store::GameStore;
use crate::error::ApiError;
use crate::handlers::{admin, health};
use crate::services::{AdminService, GameLevelSequencer};

/// Shared handler state; every service runs over the same store
#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<AdminService>,
    pub levels: Arc<GameLevelSequencer>,
    pub store: Arc<dyn GameStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            admin: Arc::new(AdminService::new(store.clone())),
            levels: Arc::new(GameLevelSequencer::new(store.clone())),
            store,
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .merge(create_routes())
        .merge(view_routes())
        .merge(edit_routes())
        .merge(delete_routes())
        .route("/admin/ajax/objects", post(admin::ajax::objects))
        .fallback(not_found)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn create_routes() -> Router<AppState> {
    use admin::create;

    Router::new()
        .route("/admin/create/corporation", post(create::corporation))
        .route("/admin/create/box", post(create::game_box))
        .route("/admin/create/flag/static", post(create::static_flag))
        .route("/admin/create/flag/regex", post(create::regex_flag))
        .route("/admin/create/game_level", post(create::game_level))
        .route("/admin/create/hint", post(create::hint))
        .route("/admin/create/team", post(create::team))
}

fn view_routes() -> Router<AppState> {
    use admin::view;

    Router::new()
        .route("/admin/view/game_objects", get(view::game_objects))
        .route("/admin/view/game_levels", get(view::game_levels))
        .route("/admin/view/market_objects", get(view::market_objects))
        .route("/admin/view/teams", get(view::teams))
}

fn edit_routes() -> Router<AppState> {
    use admin::edit;

    Router::new()
        .route(
            "/admin/edit/corporation",
            get(edit::show_game_objects).post(edit::corporation),
        )
        .route(
            "/admin/edit/box",
            get(edit::show_game_objects).post(edit::game_box),
        )
        .route(
            "/admin/edit/flag",
            get(edit::show_game_objects).post(edit::flag),
        )
        .route("/admin/edit/ip", get(edit::show_game_objects).post(edit::ip))
        .route(
            "/admin/edit/hint",
            get(edit::show_game_objects).post(edit::hint),
        )
        .route(
            "/admin/edit/game_level",
            get(edit::show_game_levels).post(edit::game_level),
        )
        .route(
            "/admin/edit/box_level",
            get(edit::show_game_levels).post(edit::box_level),
        )
        .route(
            "/admin/edit/market_item",
            get(edit::show_market_objects).post(edit::market_item),
        )
}

fn delete_routes() -> Router<AppState> {
    use admin::delete;

    Router::new()
        .route("/admin/delete/ip", post(delete::ip))
        .route("/admin/delete/flag", post(delete::flag))
        .route("/admin/delete/hint", post(delete::hint))
        .route("/admin/delete/box", post(delete::game_box))
        .route("/admin/delete/corporation", post(delete::corporation))
        .route("/admin/delete/game_level", post(delete::game_level))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        router(state, &AppConfig::development())
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn creating_a_level_redirects_to_the_level_view() {
        let app = app();

        let response = app
            .clone()
            .oneshot(form("/admin/create/game_level", "level_number=5&buyout=100"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/view/game_levels");

        let response = app
            .oneshot(get_req("/admin/view/game_levels"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["success"], true);
        // The first level always becomes the head
        assert_eq!(body["data"][0]["number"], 0);
        assert_eq!(body["data"][0]["buyout"], 100);
        assert_eq!(body["data"][0]["next_level_id"], Value::Null);
    }

    #[tokio::test]
    async fn validation_failures_answer_json() {
        let response = app()
            .oneshot(form("/admin/create/game_level", "level_number=abc&buyout=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn deleting_unknown_objects_is_not_found() {
        let response = app()
            .oneshot(form("/admin/delete/flag", "uuid=not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json(response).await["message"],
            "Flag does not exist in database."
        );
    }

    #[tokio::test]
    async fn unknown_objects_fall_through() {
        let response = app()
            .oneshot(form("/admin/create/spaceship", "name=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn edit_pages_redirect_to_views() {
        let response = app()
            .oneshot(get_req("/admin/edit/market_item"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/view/market_objects");
    }

    #[tokio::test]
    async fn ajax_reports_bad_lookups_in_band() {
        let app = app();

        let response = app
            .clone()
            .oneshot(form("/admin/ajax/objects", "obj=team&uuid=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["Error"], "Invalid object type.");

        let response = app
            .oneshot(form(
                "/admin/ajax/objects",
                "obj=box&uuid=5f0e9f6a-3c39-4a55-9b3e-0a3b0b8f5d11",
            ))
            .await
            .unwrap();
        assert_eq!(json(response).await["Error"], "Invalid uuid.");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["data"]["database"], "ok");
    }
}
