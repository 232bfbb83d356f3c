use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use crate::ledger::{
    LikeTargetKind, ReactionError, ReactionService, ReviewItemKind, TargetKind, TargetStats,
};
use crate::provider::{BearerCredential, ProviderError, TargetMetadata};
use crate::user::{SessionToken, SessionTokenValue, UserProfile};
use axum_extra::extract::cookie::{Cookie, SameSite};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{response, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct LoginBody {
    pub access_token: String,
    pub expires_at: Option<i64>,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct CreateReviewBody {
    pub item_kind: ReviewItemKind,
    pub item_id: String,
    pub rating: u8,
    pub text: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct UpdateReviewBody {
    pub rating: Option<u8>,
    pub text: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct CreateAnnotationBody {
    pub track_id: String,
    pub position_secs: f64,
    pub text: String,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct UpdateAnnotationBody {
    pub position_secs: Option<f64>,
    pub text: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
struct TargetStatsResponse {
    kind: TargetKind,
    id: String,
    #[serde(flatten)]
    stats: TargetStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<TargetMetadata>,
}

impl IntoResponse for ReactionError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReactionError::Validation(_) => StatusCode::BAD_REQUEST,
            ReactionError::Conflict(_) => StatusCode::CONFLICT,
            ReactionError::Unauthorized => StatusCode::FORBIDDEN,
            ReactionError::NotFound => StatusCode::NOT_FOUND,
            ReactionError::Infrastructure(err) => {
                error!("Request failed: {:#}", err);
                let body = serde_json::json!({
                    "error": self.code(),
                    "message": "internal error",
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

fn parse_like_kind(kind: &str) -> Result<LikeTargetKind, ReactionError> {
    LikeTargetKind::parse(kind)
        .ok_or_else(|| ReactionError::validation(format!("unknown target kind '{}'", kind)))
}

fn parse_target_kind(kind: &str) -> Result<TargetKind, ReactionError> {
    TargetKind::parse(kind)
        .ok_or_else(|| ReactionError::validation(format!("unknown target kind '{}'", kind)))
}

fn parse_item_kind(kind: &str) -> Result<ReviewItemKind, ReactionError> {
    ReviewItemKind::parse(kind)
        .ok_or_else(|| ReactionError::validation(format!("unknown item kind '{}'", kind)))
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn login(State(state): State<ServerState>, Json(body): Json<LoginBody>) -> Response {
    let credential = BearerCredential {
        access_token: body.access_token,
        expires_at: body.expires_at,
    };
    if credential.is_expired(chrono::Utc::now().timestamp()) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let profile = match state.identity.current_user(&credential).await {
        Ok(profile) => profile,
        Err(ProviderError::InvalidCredential) => return StatusCode::FORBIDDEN.into_response(),
        Err(ProviderError::Unavailable(err)) => {
            error!("Identity provider unavailable: {:#}", err);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(err) = state.user_store.upsert_user(&profile, now) {
        error!("Failed to upsert user {}: {:#}", profile.id, err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let token = SessionToken {
        value: SessionTokenValue::generate(),
        user_id: profile.id.clone(),
        created_at: now,
        last_used_at: None,
    };
    if let Err(err) = state.user_store.add_session_token(token.clone()) {
        error!("Failed to persist session token: {:#}", err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let response_body = LoginSuccessResponse {
        token: token.value.0.clone(),
        user: profile,
    };
    let response_body = match serde_json::to_string(&response_body) {
        Ok(body) => body,
        Err(err) => {
            error!("Failed to serialize login response: {:#}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cookie_value = Cookie::build(Cookie::new(
        COOKIE_SESSION_TOKEN_KEY,
        token.value.0.clone(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .build();

    match response::Builder::new()
        .status(StatusCode::CREATED)
        .header(axum::http::header::SET_COOKIE, cookie_value.to_string())
        .body(Body::from(response_body))
    {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to build login response: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(State(user_store): State<GuardedUserStore>, session: Session) -> Response {
    match user_store.delete_session_token(&SessionTokenValue(session.token)) {
        Ok(_) => {
            let cookie_value = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            match response::Builder::new()
                .status(StatusCode::OK)
                .header(axum::http::header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
            {
                Ok(response) => response,
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        Err(err) => {
            error!("Failed to delete session token: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_me(session: Session, State(user_store): State<GuardedUserStore>) -> Response {
    match user_store.get_user(&session.user_id) {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load user {}: {:#}", session.user_id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_like(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ReactionError> {
    let kind = parse_like_kind(&kind)?;
    reactions.like(&session.user_id, kind, &id)?;
    Ok(StatusCode::CREATED)
}

async fn delete_like(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ReactionError> {
    let kind = parse_like_kind(&kind)?;
    reactions.unlike(&session.user_id, kind, &id)?;
    Ok(StatusCode::OK)
}

async fn get_target_stats(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<TargetStatsResponse>, ReactionError> {
    let kind = parse_target_kind(&kind)?;
    let stats = state.reactions.target_stats(kind, &id)?;

    // Display metadata is best effort, a provider hiccup never fails the
    // stats read.
    let metadata = match state.metadata.target_metadata(kind, &id).await {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!("Metadata lookup failed for {} {}: {}", kind.as_str(), id, err);
            None
        }
    };

    Ok(Json(TargetStatsResponse {
        kind,
        id,
        stats,
        metadata,
    }))
}

async fn post_review(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Json(body): Json<CreateReviewBody>,
) -> Result<Response, ReactionError> {
    let review = reactions.create_review(
        &session.user_id,
        body.item_kind,
        &body.item_id,
        body.rating,
        body.text,
        body.is_public.unwrap_or(true),
    )?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

async fn get_review(
    session: Option<Session>,
    State(reactions): State<GuardedReactionService>,
    Path(id): Path<String>,
) -> Result<Response, ReactionError> {
    let review = reactions.get_review(&id)?;
    let viewer = session.map(|s| s.user_id);
    if !review.is_public && viewer.as_deref() != Some(review.user_id.as_str()) {
        return Err(ReactionError::NotFound);
    }
    Ok(Json(review).into_response())
}

async fn put_review(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Path(id): Path<String>,
    Json(body): Json<UpdateReviewBody>,
) -> Result<Response, ReactionError> {
    let review = reactions.update_review(
        &session.user_id,
        &id,
        crate::ledger::ReviewUpdate {
            rating: body.rating,
            text: body.text,
            is_public: body.is_public,
        },
    )?;
    Ok(Json(review).into_response())
}

async fn delete_review(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ReactionError> {
    reactions.delete_review(&session.user_id, &id)?;
    Ok(StatusCode::OK)
}

async fn get_item_reviews(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, String)>,
    Query(page): Query<PageQuery>,
) -> Result<Response, ReactionError> {
    let kind = parse_item_kind(&kind)?;
    let reviews = state.reactions.list_public_reviews(
        kind,
        &id,
        page.limit.unwrap_or(state.config.default_page_size),
        page.offset.unwrap_or(0),
    )?;
    Ok(Json(reviews).into_response())
}

async fn post_annotation(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Json(body): Json<CreateAnnotationBody>,
) -> Result<Response, ReactionError> {
    let annotation = reactions.create_annotation(
        &session.user_id,
        &body.track_id,
        body.position_secs,
        body.text,
        body.is_public.unwrap_or(true),
    )?;
    Ok((StatusCode::CREATED, Json(annotation)).into_response())
}

async fn get_annotation(
    session: Option<Session>,
    State(reactions): State<GuardedReactionService>,
    Path(id): Path<String>,
) -> Result<Response, ReactionError> {
    let annotation = reactions.get_annotation(&id)?;
    let viewer = session.map(|s| s.user_id);
    if !annotation.is_public && viewer.as_deref() != Some(annotation.user_id.as_str()) {
        return Err(ReactionError::NotFound);
    }
    Ok(Json(annotation).into_response())
}

async fn put_annotation(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAnnotationBody>,
) -> Result<Response, ReactionError> {
    let annotation = reactions.update_annotation(
        &session.user_id,
        &id,
        crate::ledger::AnnotationUpdate {
            position_secs: body.position_secs,
            text: body.text,
            is_public: body.is_public,
        },
    )?;
    Ok(Json(annotation).into_response())
}

async fn delete_annotation(
    session: Session,
    State(reactions): State<GuardedReactionService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ReactionError> {
    reactions.delete_annotation(&session.user_id, &id)?;
    Ok(StatusCode::OK)
}

async fn get_track_annotations(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Response, ReactionError> {
    let annotations = state.reactions.list_public_annotations(
        &id,
        page.limit.unwrap_or(state.config.default_page_size),
        page.offset.unwrap_or(0),
    )?;
    Ok(Json(annotations).into_response())
}

pub fn make_app(
    config: ServerConfig,
    reactions: GuardedReactionService,
    user_store: GuardedUserStore,
    identity: GuardedIdentityProvider,
    metadata: GuardedMetadataProvider,
) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        reactions,
        user_store,
        identity,
        metadata,
        hash: env!("GIT_HASH").to_owned(),
    };

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/me", get(get_me))
        .with_state(state.clone());

    let reaction_routes: Router = Router::new()
        .route("/react/{kind}/{id}", post(post_like))
        .route("/react/{kind}/{id}", delete(delete_like))
        .route("/target/{kind}/{id}/stats", get(get_target_stats))
        .route("/review", post(post_review))
        .route("/review/{id}", get(get_review))
        .route("/review/{id}", put(put_review))
        .route("/review/{id}", delete(delete_review))
        .route("/item/{kind}/{id}/reviews", get(get_item_reviews))
        .route("/annotation", post(post_annotation))
        .route("/annotation/{id}", get(get_annotation))
        .route("/annotation/{id}", put(put_annotation))
        .route("/annotation/{id}", delete(delete_annotation))
        .route("/track/{id}/annotations", get(get_track_annotations))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1", reaction_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    reactions: GuardedReactionService,
    user_store: GuardedUserStore,
    identity: GuardedIdentityProvider,
    metadata: GuardedMetadataProvider,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    default_page_size: usize,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        default_page_size,
    };
    let app = make_app(config, reactions, user_store, identity, metadata)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteLedgerStore;
    use crate::provider::{IdentityProvider, MetadataProvider};
    use crate::user::{SqliteUserStore, UserStore};
    use async_trait::async_trait;
    use axum::http::Request;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct StubIdentityProvider;

    #[async_trait]
    impl IdentityProvider for StubIdentityProvider {
        async fn current_user(
            &self,
            credential: &BearerCredential,
        ) -> Result<UserProfile, ProviderError> {
            match credential.access_token.strip_prefix("token-") {
                Some(user_id) => Ok(UserProfile {
                    id: user_id.to_string(),
                    display_name: user_id.to_string(),
                    avatar_url: None,
                    profile_url: None,
                    country: None,
                }),
                None => Err(ProviderError::InvalidCredential),
            }
        }
    }

    struct NoMetadataProvider;

    #[async_trait]
    impl MetadataProvider for NoMetadataProvider {
        async fn target_metadata(
            &self,
            _kind: TargetKind,
            _id: &str,
        ) -> Result<Option<TargetMetadata>, ProviderError> {
            Ok(None)
        }
    }

    struct TestApp {
        app: Router,
        user_store: Arc<SqliteUserStore>,
        _temp_dir: TempDir,
    }

    fn make_test_app() -> TestApp {
        let temp_dir = TempDir::new().unwrap();
        let ledger_store =
            Arc::new(SqliteLedgerStore::new(temp_dir.path().join("ledger.db")).unwrap());
        let user_store = Arc::new(SqliteUserStore::new(temp_dir.path().join("users.db")).unwrap());
        let app = make_app(
            ServerConfig::default(),
            Arc::new(ReactionService::new(ledger_store)),
            user_store.clone(),
            Arc::new(StubIdentityProvider),
            Arc::new(NoMetadataProvider),
        )
        .unwrap();
        TestApp {
            app,
            user_store,
            _temp_dir: temp_dir,
        }
    }

    fn authed_token(user_store: &SqliteUserStore, user_id: &str) -> String {
        let value = SessionTokenValue::generate();
        user_store
            .add_session_token(SessionToken {
                value: value.clone(),
                user_id: user_id.to_string(),
                created_at: 0,
                last_used_at: None,
            })
            .unwrap();
        value.0
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn responds_forbidden_on_protected_routes() {
        let test = make_test_app();

        let protected = vec![
            ("POST", "/v1/react/track/123"),
            ("DELETE", "/v1/react/track/123"),
            ("POST", "/v1/review"),
            ("DELETE", "/v1/review/123"),
            ("POST", "/v1/annotation"),
            ("GET", "/v1/auth/logout"),
            ("GET", "/v1/auth/me"),
        ];

        for (method, route) in protected {
            let request = Request::builder()
                .method(method)
                .uri(route)
                .body(Body::empty())
                .unwrap();
            let response = test.app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, route);
        }
    }

    #[tokio::test]
    async fn login_issues_session_cookie() {
        let test = make_test_app();

        let request = json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"access_token": "token-ada"}"#,
        );
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let set_cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("session_token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
    }

    #[tokio::test]
    async fn login_with_bad_token_is_forbidden() {
        let test = make_test_app();

        let request = json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"access_token": "garbage"}"#,
        );
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn stats_are_public_and_zero_for_unknown_targets() {
        let test = make_test_app();

        let request = Request::builder()
            .uri("/v1/target/track/never-seen/stats")
            .body(Body::empty())
            .unwrap();
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["like_count"], 0);
        assert_eq!(body["avg_rating"], 0.0);
    }

    #[tokio::test]
    async fn like_with_header_token_shows_up_in_stats() {
        let test = make_test_app();
        let token = authed_token(&test.user_store, "ada");

        let request = json_request("POST", "/v1/react/track/t1", Some(&token), "");
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .uri("/v1/target/track/t1/stats")
            .body(Body::empty())
            .unwrap();
        let response = test.app.clone().oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["like_count"], 1);
    }

    #[tokio::test]
    async fn double_like_conflicts() {
        let test = make_test_app();
        let token = authed_token(&test.user_store, "ada");

        let request = json_request("POST", "/v1/react/album/a1", Some(&token), "");
        test.app.clone().oneshot(request).await.unwrap();
        let request = json_request("POST", "/v1/react/album/a1", Some(&token), "");
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_reaction_kind_is_bad_request() {
        let test = make_test_app();
        let token = authed_token(&test.user_store, "ada");

        let request = json_request("POST", "/v1/react/artist/x", Some(&token), "");
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn review_bodies_reject_unknown_fields() {
        let test = make_test_app();
        let token = authed_token(&test.user_store, "ada");

        let request = json_request(
            "POST",
            "/v1/review",
            Some(&token),
            r#"{"item_kind": "track", "item_id": "t1", "rating": 4, "sneaky": true}"#,
        );
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_bad_request() {
        let test = make_test_app();
        let token = authed_token(&test.user_store, "ada");

        let request = json_request(
            "POST",
            "/v1/review",
            Some(&token),
            r#"{"item_kind": "track", "item_id": "t1", "rating": 6}"#,
        );
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn private_review_is_hidden_from_other_users() {
        let test = make_test_app();
        let ada = authed_token(&test.user_store, "ada");
        let bob = authed_token(&test.user_store, "bob");

        let request = json_request(
            "POST",
            "/v1/review",
            Some(&ada),
            r#"{"item_kind": "track", "item_id": "t1", "rating": 4, "is_public": false}"#,
        );
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let review: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let review_id = review["id"].as_str().unwrap();

        let request = json_request("GET", &format!("/v1/review/{}", review_id), Some(&bob), "");
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = json_request("GET", &format!("/v1/review/{}", review_id), Some(&ada), "");
        let response = test.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
