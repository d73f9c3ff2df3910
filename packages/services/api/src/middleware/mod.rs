//! API 미들웨어
//!
//! 요청 ID 부여와 Bearer 토큰 추출을 담당합니다.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tm_core::auth::bearer_token;
use tm_core::{CredentialFault, Error};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct RequestId(#[allow(dead_code)] pub String);

tokio::task_local! {
    static REQUEST_ID: String;
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(id.clone()));
    let mut resp = REQUEST_ID.scope(id.clone(), async move { next.run(req).await }).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}

/// `Authorization: Bearer ...` 헤더의 토큰
pub fn access_token(headers: &HeaderMap) -> Result<&str, Error> {
    let header = headers.get("authorization").and_then(|v| v.to_str().ok());
    bearer_token(header).ok_or(Error::InvalidCredentials(CredentialFault::Malformed))
}
