use axum::{
    async_trait,
    body::to_bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

const BODY_LIMIT: usize = 64 * 1024;

/// Request input gathered from the query string, the body (JSON object or
/// urlencoded form) and the `Session` header, then deserialized into `T`.
///
/// Body fields override query fields; the header only fills a missing `session`.
pub struct Fields<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Fields<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let mut fields = Map::new();

        if let Some(query) = parts.uri.query() {
            merge_urlencoded(&mut fields, query.as_bytes());
        }

        let bytes = to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|e| AppError::InvalidBody(e.to_string()))?;
        if !bytes.is_empty() {
            if is_json(&parts.headers) {
                merge_json(&mut fields, &bytes)?;
            } else {
                merge_urlencoded(&mut fields, &bytes);
            }
        }

        let has_session = fields
            .get("session")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !has_session {
            if let Some(session) = parts.headers.get("session").and_then(|v| v.to_str().ok()) {
                fields.insert("session".into(), Value::String(session.to_string()));
            }
        }

        let value = serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::InvalidBody(e.to_string()))?;
        Ok(Fields(value))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn merge_urlencoded(fields: &mut Map<String, Value>, raw: &[u8]) {
    for (k, v) in url::form_urlencoded::parse(raw) {
        fields.insert(k.into_owned(), Value::String(v.into_owned()));
    }
}

fn merge_json(fields: &mut Map<String, Value>, raw: &[u8]) -> Result<(), AppError> {
    let parsed: Value =
        serde_json::from_slice(raw).map_err(|e| AppError::InvalidBody(e.to_string()))?;
    let Value::Object(object) = parsed else {
        return Err(AppError::InvalidBody("expected a JSON object".into()));
    };
    for (k, v) in object {
        // Scalars are flattened to strings so `{"id": 1}` and `id=1` read the same.
        let text = match v {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        fields.insert(k, Value::String(text));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::{NewPasswordRequest, RegisterRequest, SessionRequest};
    use axum::{body::Body, http};

    async fn extract<T: DeserializeOwned>(req: Request) -> Result<T, AppError> {
        Fields::<T>::from_request(req, &()).await.map(|Fields(v)| v)
    }

    #[tokio::test]
    async fn reads_urlencoded_form() {
        let req = http::Request::post("/auth/register")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Ann&surname=Li&phone_number=%2B1000&password=pw1"))
            .unwrap();
        let r: RegisterRequest = extract(req).await.unwrap();
        assert_eq!(r.name, "Ann");
        assert_eq!(r.phone_number, "+1000");
        assert_eq!(r.balance, None);
    }

    #[tokio::test]
    async fn reads_json_and_stringifies_numbers() {
        let req = http::Request::put("/auth/password")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"id": 12, "new_password": "pw2"}"#))
            .unwrap();
        let r: NewPasswordRequest = extract(req).await.unwrap();
        assert_eq!(r.id, "12");
        assert_eq!(r.new_password, "pw2");
    }

    #[tokio::test]
    async fn query_then_header_fallback_for_session() {
        let req = http::Request::get("/auth/session?session=abc")
            .body(Body::empty())
            .unwrap();
        let r: SessionRequest = extract(req).await.unwrap();
        assert_eq!(r.session, "abc");

        let req = http::Request::delete("/auth/logout")
            .header("Session", "from-header")
            .body(Body::empty())
            .unwrap();
        let r: SessionRequest = extract(req).await.unwrap();
        assert_eq!(r.session, "from-header");
    }

    #[tokio::test]
    async fn missing_fields_default_to_empty() {
        let req = http::Request::post("/auth/refresh").body(Body::empty()).unwrap();
        let r: SessionRequest = extract(req).await.unwrap();
        assert!(r.session.is_empty());
    }

    #[tokio::test]
    async fn broken_json_is_invalid_body() {
        let req = http::Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = extract::<SessionRequest>(req).await.err().unwrap();
        assert_eq!(err.code(), "INVALID_BODY");
    }
}
