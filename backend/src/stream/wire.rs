//! Webhook wire formats.
//!
//! Media servers report publish events in one of two shapes:
//!
//! - form-encoded, as sent by nginx-rtmp and srtrelay
//!   (`app`, `name`, `pwd`, `call`)
//! - JSON, as sent by SRS (`action`, `app`, `stream`, `param`), where `param`
//!   is the query string the publisher appended to its URL
//!
//! The shape is chosen by content type and parsed once into a
//! [`HookRequest`], which is then normalized into a [`StreamHook`].

use axum::{
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use onair_types::normalize_password;
use serde::Deserialize;
use utoipa::ToSchema;

/// Form `call` value for a stream start.
pub const CALL_PUBLISH: &str = "publish";
/// Form `call` value for a stream stop.
pub const CALL_PUBLISH_DONE: &str = "publish_done";
/// SRS `action` value for a stream start.
pub const SRS_ON_PUBLISH: &str = "on_publish";
/// SRS `action` value for a stream stop.
pub const SRS_ON_UNPUBLISH: &str = "on_unpublish";

/// Why a webhook body could not be turned into a [`StreamHook`].
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),

    #[error("malformed body: {0}")]
    Body(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unexpected action '{0}'")]
    UnexpectedAction(String),
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// nginx-rtmp / srtrelay style callback.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FormHook {
    pub app: Option<String>,
    pub name: Option<String>,
    pub pwd: Option<String>,
    pub call: Option<String>,
}

/// SRS style callback. SRS sends more fields (client_id, ip, vhost, ...);
/// they are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SrsHook {
    pub action: String,
    pub app: String,
    pub stream: String,
    #[serde(default)]
    pub param: String,
}

/// What the media server says happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Publish,
    Unpublish,
    Other(String),
}

/// A webhook callback independent of its wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHook {
    pub application: String,
    pub name: String,
    pub password: Option<String>,
    pub action: HookAction,
}

/// A parsed webhook body, tagged by wire format.
#[derive(Debug, Clone)]
pub enum HookRequest {
    Form(FormHook),
    Srs(SrsHook),
}

impl HookRequest {
    /// Normalize into a [`StreamHook`].
    pub fn normalize(self) -> Result<StreamHook, HookError> {
        match self {
            HookRequest::Form(form) => {
                let application = form
                    .app
                    .filter(|s| !s.is_empty())
                    .ok_or(HookError::MissingField("app"))?;
                let name = form
                    .name
                    .filter(|s| !s.is_empty())
                    .ok_or(HookError::MissingField("name"))?;
                let call = form
                    .call
                    .filter(|s| !s.is_empty())
                    .ok_or(HookError::MissingField("call"))?;
                let action = match call.as_str() {
                    CALL_PUBLISH => HookAction::Publish,
                    CALL_PUBLISH_DONE => HookAction::Unpublish,
                    _ => HookAction::Other(call),
                };
                Ok(StreamHook {
                    application,
                    name,
                    password: normalize_password(form.pwd),
                    action,
                })
            }
            HookRequest::Srs(srs) => {
                if srs.app.is_empty() {
                    return Err(HookError::MissingField("app"));
                }
                if srs.stream.is_empty() {
                    return Err(HookError::MissingField("stream"));
                }
                let action = match srs.action.as_str() {
                    SRS_ON_PUBLISH => HookAction::Publish,
                    SRS_ON_UNPUBLISH => HookAction::Unpublish,
                    other => HookAction::Other(other.to_string()),
                };
                Ok(StreamHook {
                    application: srs.app,
                    name: srs.stream,
                    password: password_from_param(&srs.param),
                    action,
                })
            }
        }
    }

    /// The hook if it asks to start a stream.
    ///
    /// `Ok(None)` means the form `call` names some other event, which is not
    /// this handler's concern. SRS calls carry an explicit action, and anything
    /// but `on_publish` is rejected.
    pub fn into_publish(self) -> Result<Option<StreamHook>, HookError> {
        let strict = matches!(self, HookRequest::Srs(_));
        let hook = self.normalize()?;
        match &hook.action {
            HookAction::Publish => Ok(Some(hook)),
            HookAction::Unpublish if strict => {
                Err(HookError::UnexpectedAction(SRS_ON_UNPUBLISH.to_string()))
            }
            HookAction::Other(action) if strict => Err(HookError::UnexpectedAction(action.clone())),
            _ => Ok(None),
        }
    }

    /// The hook if it reports a stream stop; `Ok(None)` for every other event.
    pub fn into_unpublish(self) -> Result<Option<StreamHook>, HookError> {
        let hook = self.normalize()?;
        Ok((hook.action == HookAction::Unpublish).then_some(hook))
    }
}

/// Extract `pwd` from an SRS `param` such as `?pwd=secret&foo=bar`.
pub fn password_from_param(param: &str) -> Option<String> {
    let query = param.strip_prefix('?').unwrap_or(param);
    let password = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "pwd")
        .map(|(_, value)| value.into_owned());
    normalize_password(password)
}

impl<S> FromRequest<S> for HookRequest
where
    S: Send + Sync,
{
    type Rejection = HookError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mime = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match mime.as_str() {
            "application/json" => {
                let Json(hook) = Json::<SrsHook>::from_request(req, state)
                    .await
                    .map_err(|e| HookError::Body(e.body_text()))?;
                Ok(HookRequest::Srs(hook))
            }
            "application/x-www-form-urlencoded" => {
                let Form(hook) = Form::<FormHook>::from_request(req, state)
                    .await
                    .map_err(|e| HookError::Body(e.body_text()))?;
                Ok(HookRequest::Form(hook))
            }
            _ => Err(HookError::UnsupportedContentType(mime)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn form(call: &str) -> HookRequest {
        HookRequest::Form(FormHook {
            app: Some("live".into()),
            name: Some("key1".into()),
            pwd: Some("secret".into()),
            call: Some(call.into()),
        })
    }

    fn srs(action: &str, param: &str) -> HookRequest {
        HookRequest::Srs(SrsHook {
            action: action.into(),
            app: "live".into(),
            stream: "key1".into(),
            param: param.into(),
        })
    }

    #[test]
    fn test_form_and_srs_normalize_identically() {
        let a = form("publish").normalize().unwrap();
        let b = srs("on_publish", "?pwd=secret").normalize().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.action, HookAction::Publish);
        assert_eq!(a.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_password_from_param() {
        assert_eq!(password_from_param("?pwd=secret").as_deref(), Some("secret"));
        assert_eq!(
            password_from_param("vhost=x&pwd=a%20b").as_deref(),
            Some("a b")
        );
        assert_eq!(password_from_param(""), None);
        assert_eq!(password_from_param("?pwd="), None);
        assert_eq!(password_from_param("?other=1"), None);
    }

    #[test]
    fn test_into_publish() {
        assert!(form("publish").into_publish().unwrap().is_some());
        assert!(form("play").into_publish().unwrap().is_none());
        assert!(form("publish_done").into_publish().unwrap().is_none());
        assert!(srs("on_publish", "").into_publish().unwrap().is_some());
        assert!(matches!(
            srs("on_play", "").into_publish(),
            Err(HookError::UnexpectedAction(_))
        ));
        assert!(matches!(
            srs("on_unpublish", "").into_publish(),
            Err(HookError::UnexpectedAction(_))
        ));
    }

    #[test]
    fn test_into_unpublish() {
        assert!(form("publish_done").into_unpublish().unwrap().is_some());
        assert!(form("publish").into_unpublish().unwrap().is_none());
        assert!(srs("on_unpublish", "").into_unpublish().unwrap().is_some());
        assert!(srs("on_dvr", "").into_unpublish().unwrap().is_none());
    }

    #[test]
    fn test_form_missing_fields() {
        let hook = HookRequest::Form(FormHook {
            app: Some("live".into()),
            call: Some("publish".into()),
            ..Default::default()
        });
        assert!(matches!(
            hook.normalize(),
            Err(HookError::MissingField("name"))
        ));

        let hook = HookRequest::Form(FormHook {
            app: Some("live".into()),
            name: Some("key1".into()),
            pwd: Some("secret".into()),
            call: None,
        });
        assert!(matches!(
            hook.into_publish(),
            Err(HookError::MissingField("call"))
        ));
        assert!(matches!(
            form("").into_unpublish(),
            Err(HookError::MissingField("call"))
        ));
    }

    #[tokio::test]
    async fn test_extract_by_content_type() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("app=live&name=key1&pwd=secret&call=publish"))
            .unwrap();
        let parsed = HookRequest::from_request(req, &()).await.unwrap();
        assert!(matches!(parsed, HookRequest::Form(_)));

        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json; charset=utf-8")
            .body(Body::from(
                r#"{"action":"on_publish","client_id":"x1","app":"live","stream":"key1","param":"?pwd=secret"}"#,
            ))
            .unwrap();
        let parsed = HookRequest::from_request(req, &()).await.unwrap();
        assert!(matches!(parsed, HookRequest::Srs(_)));

        let req = Request::builder()
            .method("POST")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        assert!(matches!(
            HookRequest::from_request(req, &()).await,
            Err(HookError::UnsupportedContentType(_))
        ));

        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        assert!(matches!(
            HookRequest::from_request(req, &()).await,
            Err(HookError::Body(_))
        ));
    }
}
