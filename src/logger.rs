use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Id of the request currently being served, when called from inside
/// `LoggerMiddleware`.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Request logging middleware
///
/// Opens a span per request carrying a generated request id, logs when the
/// request starts and when it finishes with status and latency. Cookie and
/// body contents are never logged.
///
/// Errors from inner services are rendered here, inside the request scope, so
/// the error body's `error_id` and the `x-request-id` header match the span.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
        );

        span.in_scope(|| tracing::info!("Request started"));

        let service = self.service.clone();
        let http_req = req.request().clone();
        let header_value = HeaderValue::from_str(&request_id).ok();

        Box::pin(REQUEST_ID.scope(
            request_id,
            async move {
                let mut res = match service.call(req).await {
                    Ok(res) => res.map_into_left_body(),
                    Err(e) => ServiceResponse::new(http_req, e.error_response()).map_into_right_body(),
                };

                if let Some(value) = header_value {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }

                let status = res.status().as_u16();
                let elapsed_ms = start_time.elapsed().as_millis() as u64;
                if status >= 500 {
                    tracing::error!(status, elapsed_ms, "Request failed");
                } else {
                    tracing::info!(status, elapsed_ms, "Request completed");
                }

                Ok(res)
            }
            .instrument(span),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn echo_request_id() -> HttpResponse {
        HttpResponse::Ok().body(current_request_id().unwrap_or_default())
    }

    #[actix_web::test]
    async fn test_request_id_is_shared_with_handler_and_header() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/", web::get().to(echo_request_id)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
        let body = test::read_body(res).await;

        assert_eq!(body, web::Bytes::from(header.clone()));
        assert!(uuid::Uuid::parse_str(&header).is_ok());
    }

    #[::core::prelude::v1::test]
    fn test_no_request_id_outside_requests() {
        assert_eq!(current_request_id(), None);
    }
}
