/// JWT Authentication Middleware
///
/// Reads the access-token cookie, resolves it to a user id through the
/// `SessionManager`, and injects an `AuthenticatedUser` into the request
/// extensions for route handlers. It never falls back to the refresh cookie:
/// an expired access token is a 401 and the client must call `/refresh`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::cookies::{read_cookie, ACCESS_TOKEN_COOKIE};
use crate::auth::{SessionManager, UserId};
use crate::error::AppError;

/// The caller, as established by a valid access-token cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    sessions: web::Data<SessionManager>,
}

impl JwtMiddleware {
    pub fn new(sessions: web::Data<SessionManager>) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    sessions: web::Data<SessionManager>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = read_cookie(req.request(), ACCESS_TOKEN_COOKIE)
            .and_then(|token| self.sessions.authenticate(&token));

        match verdict {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser { user_id });
                tracing::debug!(user_id = %user_id, "Access token validated");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(AppError::from(e).into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_access_token, JwtKeys, ManualClock};
    use crate::configuration::JwtSettings;
    use crate::store::InMemoryUserStore;
    use actix_web::cookie::Cookie;
    use actix_web::{test, App, HttpResponse};
    use chrono::Utc;
    use std::sync::Arc;

    fn keys() -> JwtKeys {
        JwtKeys::from_settings(&JwtSettings {
            access_secret: "middleware-access".to_string(),
            refresh_secret: "middleware-refresh".to_string(),
        })
        .unwrap()
    }

    async fn whoami(caller: web::ReqData<AuthenticatedUser>) -> HttpResponse {
        HttpResponse::Ok().body(caller.user_id.to_string())
    }

    fn sessions(clock: Arc<ManualClock>) -> web::Data<SessionManager> {
        web::Data::new(SessionManager::new(
            Arc::new(InMemoryUserStore::new()),
            keys(),
            clock,
            std::time::Duration::from_secs(1),
        ))
    }

    #[actix_web::test]
    async fn test_access_cookie_reaches_handler() {
        let now = Utc::now();
        let sessions = sessions(Arc::new(ManualClock::new(now)));
        let app = test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;
        let token = issue_access_token(UserId(7), &keys(), now).unwrap();

        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, token.token))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, web::Bytes::from_static(b"7"));
    }

    #[actix_web::test]
    async fn test_missing_or_expired_cookie_is_rejected() {
        let now = Utc::now();
        let clock = Arc::new(ManualClock::new(now));
        let sessions = sessions(clock.clone());
        let app = test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code().as_u16(), 401);

        let token = issue_access_token(UserId(7), &keys(), now).unwrap();
        clock.advance(chrono::Duration::minutes(15));
        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, token.token))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code().as_u16(), 401);
    }
}
