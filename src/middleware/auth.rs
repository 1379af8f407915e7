use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::config::Config;
use crate::services::token_service::{self, SESSION_COOKIE};
use crate::utils::error::AppError;

/// Identity decoded from the session cookie, inserted into request
/// extensions by `AuthMiddleware` and pulled out by handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Unauthorized Access".to_string()).into()),
        )
    }
}

/// Guard for cookie-authenticated scopes. Verifies the `token` cookie
/// and rejects the request before it reaches a handler.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => {
                return Box::pin(async move {
                    Err(AppError::Unauthorized("Unauthorized Access".to_string()).into())
                })
            }
        };

        let secret = match req.app_data::<web::Data<Config>>() {
            Some(config) => config.jwt_secret.clone(),
            None => {
                return Box::pin(async move {
                    Err(AppError::Internal("Missing application config".to_string()).into())
                })
            }
        };

        match token_service::verify(&token, &secret) {
            Ok(claims) => {
                let user_id = match claims.sub.parse::<i64>() {
                    Ok(id) => id,
                    Err(_) => {
                        return Box::pin(async move {
                            Err(AppError::Unauthorized("Invalid token".to_string()).into())
                        })
                    }
                };

                req.extensions_mut().insert(AuthUser {
                    user_id,
                    email: claims.email,
                });

                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(_) => Box::pin(async move {
                Err(AppError::Unauthorized("Invalid token".to_string()).into())
            }),
        }
    }
}
