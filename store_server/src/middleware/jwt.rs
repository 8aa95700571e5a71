//! Bearer token middleware.
//!
//! Every request that passes through this middleware must carry `Authorization: Bearer <jwt>`. Valid tokens have their
//! claims placed in the request extensions, where [`JwtClaims`] can extract them and the ACL middleware can read them.
//! Anything else is answered with a 401 before the route runs.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::*;

use crate::{
    auth::{JwtClaims, TokenValidator},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    validator: TokenValidator,
}

impl JwtMiddlewareFactory {
    pub fn new(validator: TokenValidator) -> Self {
        JwtMiddlewareFactory { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { validator: self.validator.clone(), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    validator: TokenValidator,
    service: Rc<S>,
}

impl<S> JwtMiddlewareService<S> {
    fn claims_for(&self, req: &ServiceRequest) -> Result<JwtClaims, AuthError> {
        let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
        let header = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = TokenValidator::bearer_token(header)?;
        self.validator.validate(token)
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = self.claims_for(&req);
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    trace!("🔐️ Token accepted for customer {} ({})", claims.sub, claims.role);
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                },
                Err(e) => {
                    info!("🔐️ Rejecting {} {}. {e}", req.method(), req.path());
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}
