use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use admission_shared::UserRole;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::jwt::{Claims, JwtService};

/// Caller identity resolved from a validated access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        Ok(Self {
            user_id: claims.user_id()?,
            role: claims.role,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<Claims>()
            .ok_or_else(|| AppError::Authentication("Authorization token is required".to_string()))
            .and_then(AuthenticatedUser::from_claims);

        ready(user)
    }
}

/// Rejects requests without a valid bearer access token and stores the
/// decoded `Claims` in request extensions for `AuthenticatedUser`.
pub struct AuthMiddleware {
    jwt_service: Rc<JwtService>,
    required_role: Option<UserRole>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service: Rc::new(jwt_service),
            required_role: None,
        }
    }

    pub fn require_role(mut self, role: UserRole) -> Self {
        self.required_role = Some(role);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: Rc<JwtService>,
    required_role: Option<UserRole>,
}

impl<S> AuthMiddlewareService<S> {
    fn authorize(&self, req: &ServiceRequest) -> Result<Claims, AppError> {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_bearer)
            .ok_or_else(|| AppError::Authentication("Authorization token is required".to_string()))?;

        let claims = self.jwt_service.validate_token(token)?;

        if let Some(required) = self.required_role {
            if !claims.role.satisfies(required) {
                return Err(AppError::Authorization(
                    "Insufficient permissions for this operation".to_string(),
                ));
            }
        }

        Ok(claims)
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let claims = match self.authorize(&req) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Rejected {} {}: {}", req.method(), req.path(), e);
                return Box::pin(async move { Err(e.into()) });
            }
        };

        req.extensions_mut().insert(claims);
        let service = self.service.clone();

        Box::pin(async move { service.call(req).await })
    }
}
