//! Bearer-token authentication middleware.
//!
//! Every route except the ones in `constants::IGNORE_ROUTES` requires a
//! valid JWT in the `Authorization` header. The secret comes from the
//! `JWT_SECRET` environment variable.

use std::env;
use std::future::{ready, Future, Ready};
use std::pin::Pin;

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error, HttpResponse,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{constants, models::response::ResponseBody};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: usize,
}

fn verify_token(token: &str) -> bool {
    let secret = match env::var("JWT_SECRET") {
        Ok(secret) => secret,
        Err(_) => {
            log::error!("JWT_SECRET is not set, refusing all tokens");
            return false;
        }
    };

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .is_ok()
}

pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware { service }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let mut authenticated = Method::OPTIONS == *req.method();
        let mut missing_token = false;

        for ignored_route in constants::IGNORE_ROUTES.iter() {
            if req.path().starts_with(ignored_route) {
                authenticated = true;
                break;
            }
        }

        if !authenticated {
            match req
                .headers()
                .get(constants::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
            {
                Some(value) if value.to_lowercase().starts_with("bearer ") => {
                    let token = value[7..].trim();
                    authenticated = verify_token(token);
                }
                Some(_) => {}
                None => missing_token = true,
            }
        }

        if !authenticated {
            let (request, _pl) = req.into_parts();
            let message = if missing_token {
                constants::MESSAGE_TOKEN_MISSING
            } else {
                constants::MESSAGE_INVALID_TOKEN
            };
            let response = HttpResponse::Unauthorized()
                .json(ResponseBody::new(message, constants::EMPTY))
                .map_into_right_body();

            return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
