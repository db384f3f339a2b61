use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::services::identity_service::IdentityVerifier;

/// Identity asserted by a verified bearer token, attached to the request
/// extensions for handlers that need it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DecodedUser {
    pub email: String,
}

/// Fail-open bearer-token gate. A verifiable token records the caller's
/// email in the request extensions; anything else (missing header, malformed
/// header, rejected token, verifier failure) lets the request through
/// unauthenticated. Access control happens in the handlers that read
/// `DecodedUser`, never here.
pub struct VerifyToken {
    verifier: Arc<dyn IdentityVerifier>,
}

impl VerifyToken {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for VerifyToken
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = VerifyTokenMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(VerifyTokenMiddleware {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct VerifyTokenMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl<S, B> Service<ServiceRequest> for VerifyTokenMiddleware<S>
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
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned);

            if let Some(token) = token {
                match verifier.verify_id_token(&token).await {
                    Ok(user) => {
                        req.extensions_mut().insert(user);
                    }
                    Err(e) => {
                        log::debug!("Token verification failed: {}", e);
                    }
                }
            }

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};
    use async_trait::async_trait;

    struct StaticVerifier {
        email: Option<String>,
    }

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify_id_token(&self, _token: &str) -> Result<DecodedUser, String> {
            self.email
                .clone()
                .map(|email| DecodedUser { email })
                .ok_or_else(|| "token rejected".to_string())
        }
    }

    async fn echo_identity(user: Option<web::ReqData<DecodedUser>>) -> HttpResponse {
        match user {
            Some(user) => HttpResponse::Ok().json(serde_json::json!({ "email": user.email })),
            None => HttpResponse::Ok().json(serde_json::json!({ "email": null })),
        }
    }

    fn accepting_verifier() -> Arc<dyn IdentityVerifier> {
        Arc::new(StaticVerifier {
            email: Some("admin@fovia.com".to_string()),
        })
    }

    fn rejecting_verifier() -> Arc<dyn IdentityVerifier> {
        Arc::new(StaticVerifier { email: None })
    }

    async fn probe(
        verifier: Arc<dyn IdentityVerifier>,
        authorization: Option<&str>,
    ) -> serde_json::Value {
        let app = test::init_service(
            App::new().service(
                web::resource("/probe")
                    .wrap(VerifyToken::new(verifier))
                    .route(web::get().to(echo_identity)),
            ),
        )
        .await;

        let mut req = test::TestRequest::get().uri("/probe");
        if let Some(value) = authorization {
            req = req.insert_header(("Authorization", value));
        }

        test::call_and_read_body_json(&app, req.to_request()).await
    }

    #[actix_web::test]
    async fn a_valid_token_records_the_email() {
        let body = probe(accepting_verifier(), Some("Bearer good-token")).await;
        assert_eq!(body["email"], "admin@fovia.com");
    }

    #[actix_web::test]
    async fn a_missing_header_passes_through_unauthenticated() {
        let body = probe(accepting_verifier(), None).await;
        assert_eq!(body["email"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn a_malformed_header_passes_through_unauthenticated() {
        let body = probe(accepting_verifier(), Some("Token abc123")).await;
        assert_eq!(body["email"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn a_rejected_token_passes_through_unauthenticated() {
        let body = probe(rejecting_verifier(), Some("Bearer expired-token")).await;
        assert_eq!(body["email"], serde_json::Value::Null);
    }
}
