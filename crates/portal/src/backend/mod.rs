//! Client for the hosted backend functions.
//!
//! Every piece of business logic (credentials, lead storage, commission
//! attribution, approvals) lives behind these endpoints. Each call is a
//! single request with no retry; failures surface as [`BackendError`] and
//! the caller decides what the user sees.

mod error;
mod types;

pub use error::{BackendError, CONNECTION_ERROR_MESSAGE};
pub use types::{
    Empty, LeadUpdate, LoginResponse, NewLead, PartnerLeads, Registered, Registration,
};

use partner_portal_core::{Email, Lead, Partner, PartnerDecision, PartnerId};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::BackendConfig;
use types::{
    Envelope, ErrorBody, LeadUpdateData, LeadsData, LoginRequest, ManagePartnerRequest,
    PartnersData, RegisterData,
};

/// Header carrying the caller's email on mutating calls.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Hosted backend client.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    endpoints: BackendConfig,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("partner-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoints: config.clone(),
        })
    }

    /// Submit a partner application.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend refuses it.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<Registered, BackendError> {
        let request = self
            .client
            .post(self.endpoints.register_url.clone())
            .json(registration);

        let envelope: Envelope<RegisterData> = self.send(request).await?;
        Ok(Registered {
            partner_id: envelope.data.partner_id,
            message: envelope.message,
        })
    }

    /// Exchange credentials for a partner identity and session token.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credentials are refused.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, BackendError> {
        let request = self
            .client
            .post(self.endpoints.login_url.clone())
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            });

        let envelope: Envelope<LoginResponse> = self.send(request).await?;
        Ok(envelope.data)
    }

    /// List every partner. Admin only.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn list_partners(&self, admin_id: PartnerId) -> Result<Vec<Partner>, BackendError> {
        let request = self
            .client
            .get(self.endpoints.partners_url.clone())
            .query(&[("admin_id", admin_id.as_i64())]);

        let envelope: Envelope<PartnersData> = self.send(request).await?;
        Ok(envelope.data.partners)
    }

    /// Approve or reject a pending partner.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend refuses the decision.
    #[instrument(skip(self, decision), fields(partner_id = %decision.partner_id(), action = %decision.action()))]
    pub async fn manage_partner(
        &self,
        admin_email: &Email,
        decision: &PartnerDecision,
    ) -> Result<(), BackendError> {
        let body = ManagePartnerRequest {
            partner_id: decision.partner_id(),
            action: decision.action(),
            password: decision.password().map(|p| p.expose()),
        };
        let request = self
            .client
            .post(self.endpoints.partners_url.clone())
            .header(USER_ID_HEADER, admin_email.as_str())
            .json(&body);

        let _: Envelope<Empty> = self.send(request).await?;
        Ok(())
    }

    /// A partner's leads with the backend's statistics.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_leads(&self, partner_id: PartnerId) -> Result<PartnerLeads, BackendError> {
        let request = self
            .client
            .get(self.endpoints.leads_url.clone())
            .query(&[("partner_id", partner_id.as_i64())]);

        let envelope: Envelope<PartnerLeads> = self.send(request).await?;
        Ok(envelope.data)
    }

    /// Submit a new lead on behalf of a partner.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend refuses the lead.
    #[instrument(skip(self, lead))]
    pub async fn create_lead(&self, partner_email: &Email, lead: &NewLead) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.endpoints.create_lead_url.clone())
            .header(USER_ID_HEADER, partner_email.as_str())
            .json(lead);

        let _: Envelope<Empty> = self.send(request).await?;
        Ok(())
    }

    /// Every lead with partner attribution. Admin only.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_all_leads(&self, admin_id: PartnerId) -> Result<Vec<Lead>, BackendError> {
        let admin_id = admin_id.to_string();
        let request = self
            .client
            .get(self.endpoints.admin_leads_url.clone())
            .query(&[("action", "leads"), ("admin_id", admin_id.as_str())]);

        let envelope: Envelope<LeadsData> = self.send(request).await?;
        Ok(envelope.data.leads)
    }

    /// Change a lead's status and commission. Admin only.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend refuses the update.
    #[instrument(skip(self, update), fields(lead_id = %update.lead_id, status = %update.status))]
    pub async fn update_lead(
        &self,
        admin_email: &Email,
        update: &LeadUpdate,
    ) -> Result<Option<Lead>, BackendError> {
        let request = self
            .client
            .put(self.endpoints.admin_leads_url.clone())
            .header(USER_ID_HEADER, admin_email.as_str())
            .json(update);

        let envelope: Envelope<LeadUpdateData> = self.send(request).await?;
        Ok(envelope.data.lead)
    }

    /// Send a request and decode the envelope.
    ///
    /// Non-2xx responses become [`BackendError::Api`]; a 2xx response with
    /// `success: false` becomes [`BackendError::Rejected`].
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message);
            tracing::warn!(status = status.as_u16(), message = ?message, "Backend returned an error");
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Some functions answer with an empty body
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &body
        };

        let envelope: Envelope<T> =
            serde_json::from_slice(body).map_err(|e| BackendError::Decode(e.to_string()))?;

        if envelope.success == Some(false) {
            let message = ErrorBody {
                error: envelope.error,
                message: envelope.message,
            }
            .into_message();
            tracing::warn!(message = ?message, "Backend rejected the request");
            return Err(BackendError::Rejected { message });
        }

        Ok(envelope)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> BackendClient {
        let url = |p: &str| Url::parse(&format!("{}{p}", server.uri())).unwrap();
        BackendClient::new(&BackendConfig {
            register_url: url("/register"),
            login_url: url("/login"),
            partners_url: url("/partners"),
            leads_url: url("/leads"),
            create_lead_url: url("/create-lead"),
            admin_leads_url: url("/partners"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({"email": "a@a.com", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "partner": {"id": 3, "name": "A", "email": "a@a.com"},
                "session_token": "tok",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .login("a@a.com", &SecretString::from("secret"))
            .await
            .unwrap();
        assert_eq!(response.partner.id, PartnerId::new(3));
        assert_eq!(response.session_token, "tok");
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid"})))
            .mount(&server)
            .await;

        let err = client(&server)
            .login("a@a.com", &SecretString::from("x"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message("fallback"), "Invalid");
    }

    #[tokio::test]
    async fn test_success_false_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/partners"))
            .and(query_param("admin_id", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Доступ запрещён"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .list_partners(PartnerId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
        assert_eq!(err.user_message("fallback"), "Доступ запрещён");
    }

    #[tokio::test]
    async fn test_empty_body_counts_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let registered = client(&server)
            .register(&Registration::default())
            .await
            .unwrap();
        assert!(registered.partner_id.is_none());
        assert!(registered.message.is_none());
    }

    #[tokio::test]
    async fn test_mutations_carry_user_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/partners"))
            .and(header(USER_ID_HEADER, "admin@example.com"))
            .and(body_json(json!({"partner_id": 5, "action": "reject"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let admin = Email::parse("admin@example.com").unwrap();
        client(&server)
            .manage_partner(&admin, &PartnerDecision::Reject {
                partner_id: PartnerId::new(5),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/leads"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_leads(PartnerId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
        assert_eq!(err.user_message("Не удалось"), "Не удалось");
    }
}
