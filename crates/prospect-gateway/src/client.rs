//! Async webhook client.

use std::time::Duration;

use prospect_core::{
  lead::Lead,
  remote::{EmailRequest, LeadSearch, RemoteActions, SendRequest},
};
use reqwest::{Client, Response, Url};
use serde::Serialize;

use crate::{
  config::WebhookConfig,
  error::{Action, Error, Result},
  wire::{EmailGenerationBody, LeadGenerationBody, LeadsEnvelope, SendEmailBody},
};

/// Longest slice of an error response body carried into the error message.
const MAX_ERROR_BODY: usize = 300;

/// Webhook-backed [`RemoteActions`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WebhookGateway {
  client:           Client,
  lead_generation:  Url,
  email_generation: Url,
  send_email:       Url,
}

fn parse_url(raw: &str) -> Result<Url> {
  Url::parse(raw).map_err(|e| Error::InvalidUrl { url: raw.to_owned(), reason: e.to_string() })
}

impl WebhookGateway {
  pub fn new(config: &WebhookConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(Error::Client)?;
    Ok(Self {
      client,
      lead_generation: parse_url(&config.lead_generation_url)?,
      email_generation: parse_url(&config.email_generation_url)?,
      send_email: parse_url(&config.send_email_url)?,
    })
  }

  /// `POST` a JSON body and fail on anything but 2xx.
  async fn post<B: Serialize>(&self, action: Action, url: &Url, body: &B) -> Result<Response> {
    tracing::debug!(%action, %url, "calling webhook");
    let resp = self
      .client
      .post(url.clone())
      .json(body)
      .send()
      .await
      .map_err(|source| Error::Transport { action, source })?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = match text.trim() {
      "" => status.canonical_reason().unwrap_or("no response body").to_owned(),
      t => t.chars().take(MAX_ERROR_BODY).collect(),
    };
    Err(Error::Status { action, status: status.as_u16(), message })
  }
}

impl RemoteActions for WebhookGateway {
  type Error = Error;

  async fn generate_leads(&self, search: &LeadSearch) -> Result<Vec<Lead>> {
    let action = Action::GenerateLeads;
    let resp = self
      .post(action, &self.lead_generation, &LeadGenerationBody::from(search))
      .await?;
    let bytes = resp.bytes().await.map_err(|source| Error::Transport { action, source })?;
    let envelope: LeadsEnvelope = serde_json::from_slice(&bytes).map_err(Error::UnexpectedLeads)?;

    let (wire_leads, count_hint) = envelope.into_parts();
    let received = wire_leads.len();
    let leads: Vec<Lead> = wire_leads
      .into_iter()
      .map(|w| w.into_lead())
      .filter(|lead| {
        if !lead.has_email() {
          tracing::warn!(lead = %lead.id, name = %lead.name, "dropping generated lead without an email");
        }
        lead.has_email()
      })
      .collect();

    if let Some(hint) = count_hint
      && hint != received as u64
    {
      tracing::debug!(hint, received, "lead count hint differs from leads received");
    }
    tracing::info!(requested = search.lead_count(), received, kept = leads.len(), "leads generated");
    Ok(leads)
  }

  async fn generate_email(&self, request: &EmailRequest) -> Result<String> {
    let action = Action::GenerateEmail;
    let resp = self
      .post(action, &self.email_generation, &EmailGenerationBody::from(request))
      .await?;
    resp.text().await.map_err(|source| Error::Transport { action, source })
  }

  async fn send_email(&self, request: &SendRequest) -> Result<()> {
    self
      .post(Action::SendEmail, &self.send_email, &SendEmailBody::from(request))
      .await?;
    tracing::info!(lead = %request.lead_id, to = %request.to_email, "email sent");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use prospect_core::{
    draft::{EmailContent, Tone},
    lead::UserId,
    remote::LeadBrief,
  };
  use serde_json::json;
  use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{body_json, header, method, path},
  };

  use super::*;

  fn gateway(server: &MockServer) -> WebhookGateway {
    WebhookGateway::new(&WebhookConfig {
      lead_generation_url:  format!("{}/lead-generation", server.uri()),
      email_generation_url: format!("{}/email-generation", server.uri()),
      send_email_url:       format!("{}/send-email", server.uri()),
      timeout_secs:         5,
    })
    .unwrap()
  }

  fn user() -> UserId { UserId::new("user-1") }

  #[tokio::test]
  async fn generate_leads_accepts_bare_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/lead-generation"))
      .and(header("content-type", "application/json"))
      .and(body_json(json!({ "description": "SaaS founders", "leadCount": 2, "user_id": "user-1" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "a", "name": "Ann", "company": "Acme", "email": "ann@acme.test" },
        { "id": "b", "name": "Ben", "company": "Beta", "email": "ben@beta.test" },
      ])))
      .expect(1)
      .mount(&server)
      .await;

    let search = LeadSearch::new("SaaS founders", 2, user()).unwrap();
    let leads = gateway(&server).generate_leads(&search).await.unwrap();
    assert_eq!(leads.len(), 2);
    assert_eq!(leads[1].company, "Beta");
  }

  #[tokio::test]
  async fn generate_leads_accepts_wrapped_list_and_drops_addressless() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/lead-generation"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "leads": [
          { "name": "Ann", "email": "ann@acme.test", "linkedinUrl": "https://li.test/ann" },
          { "name": "No Mail", "email": "" },
        ],
        "leads_count": 2,
      })))
      .mount(&server)
      .await;

    let search = LeadSearch::new("anyone", 2, user()).unwrap();
    let leads = gateway(&server).generate_leads(&search).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].name, "Ann");
    assert_eq!(leads[0].linkedin_url.as_deref(), Some("https://li.test/ann"));
  }

  #[tokio::test]
  async fn generate_leads_rejects_unknown_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "queued" })))
      .mount(&server)
      .await;

    let search = LeadSearch::new("anyone", 1, user()).unwrap();
    let err = gateway(&server).generate_leads(&search).await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedLeads(_)));
  }

  #[tokio::test]
  async fn generate_email_returns_payload_verbatim() {
    let server = MockServer::start().await;
    let payload = r#"[{"output":{"Subject Line":"Hi","Email Body":"Hello"}}]"#;
    Mock::given(method("POST"))
      .and(path("/email-generation"))
      .and(body_json(json!({
        "lead_data": {
          "name": "Ann", "title": "CEO", "company": "Acme",
          "location": null, "snippet": "Runs Acme",
        },
        "tone": "funny",
        "user_id": "user-1",
      })))
      .respond_with(ResponseTemplate::new(200).set_body_string(payload))
      .mount(&server)
      .await;

    let request = EmailRequest {
      lead: LeadBrief {
        name:     "Ann".into(),
        title:    "CEO".into(),
        company:  "Acme".into(),
        location: None,
        snippet:  Some("Runs Acme".into()),
      },
      tone: Tone::Funny,
      user: user(),
    };
    let raw = gateway(&server).generate_email(&request).await.unwrap();
    assert_eq!(raw, payload);
  }

  #[tokio::test]
  async fn send_email_posts_decoded_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/send-email"))
      .and(body_json(json!({
        "to_email": "ann@acme.test",
        "to_name": "Ann",
        "subject": "Hi",
        "body": "Hello",
        "user_id": "user-1",
        "lead_id": "a",
      })))
      .respond_with(ResponseTemplate::new(202))
      .expect(1)
      .mount(&server)
      .await;

    let lead = Lead::new("a".into(), "Ann", "CEO", "Acme", "ann@acme.test");
    let request = SendRequest::new(&lead, EmailContent::new("Hi", "Hello"), user()).unwrap();
    gateway(&server).send_email(&request).await.unwrap();
  }

  #[tokio::test]
  async fn non_success_status_is_reported_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/send-email"))
      .respond_with(ResponseTemplate::new(500).set_body_string("mailbox unavailable"))
      .expect(1)
      .mount(&server)
      .await;

    let lead = Lead::new("a".into(), "Ann", "CEO", "Acme", "ann@acme.test");
    let request = SendRequest::new(&lead, EmailContent::new("Hi", "Hello"), user()).unwrap();
    let err = gateway(&server).send_email(&request).await.unwrap_err();
    match &err {
      Error::Status { action, status, message } => {
        assert_eq!(*action, Action::SendEmail);
        assert_eq!(*status, 500);
        assert_eq!(message, "mailbox unavailable");
      }
      other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "sending the email failed (HTTP 500): mailbox unavailable");
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_a_transport_error() {
    let gateway = WebhookGateway::new(&WebhookConfig {
      lead_generation_url:  "http://127.0.0.1:9/lead-generation".into(),
      email_generation_url: "http://127.0.0.1:9/email-generation".into(),
      send_email_url:       "http://127.0.0.1:9/send-email".into(),
      timeout_secs:         2,
    })
    .unwrap();
    let search = LeadSearch::new("anyone", 1, user()).unwrap();
    let err = gateway.generate_leads(&search).await.unwrap_err();
    assert!(matches!(err, Error::Transport { action: Action::GenerateLeads, .. }));
  }

  #[test]
  fn invalid_url_is_rejected_up_front() {
    let err = WebhookGateway::new(&WebhookConfig {
      lead_generation_url:  "not a url".into(),
      email_generation_url: "http://x.test".into(),
      send_email_url:       "http://x.test".into(),
      timeout_secs:         5,
    })
    .err()
    .unwrap();
    assert!(matches!(err, Error::InvalidUrl { .. }));
  }
}
