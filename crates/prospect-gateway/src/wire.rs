//! Request and response bodies exchanged with the webhooks.

use prospect_core::{
  draft::Tone,
  lead::{Lead, LeadId},
  remote::{EmailRequest, LeadBrief, LeadSearch, SendRequest},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LeadGenerationBody<'a> {
  pub description: &'a str,
  #[serde(rename = "leadCount")]
  pub lead_count:  u32,
  pub user_id:     &'a str,
}

impl<'a> From<&'a LeadSearch> for LeadGenerationBody<'a> {
  fn from(search: &'a LeadSearch) -> Self {
    Self {
      description: search.criteria(),
      lead_count:  search.lead_count(),
      user_id:     search.user().as_str(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct EmailGenerationBody<'a> {
  pub lead_data: &'a LeadBrief,
  pub tone:      Tone,
  pub user_id:   &'a str,
}

impl<'a> From<&'a EmailRequest> for EmailGenerationBody<'a> {
  fn from(request: &'a EmailRequest) -> Self {
    Self {
      lead_data: &request.lead,
      tone:      request.tone,
      user_id:   request.user.as_str(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct SendEmailBody<'a> {
  pub to_email: &'a str,
  pub to_name:  &'a str,
  pub subject:  &'a str,
  pub body:     &'a str,
  pub user_id:  &'a str,
  pub lead_id:  &'a str,
}

impl<'a> From<&'a SendRequest> for SendEmailBody<'a> {
  fn from(request: &'a SendRequest) -> Self {
    Self {
      to_email: &request.to_email,
      to_name:  &request.to_name,
      subject:  &request.content.subject,
      body:     &request.content.body,
      user_id:  request.user.as_str(),
      lead_id:  request.lead_id.as_str(),
    }
  }
}

// ─── Lead-generation response ────────────────────────────────────────────────

/// The lead service answers with either a bare list or a wrapped list plus a
/// count hint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LeadsEnvelope {
  Bare(Vec<WireLead>),
  Wrapped {
    leads:       Vec<WireLead>,
    #[serde(default)]
    leads_count: Option<u64>,
  },
}

impl LeadsEnvelope {
  pub fn into_parts(self) -> (Vec<WireLead>, Option<u64>) {
    match self {
      Self::Bare(leads) => (leads, None),
      Self::Wrapped { leads, leads_count } => (leads, leads_count),
    }
  }
}

/// A lead as the service emits it: ids may be missing or numeric, and any
/// field may be absent or null.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireLead {
  pub id:             Option<Value>,
  pub name:           Option<String>,
  pub title:          Option<String>,
  pub company:        Option<String>,
  pub location:       Option<String>,
  pub email:          Option<String>,
  #[serde(alias = "linkedinUrl")]
  pub linkedin_url:   Option<String>,
  pub snippet:        Option<String>,
  #[serde(alias = "companyDomain")]
  pub company_domain: Option<String>,
  #[serde(alias = "imageUrl")]
  pub image_url:      Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

impl WireLead {
  pub fn into_lead(self) -> Lead {
    let id = match self.id {
      Some(Value::String(s)) if !s.trim().is_empty() => LeadId::new(s.trim()),
      Some(Value::Number(n)) => LeadId::new(n.to_string()),
      _ => LeadId::generate(),
    };
    Lead {
      id,
      name: self.name.unwrap_or_default(),
      title: self.title.unwrap_or_default(),
      company: self.company.unwrap_or_default(),
      location: non_blank(self.location),
      email: self.email.map(|e| e.trim().to_owned()).unwrap_or_default(),
      linkedin_url: non_blank(self.linkedin_url),
      snippet: non_blank(self.snippet),
      company_domain: non_blank(self.company_domain),
      image_url: non_blank(self.image_url),
    }
  }
}

#[cfg(test)]
mod tests {
  use prospect_core::lead::UserId;
  use serde_json::json;

  use super::*;

  #[test]
  fn bare_and_wrapped_envelopes_parse() {
    let bare: LeadsEnvelope = serde_json::from_value(json!([{ "name": "A" }])).unwrap();
    assert_eq!(bare.into_parts().0.len(), 1);

    let wrapped: LeadsEnvelope =
      serde_json::from_value(json!({ "leads": [{ "name": "A" }, { "name": "B" }], "leads_count": 2 }))
        .unwrap();
    let (leads, count) = wrapped.into_parts();
    assert_eq!(leads.len(), 2);
    assert_eq!(count, Some(2));
  }

  #[test]
  fn ids_are_normalised() {
    let numeric: WireLead = serde_json::from_value(json!({ "id": 42 })).unwrap();
    assert_eq!(numeric.into_lead().id.as_str(), "42");

    let missing = WireLead::default().into_lead();
    assert!(!missing.id.as_str().is_empty());

    let nulls: WireLead =
      serde_json::from_value(json!({ "id": "x", "name": null, "linkedinUrl": "" })).unwrap();
    let lead = nulls.into_lead();
    assert_eq!(lead.name, "");
    assert_eq!(lead.linkedin_url, None);
  }

  #[test]
  fn lead_generation_body_uses_service_keys() {
    let search = LeadSearch::new("Fintech CFOs", 5, UserId::new("u1")).unwrap();
    let body = serde_json::to_value(LeadGenerationBody::from(&search)).unwrap();
    assert_eq!(body, json!({ "description": "Fintech CFOs", "leadCount": 5, "user_id": "u1" }));
  }
}
