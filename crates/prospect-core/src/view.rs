//! Search, status filter and pagination over a lead collection.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::lifecycle::{LeadRecord, LeadStatus};

/// Rows per page.
pub const PAGE_SIZE: usize = 10;

// ─── Status filter ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum StatusFilter {
  #[default]
  All,
  Sent,
  Generated,
  NoEmail,
}

impl StatusFilter {
  pub fn admits(self, status: LeadStatus) -> bool {
    match self {
      Self::All => true,
      Self::Sent => status == LeadStatus::EmailSent,
      Self::Generated => status == LeadStatus::EmailGenerated,
      Self::NoEmail => status == LeadStatus::NoEmail,
    }
  }
}

// ─── Query state ─────────────────────────────────────────────────────────────

/// The list view's inputs: search text, status filter and 1-based page.
///
/// Changing the search text or the filter resets to page 1. The page is
/// re-clamped every time the view is applied, so a shrinking result set
/// never leaves it pointing past the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
  search: String,
  status: StatusFilter,
  page:   usize,
}

impl ListView {
  pub fn new(search: impl Into<String>, status: StatusFilter, page: usize) -> Self {
    Self { search: search.into(), status, page: page.max(1) }
  }

  pub fn search(&self) -> &str { &self.search }

  pub fn status(&self) -> StatusFilter { self.status }

  pub fn page(&self) -> usize { self.page.max(1) }

  pub fn set_search(&mut self, search: impl Into<String>) {
    self.search = search.into();
    self.page = 1;
  }

  pub fn set_status(&mut self, status: StatusFilter) {
    self.status = status;
    self.page = 1;
  }

  pub fn set_page(&mut self, page: usize) { self.page = page.max(1); }

  pub fn next_page(&mut self) { self.page = self.page() + 1; }

  pub fn prev_page(&mut self) { self.page = self.page().saturating_sub(1).max(1); }

  /// Filter and slice `records`, clamping the stored page into range.
  pub fn apply<'a, R>(&mut self, records: &'a [R]) -> LeadPage<'a, R>
  where
    R: Borrow<LeadRecord>,
  {
    let needle = self.search.trim().to_lowercase();
    let matched: Vec<&'a R> = records
      .iter()
      .filter(|r| {
        let record: &LeadRecord = (*r).borrow();
        matches_search(record, &needle) && self.status.admits(record.status())
      })
      .collect();

    let total = matched.len();
    let total_pages = total.div_ceil(PAGE_SIZE);
    self.page = self.page().min(total_pages.max(1));

    let items = matched
      .into_iter()
      .skip((self.page - 1) * PAGE_SIZE)
      .take(PAGE_SIZE)
      .collect();

    LeadPage { items, page: self.page, total_pages, total }
  }
}

/// Case-insensitive substring match over name, company and title. An empty
/// needle matches everything.
fn matches_search(record: &LeadRecord, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  let lead = &record.lead;
  [&lead.name, &lead.company, &lead.title]
    .into_iter()
    .any(|field| field.to_lowercase().contains(needle))
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One page of the filtered collection.
#[derive(Debug)]
pub struct LeadPage<'a, R> {
  pub items:       Vec<&'a R>,
  /// 1-based, always within `1..=max(total_pages, 1)`.
  pub page:        usize,
  pub total_pages: usize,
  /// Number of records that matched, across all pages.
  pub total:       usize,
}

impl<R> LeadPage<'_, R> {
  /// The "no results" state.
  pub fn is_empty(&self) -> bool { self.total == 0 }

  pub fn has_next(&self) -> bool { self.page < self.total_pages }

  pub fn has_prev(&self) -> bool { self.page > 1 }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::Utc;

  use super::*;
  use crate::{
    draft::{EmailContent, EmailDraft, Tone},
    lead::{Lead, UserId},
  };

  fn record(id: &str, name: &str, company: &str, title: &str) -> LeadRecord {
    LeadRecord::new(
      Lead::new(id.into(), name, title, company, format!("{id}@example.test")),
      UserId::new("u"),
      Utc::now(),
    )
  }

  fn drafted(r: LeadRecord) -> LeadRecord {
    r.with_draft(EmailDraft::generated(EmailContent::new("s", "b"), Tone::Formal, String::new()))
      .unwrap()
  }

  fn many(n: usize) -> Vec<LeadRecord> {
    (0..n).map(|i| record(&format!("l{i}"), &format!("Lead {i}"), "Corp", "VP")).collect()
  }

  #[test]
  fn search_matches_company_case_insensitively() {
    let leads = vec![record("a", "Alice", "Acme", "CEO"), record("b", "Bob", "Beta", "CTO")];
    let mut view = ListView::default();
    view.set_search("ac");
    let page = view.apply(&leads);
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].lead.name, "Alice");
  }

  #[test]
  fn search_covers_name_and_title() {
    let leads = vec![record("a", "Alice", "Acme", "CEO"), record("b", "Bob", "Beta", "CTO")];
    let mut view = ListView::default();
    view.set_search("BOB");
    assert_eq!(view.apply(&leads).total, 1);
    view.set_search("c");
    assert_eq!(view.apply(&leads).total, 2);
    view.set_search("cto");
    assert_eq!(view.apply(&leads).items[0].lead.name, "Bob");
  }

  #[test]
  fn status_filter_uses_derived_status() {
    let sent = drafted(record("s", "Sam", "Acme", "CEO")).mark_sent(Utc::now()).unwrap();
    let generated = drafted(record("g", "Gil", "Acme", "CEO"));
    let raw = record("r", "Rae", "Acme", "CEO");
    let leads = vec![sent, generated, raw];

    let mut view = ListView::default();
    for (filter, expected) in [
      (StatusFilter::Sent, "Sam"),
      (StatusFilter::Generated, "Gil"),
      (StatusFilter::NoEmail, "Rae"),
    ] {
      view.set_status(filter);
      let page = view.apply(&leads);
      assert_eq!(page.total, 1, "{filter}");
      assert_eq!(page.items[0].lead.name, expected);
    }
    view.set_status(StatusFilter::All);
    assert_eq!(view.apply(&leads).total, 3);
  }

  #[test]
  fn search_and_status_combine() {
    let leads = vec![
      drafted(record("a", "Alice", "Acme", "CEO")),
      record("b", "Alan", "Acme", "CFO"),
    ];
    let mut view = ListView::new("acme", StatusFilter::Generated, 1);
    let page = view.apply(&leads);
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].lead.name, "Alice");
  }

  #[test]
  fn last_page_is_partial() {
    let leads = many(25);
    let mut view = ListView::new("", StatusFilter::All, 3);
    let page = view.apply(&leads);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].lead.name, "Lead 20");
    assert!(!page.has_next());
    assert!(page.has_prev());
  }

  #[test]
  fn page_reclamps_when_results_shrink() {
    let leads = many(25);
    let mut view = ListView::new("", StatusFilter::All, 3);
    view.apply(&leads);

    let fewer = many(3);
    let page = view.apply(&fewer);
    assert_eq!(page.page, 1);
    assert_eq!(page.items.len(), 3);
    assert_eq!(view.page(), 1);
  }

  #[test]
  fn changing_filters_resets_page() {
    let mut view = ListView::new("", StatusFilter::All, 4);
    view.set_search("x");
    assert_eq!(view.page(), 1);
    view.set_page(3);
    view.set_status(StatusFilter::Sent);
    assert_eq!(view.page(), 1);
    view.prev_page();
    assert_eq!(view.page(), 1);
  }

  #[test]
  fn empty_result_is_not_an_error() {
    let leads = many(4);
    let mut view = ListView::default();
    view.set_search("nobody");
    let page = view.apply(&leads);
    assert!(page.is_empty());
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 0);
    assert!(page.items.is_empty());
  }

  #[test]
  fn works_over_shared_records() {
    let leads: Vec<Arc<LeadRecord>> = many(12).into_iter().map(Arc::new).collect();
    let mut view = ListView::new("", StatusFilter::All, 2);
    assert_eq!(view.apply(&leads).items.len(), 2);
  }

  #[test]
  fn filter_parses_kebab_case() {
    assert_eq!("no-email".parse::<StatusFilter>().unwrap(), StatusFilter::NoEmail);
    assert_eq!("Sent".parse::<StatusFilter>().unwrap(), StatusFilter::Sent);
  }
}
