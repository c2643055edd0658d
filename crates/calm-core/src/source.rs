//! Sources (news outlets) and the credibility policy table.
//!
//! The policy is one canonical table: every known outlet carries its
//! credibility, its [`SourceType`] and a bias label. The diversity bucket used
//! by story aggregation is derived from the `SourceType`, so there is no second
//! table to drift out of sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Classification ──────────────────────────────────────────────────────────

/// The kind of outlet a source is.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceType {
  Wire,
  Public,
  Cable,
  Newspaper,
  Tech,
  Digital,
  #[default]
  Other,
}

impl SourceType {
  pub fn diversity_bucket(self) -> DiversityBucket {
    match self {
      Self::Wire => DiversityBucket::Wire,
      Self::Public => DiversityBucket::Public,
      Self::Cable => DiversityBucket::Cable,
      Self::Newspaper => DiversityBucket::Newspaper,
      Self::Tech => DiversityBucket::Tech,
      Self::Digital | Self::Other => DiversityBucket::Other,
    }
  }
}

/// One of the fixed outlet categories counted by source diversity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DiversityBucket {
  Wire,
  Public,
  Cable,
  Newspaper,
  Tech,
  Other,
}

impl DiversityBucket {
  /// Number of buckets; the denominator of source diversity.
  pub const COUNT: usize = 6;
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Credibility metadata applied to a source on first sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
  pub credibility: f64,
  #[serde(default)]
  pub source_type: SourceType,
  #[serde(default = "unknown_bias")]
  pub bias:        String,
}

fn unknown_bias() -> String { "unknown".to_owned() }

impl Default for SourceProfile {
  fn default() -> Self {
    Self {
      credibility: 0.5,
      source_type: SourceType::Other,
      bias:        unknown_bias(),
    }
  }
}

/// An entry of the known-outlet table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownSource {
  pub name:        String,
  /// Alternative spellings matched case-insensitively, e.g. "AP".
  #[serde(default)]
  pub aliases:     Vec<String>,
  pub credibility: f64,
  #[serde(default)]
  pub source_type: SourceType,
  #[serde(default = "unknown_bias")]
  pub bias:        String,
  /// Category the outlet mostly covers, if it is a specialist.
  #[serde(default)]
  pub category:    Option<String>,
}

impl KnownSource {
  pub fn profile(&self) -> SourceProfile {
    SourceProfile {
      credibility: self.credibility,
      source_type: self.source_type,
      bias:        self.bias.clone(),
    }
  }

  fn matches_loosely(&self, name: &str) -> bool {
    self.name.eq_ignore_ascii_case(name)
      || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
  }
}

/// The auditable source policy: the known-outlet table plus the profile used
/// for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePolicy {
  #[serde(default)]
  pub default: SourceProfile,
  #[serde(default)]
  pub sources: Vec<KnownSource>,
}

impl Default for SourcePolicy {
  fn default() -> Self { Self::builtin() }
}

impl SourcePolicy {
  /// The shipped table of well-known outlets.
  pub fn builtin() -> Self {
    use SourceType::*;

    let entry = |name: &str,
                 aliases: &[&str],
                 credibility: f64,
                 source_type: SourceType,
                 bias: &str,
                 category: Option<&str>| KnownSource {
      name: name.to_owned(),
      aliases: aliases.iter().map(|a| (*a).to_owned()).collect(),
      credibility,
      source_type,
      bias: bias.to_owned(),
      category: category.map(str::to_owned),
    };

    let sources = vec![
      entry("Reuters", &[], 0.95, Wire, "center", None),
      entry("Associated Press", &["AP", "AP News"], 0.95, Wire, "center", None),
      entry("AFP", &["Agence France-Presse"], 0.93, Wire, "center", None),
      entry("Bloomberg", &[], 0.90, Wire, "center", Some("business")),
      entry("BBC News", &["BBC"], 0.90, Public, "center", None),
      entry("NPR", &[], 0.88, Public, "center-left", None),
      entry("PBS NewsHour", &["PBS"], 0.88, Public, "center", None),
      entry("The New York Times", &["New York Times", "NYT"], 0.85, Newspaper, "center-left", None),
      entry("The Washington Post", &["Washington Post"], 0.85, Newspaper, "center-left", None),
      entry("The Wall Street Journal", &["Wall Street Journal", "WSJ"], 0.87, Newspaper, "center-right", Some("business")),
      entry("The Guardian", &["Guardian"], 0.85, Newspaper, "center-left", None),
      entry("Financial Times", &["FT"], 0.88, Newspaper, "center", Some("business")),
      entry("CNN", &[], 0.70, Cable, "left-center", None),
      entry("Fox News", &[], 0.65, Cable, "right", None),
      entry("MSNBC", &[], 0.65, Cable, "left", None),
      entry("CNBC", &[], 0.70, Cable, "center", Some("business")),
      entry("TechCrunch", &[], 0.75, Tech, "center", Some("technology")),
      entry("The Verge", &["Verge"], 0.75, Tech, "center-left", Some("technology")),
      entry("Wired", &[], 0.78, Tech, "center-left", Some("technology")),
      entry("Ars Technica", &[], 0.80, Tech, "center", Some("technology")),
      entry("Axios", &[], 0.78, Digital, "center", None),
      entry("Politico", &[], 0.80, Digital, "center", Some("politics")),
    ];

    Self { default: SourceProfile::default(), sources }
  }

  /// Find a table entry: exact name first, then case-insensitive over names
  /// and aliases.
  pub fn lookup(&self, name: &str) -> Option<&KnownSource> {
    self
      .sources
      .iter()
      .find(|s| s.name == name)
      .or_else(|| self.sources.iter().find(|s| s.matches_loosely(name)))
  }

  /// Profile for `name`, falling back to the default profile.
  pub fn profile_for(&self, name: &str) -> SourceProfile {
    self
      .lookup(name)
      .map(KnownSource::profile)
      .unwrap_or_else(|| self.default.clone())
  }

  pub fn source_type_of(&self, name: &str) -> SourceType {
    self
      .lookup(name)
      .map(|s| s.source_type)
      .unwrap_or(self.default.source_type)
  }

  pub fn bucket_of(&self, name: &str) -> DiversityBucket {
    self.source_type_of(name).diversity_bucket()
  }

  /// Reject tables with out-of-range scores or duplicate names.
  pub fn validate(&self) -> Result<()> {
    let in_range = |c: f64| (0.0..=1.0).contains(&c);

    if !in_range(self.default.credibility) {
      return Err(Error::InvalidPolicy(format!(
        "default credibility {} outside [0, 1]",
        self.default.credibility
      )));
    }
    for (i, s) in self.sources.iter().enumerate() {
      if s.name.trim().is_empty() {
        return Err(Error::InvalidPolicy(format!("entry {i} has an empty name")));
      }
      if !in_range(s.credibility) {
        return Err(Error::InvalidPolicy(format!(
          "{}: credibility {} outside [0, 1]",
          s.name, s.credibility
        )));
      }
      if self.sources[..i].iter().any(|o| o.name.eq_ignore_ascii_case(&s.name)) {
        return Err(Error::InvalidPolicy(format!("duplicate entry {:?}", s.name)));
      }
    }
    Ok(())
  }
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A persisted outlet. Created on first sighting, then only its counters move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
  pub name:              String,
  pub credibility_score: f64,
  pub source_type:       SourceType,
  pub bias:              String,
  pub category_affinity: Option<String>,
  pub first_seen_at:     DateTime<Utc>,
  pub last_seen_at:      DateTime<Utc>,
  pub total_articles:    u64,
}

impl Source {
  /// The row written when `name` is first sighted at `at`.
  pub fn first_sighting(name: &str, policy: &SourcePolicy, at: DateTime<Utc>) -> Self {
    let known = policy.lookup(name);
    let profile = known
      .map(KnownSource::profile)
      .unwrap_or_else(|| policy.default.clone());

    Self {
      name:              name.to_owned(),
      credibility_score: profile.credibility,
      source_type:       profile.source_type,
      bias:              profile.bias,
      category_affinity: known.and_then(|k| k.category.clone()),
      first_seen_at:     at,
      last_seen_at:      at,
      total_articles:    1,
    }
  }
}
