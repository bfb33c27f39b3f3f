//! Ordinal privilege levels.
//!
//! Ranks exist in two independent scopes: site-wide ([`GlobalRank`]) and per
//! community ([`CommunityRank`]). They are only ever compared within their own
//! scope; a community owner gains nothing site-wide.

use serde::{Deserialize, Serialize};

/// Site-wide privilege of a principal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRank {
  /// No principal at all.
  #[default]
  Anonymous,
  Member,
  Admin,
}

impl GlobalRank {
  pub fn is_admin(self) -> bool { self >= Self::Admin }
}

/// Privilege of a principal within one community.
///
/// [`CommunityRank::None`] is never stored: it is what the absence of a
/// membership row means.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CommunityRank {
  #[default]
  None,
  Subscriber,
  Admin,
  Owner,
}

impl CommunityRank {
  pub fn is_admin(self) -> bool { self >= Self::Admin }

  pub fn is_owner(self) -> bool { self >= Self::Owner }
}

/// How a rank write combines with an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
  /// Keep whichever of the stored and written rank is higher.
  Max,
  /// Replace the stored rank.
  Overwrite,
}

/// Result of a ledger mutation. Mutations either take effect or do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Applied,
  Unchanged,
}

impl Outcome {
  /// Interpret a storage affected-row count.
  pub fn from_affected(rows: u64) -> Self {
    if rows > 0 { Self::Applied } else { Self::Unchanged }
  }

  pub fn is_applied(self) -> bool { matches!(self, Self::Applied) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn global_ranks_are_ordered() {
    assert!(GlobalRank::Anonymous < GlobalRank::Member);
    assert!(GlobalRank::Member < GlobalRank::Admin);
    assert!(!GlobalRank::Member.is_admin());
    assert!(GlobalRank::Admin.is_admin());
  }

  #[test]
  fn community_ranks_are_ordered() {
    assert!(CommunityRank::None < CommunityRank::Subscriber);
    assert!(CommunityRank::Subscriber < CommunityRank::Admin);
    assert!(CommunityRank::Admin < CommunityRank::Owner);
    assert!(CommunityRank::Owner.is_admin());
    assert!(!CommunityRank::Admin.is_owner());
  }

  #[test]
  fn ranks_serialize_by_name() {
    assert_eq!(serde_json::to_string(&CommunityRank::Owner).unwrap(), "\"owner\"");
    assert_eq!(serde_json::to_string(&GlobalRank::Member).unwrap(), "\"member\"");
  }

  #[test]
  fn outcome_from_affected_rows() {
    assert_eq!(Outcome::from_affected(0), Outcome::Unchanged);
    assert_eq!(Outcome::from_affected(1), Outcome::Applied);
  }
}
