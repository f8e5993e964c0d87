//! Membership history entries and the membership-type catalog.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalog entry such as "active" or "passive". Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipType {
  pub id:   i64,
  pub name: String,
}

/// One entry in a person's membership history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub id:              i64,
  pub membership_type: MembershipType,
  /// The date from which this membership applies. `None` means it applies
  /// indeterminately and acts as a fallback when selecting the current one.
  pub effective_from:  Option<NaiveDate>,
}

/// Input for creating a membership for an existing person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMembershipData {
  /// Internal (store-assigned) id of the person.
  pub person_id:          i64,
  pub membership_type_id: i64,
  pub effective_from:     Option<NaiveDate>,
}

/// The fields of a membership that can be overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMembershipData {
  pub membership_type_id: i64,
  pub effective_from:     Option<NaiveDate>,
}
