//! Administrative users.

use serde::{Deserialize, Serialize};

/// A user allowed to administer the registry.
///
/// `password` is an opaque hash produced by the caller; stores never hash or
/// inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserData {
  pub email:    String,
  pub password: String,
}

impl From<CreateUserData> for User {
  fn from(data: CreateUserData) -> Self {
    Self { email: data.email, password: data.password }
  }
}
