//! User domain types.

use chrono::{DateTime, Utc};

use bodegon_core::{Email, UserId};

/// A store account.
///
/// The password hash is deliberately not part of this type; it is only
/// ever loaded alongside a user for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email (lowercase, unique).
    pub email: Email,
    /// Display name.
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    /// Identity document kind (e.g. "V", "E", "J").
    pub id_type: String,
    pub id_number: String,
    /// Inactive users cannot authenticate.
    pub is_active: bool,
    /// Staff users are created through the CLI.
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub name: String,
    pub is_staff: bool,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    /// New Argon2 PHC string.
    pub password_hash: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
}

impl UserPatch {
    /// Apply this patch to a user in place.
    pub fn apply(self, user: &mut User) {
        let fields = [
            (self.name, &mut user.name),
            (self.address, &mut user.address),
            (self.city, &mut user.city),
            (self.state, &mut user.state),
            (self.zip, &mut user.zip),
            (self.phone, &mut user.phone),
            (self.id_type, &mut user.id_type),
            (self.id_number, &mut user.id_number),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}
