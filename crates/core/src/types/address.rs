//! Shipping address captured at checkout.

use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};

/// Errors returned when validating a [`AddressForm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// One or more required fields were blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// The email field is present but malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Delivery information as typed by the shopper, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

impl AddressForm {
    /// Validate the form into a [`ShippingAddress`].
    ///
    /// Every field is required. Blank fields are all reported together,
    /// in form order, before the email is checked.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingFields` listing blank fields, or
    /// `AddressError::InvalidEmail` if the email is malformed.
    pub fn validate(&self) -> Result<ShippingAddress, AddressError> {
        let fields = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipcode", &self.zipcode),
            ("country", &self.country),
            ("phone", &self.phone),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AddressError::MissingFields(missing));
        }

        Ok(ShippingAddress {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: Email::parse(&self.email)?,
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zipcode: self.zipcode.trim().to_owned(),
            country: self.country.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
        })
    }
}

/// A validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// "First Last" for order summaries.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
