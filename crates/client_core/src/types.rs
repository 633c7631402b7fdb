use shared::{
    domain::{DishId, PartyType, RsvpId},
    protocol::RegistrationRequest,
};

/// Form state for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub selected_dish: Option<DishId>,
    pub party_type: PartyType,
    /// Whatever the form last held. Never sent; the party type decides.
    pub guests: u8,
    pub payment_proof: Option<String>,
    pub notes: Option<String>,
}

impl RegistrationDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            guests: 1,
            ..Self::default()
        }
    }

    pub fn with_dish(mut self, dish: DishId) -> Self {
        self.selected_dish = Some(dish);
        self
    }

    pub fn with_party_type(mut self, party_type: PartyType) -> Self {
        self.party_type = party_type;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_payment_proof(mut self, proof: impl Into<String>) -> Self {
        self.payment_proof = Some(proof.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub(crate) fn to_request(&self, dish_name: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.as_deref().unwrap_or_default().trim().to_string(),
            guests: self.party_type.guests(),
            selected_dish: dish_name.to_string(),
            payment_type: self.party_type,
            payment_proof: self
                .payment_proof
                .as_deref()
                .map(str::trim)
                .filter(|proof| !proof.is_empty())
                .map(str::to_string),
            notes: self.notes.as_deref().unwrap_or_default().trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub rsvp_id: Option<RsvpId>,
    pub dish_id: DishId,
    pub dish_name: String,
    pub party_type: PartyType,
    pub guests: u8,
    pub amount: f64,
    pub server_message: Option<String>,
    /// False when the reconciler was shut down before the local bump could land.
    pub optimistic_applied: bool,
}
