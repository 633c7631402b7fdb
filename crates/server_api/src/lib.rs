use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use shared::{
    domain::{DishId, PaymentStatus, PriceTable, RsvpId},
    error::{ApiError, ErrorCode},
    menu::{DEFAULT_DISH_CAPACITY, DEFAULT_MENU},
    protocol::{
        DishStat, DishStatus, RegistrationRequest, RsvpRecord, StatsPayload, UpdateRsvpRequest,
    },
};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub registry: RsvpRegistry,
    pub prices: PriceTable,
}

impl ApiContext {
    pub fn new(dish_capacity: u32) -> Self {
        Self {
            registry: RsvpRegistry::new(dish_capacity),
            prices: PriceTable::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct DishSlot {
    id: Option<DishId>,
    name: String,
    max_count: u32,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_rsvp_id: i64,
    rsvps: Vec<RsvpRecord>,
    dishes: Vec<DishSlot>,
}

impl RegistryState {
    fn occupancy(&self, dish: &str) -> u32 {
        self.occupancy_excluding(dish, None)
    }

    fn occupancy_excluding(&self, dish: &str, skip: Option<RsvpId>) -> u32 {
        let count = self
            .rsvps
            .iter()
            .filter(|rsvp| Some(rsvp.id) != skip)
            .filter(|rsvp| rsvp.selected_dish == dish && rsvp.payment_status.holds_slot())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn slot_or_register(&mut self, dish: &str, default_capacity: u32) -> DishSlot {
        if let Some(slot) = self.dishes.iter().find(|slot| slot.name == dish) {
            return slot.clone();
        }
        let slot = DishSlot {
            id: None,
            name: dish.to_string(),
            max_count: default_capacity,
        };
        self.dishes.push(slot.clone());
        slot
    }

    fn ensure_room(
        &mut self,
        dish: &str,
        default_capacity: u32,
        skip: Option<RsvpId>,
    ) -> Result<(), ApiError> {
        let slot = self.slot_or_register(dish, default_capacity);
        if self.occupancy_excluding(dish, skip) >= slot.max_count {
            return Err(ApiError::new(
                ErrorCode::DishUnavailable,
                "dish not available (limit reached)",
            ));
        }
        Ok(())
    }

    fn find_mut(&mut self, id: RsvpId) -> Result<&mut RsvpRecord, ApiError> {
        self.rsvps
            .iter_mut()
            .find(|rsvp| rsvp.id == id)
            .ok_or_else(|| ApiError::not_found(format!("rsvp {id} not found")))
    }

    fn find(&self, id: RsvpId) -> Result<&RsvpRecord, ApiError> {
        self.rsvps
            .iter()
            .find(|rsvp| rsvp.id == id)
            .ok_or_else(|| ApiError::not_found(format!("rsvp {id} not found")))
    }
}

/// In-memory RSVP store. Dish occupancy is always derived from the stored
/// records, so there is no separate counter to keep in sync.
#[derive(Clone)]
pub struct RsvpRegistry {
    default_capacity: u32,
    state: Arc<RwLock<RegistryState>>,
}

impl Default for RsvpRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_DISH_CAPACITY)
    }
}

impl RsvpRegistry {
    pub fn new(default_capacity: u32) -> Self {
        let dishes = DEFAULT_MENU
            .iter()
            .map(|(id, name)| DishSlot {
                id: Some(DishId(*id)),
                name: (*name).to_string(),
                max_count: default_capacity,
            })
            .collect();
        Self {
            default_capacity,
            state: Arc::new(RwLock::new(RegistryState {
                next_rsvp_id: 1,
                rsvps: Vec::new(),
                dishes,
            })),
        }
    }

    pub fn default_capacity(&self) -> u32 {
        self.default_capacity
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("field {field} is required")));
    }
    Ok(value)
}

/// Re-registers every menu dish that is missing. Idempotent.
pub async fn initialize_dishes(ctx: &ApiContext) -> usize {
    let mut guard = ctx.registry.state.write().await;
    let mut added = 0;
    for (id, name) in DEFAULT_MENU {
        if guard.dishes.iter().any(|slot| slot.name == *name) {
            continue;
        }
        guard.dishes.push(DishSlot {
            id: Some(DishId(*id)),
            name: (*name).to_string(),
            max_count: ctx.registry.default_capacity,
        });
        added += 1;
    }
    added
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub async fn create_rsvp(
    ctx: &ApiContext,
    request: RegistrationRequest,
) -> Result<RsvpRecord, ApiError> {
    let name = required("name", &request.name)?.to_string();
    let email = required("email", &request.email)?.to_string();
    let dish = required("selected_dish", &request.selected_dish)?.to_string();

    let mut guard = ctx.registry.state.write().await;
    guard.ensure_room(&dish, ctx.registry.default_capacity, None)?;

    let now = Utc::now();
    let id = RsvpId(guard.next_rsvp_id);
    guard.next_rsvp_id += 1;
    let record = RsvpRecord {
        id,
        name,
        email,
        phone: request.phone.trim().to_string(),
        guests: request.payment_type.guests(),
        selected_dish: dish,
        payment_type: request.payment_type,
        total_amount: request.payment_type.amount(&ctx.prices),
        payment_status: PaymentStatus::Pending,
        payment_proof: non_blank(request.payment_proof),
        notes: request.notes.trim().to_string(),
        created_at: now,
        updated_at: now,
    };
    guard.rsvps.push(record.clone());
    info!(
        rsvp_id = id.0,
        dish = %record.selected_dish,
        guests = record.guests,
        "rsvp: registration stored"
    );
    Ok(record)
}

pub async fn list_rsvps(ctx: &ApiContext) -> Vec<RsvpRecord> {
    let guard = ctx.registry.state.read().await;
    let mut rsvps = guard.rsvps.clone();
    rsvps.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    rsvps
}

pub async fn update_rsvp(
    ctx: &ApiContext,
    id: RsvpId,
    update: UpdateRsvpRequest,
) -> Result<RsvpRecord, ApiError> {
    let name = update
        .name
        .as_deref()
        .map(|name| required("name", name).map(str::to_string))
        .transpose()?;
    let email = update
        .email
        .as_deref()
        .map(|email| required("email", email).map(str::to_string))
        .transpose()?;

    let mut guard = ctx.registry.state.write().await;
    let current = guard.find(id)?.clone();

    let target_dish = match update.selected_dish.as_deref() {
        Some(dish) => required("selected_dish", dish)?.to_string(),
        None => current.selected_dish.clone(),
    };
    let target_status = update.payment_status.unwrap_or(current.payment_status);
    let held_target_slot =
        current.selected_dish == target_dish && current.payment_status.holds_slot();
    if target_status.holds_slot() && !held_target_slot {
        guard.ensure_room(&target_dish, ctx.registry.default_capacity, Some(id))?;
    }

    let prices = ctx.prices;
    let record = guard.find_mut(id)?;
    if let Some(name) = name {
        record.name = name;
    }
    if let Some(email) = email {
        record.email = email;
    }
    if let Some(phone) = update.phone {
        record.phone = phone.trim().to_string();
    }
    if let Some(notes) = update.notes {
        record.notes = notes;
    }
    if let Some(proof) = update.payment_proof {
        record.payment_proof = non_blank(Some(proof));
    }
    if let Some(payment_type) = update.payment_type {
        record.payment_type = payment_type;
        record.guests = payment_type.guests();
        record.total_amount = payment_type.amount(&prices);
    }
    record.selected_dish = target_dish;
    record.payment_status = target_status;
    record.updated_at = Utc::now();
    Ok(record.clone())
}

pub async fn delete_rsvp(ctx: &ApiContext, id: RsvpId) -> Result<RsvpRecord, ApiError> {
    let mut guard = ctx.registry.state.write().await;
    let index = guard
        .rsvps
        .iter()
        .position(|rsvp| rsvp.id == id)
        .ok_or_else(|| ApiError::not_found(format!("rsvp {id} not found")))?;
    let removed = guard.rsvps.remove(index);
    info!(rsvp_id = id.0, dish = %removed.selected_dish, "rsvp: registration removed");
    Ok(removed)
}

pub async fn accept_rsvp(ctx: &ApiContext, id: RsvpId) -> Result<RsvpRecord, ApiError> {
    set_payment_status(ctx, id, PaymentStatus::Confirmed).await
}

pub async fn reject_rsvp(ctx: &ApiContext, id: RsvpId) -> Result<RsvpRecord, ApiError> {
    set_payment_status(ctx, id, PaymentStatus::Rejected).await
}

async fn set_payment_status(
    ctx: &ApiContext,
    id: RsvpId,
    status: PaymentStatus,
) -> Result<RsvpRecord, ApiError> {
    update_rsvp(
        ctx,
        id,
        UpdateRsvpRequest {
            payment_status: Some(status),
            ..UpdateRsvpRequest::default()
        },
    )
    .await
}

pub async fn dish_statuses(ctx: &ApiContext) -> Vec<DishStatus> {
    let guard = ctx.registry.state.read().await;
    guard
        .dishes
        .iter()
        .map(|slot| {
            let current_count = guard.occupancy(&slot.name);
            DishStatus {
                id: slot.id,
                dish_name: slot.name.clone(),
                current_count,
                max_count: slot.max_count,
                available: current_count < slot.max_count,
            }
        })
        .collect()
}

pub async fn stats(ctx: &ApiContext) -> StatsPayload {
    let guard = ctx.registry.state.read().await;
    let mut per_dish: HashMap<&str, u32> = HashMap::new();
    for rsvp in guard.rsvps.iter().filter(|r| r.payment_status.holds_slot()) {
        *per_dish.entry(rsvp.selected_dish.as_str()).or_default() += 1;
    }
    let mut dish_stats: Vec<DishStat> = per_dish
        .into_iter()
        .map(|(dish, count)| DishStat {
            dish: dish.to_string(),
            count,
            dish_id: guard
                .dishes
                .iter()
                .find(|slot| slot.name == dish)
                .and_then(|slot| slot.id),
        })
        .collect();
    dish_stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.dish.cmp(&b.dish)));

    let count_status = |status: PaymentStatus| {
        guard
            .rsvps
            .iter()
            .filter(|rsvp| rsvp.payment_status == status)
            .count() as u64
    };

    StatsPayload {
        total_rsvps: guard.rsvps.len() as u64,
        confirmed_payments: count_status(PaymentStatus::Confirmed),
        pending_payments: count_status(PaymentStatus::Pending),
        total_guests: guard.rsvps.iter().map(|rsvp| u64::from(rsvp.guests)).sum(),
        total_revenue: guard
            .rsvps
            .iter()
            .filter(|rsvp| rsvp.payment_status == PaymentStatus::Confirmed)
            .map(|rsvp| rsvp.total_amount)
            .sum(),
        dish_stats,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
