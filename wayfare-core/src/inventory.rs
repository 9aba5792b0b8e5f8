use tracing::warn;
use wayfare_shared::TravelOption;

/// Seat-count guard applied to a travel option that the caller already
/// holds inside a store transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryGuard;

impl InventoryGuard {
    pub fn new() -> Self {
        Self
    }

    /// Take `seats` out of the option's inventory
    pub fn reserve(&self, option: &mut TravelOption, seats: u32) -> Result<(), CapacityError> {
        if !option.is_available(seats) {
            return Err(CapacityError {
                travel_id: option.travel_id.clone(),
                requested: seats,
                available: option.available_seats,
            });
        }

        option.available_seats -= seats;
        option.touch();

        Ok(())
    }

    /// Return `seats` to inventory, capped at the option's capacity.
    /// Returns how many seats were actually returned.
    pub fn release(&self, option: &mut TravelOption, seats: u32) -> u32 {
        let headroom = option.total_seats.saturating_sub(option.available_seats);
        let released = seats.min(headroom);

        if released < seats {
            warn!(
                "Release of {} seats on {} capped at capacity {} (available {})",
                seats, option.travel_id, option.total_seats, option.available_seats
            );
        }

        option.available_seats += released;
        option.touch();

        released
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Insufficient seats on {travel_id}: requested {requested}, available {available}")]
pub struct CapacityError {
    pub travel_id: String,
    pub requested: u32,
    pub available: u32,
}
