//! Courier selection for pending orders.

use crate::aggregate::Aggregate;
use crate::courier::Courier;
use crate::error::{DomainError, Result};
use crate::order::{Order, OrderStatus};

/// Binds a pending order to one of the candidate couriers.
///
/// Side effects are limited to the aggregates passed in; persisting them is
/// the caller's job.
pub trait Dispatcher: Send + Sync {
    /// Picks a courier, stores the order with it and assigns the order.
    ///
    /// Returns the chosen courier.
    fn dispatch<'a>(
        &self,
        order: &mut Order,
        couriers: &'a mut [Courier],
    ) -> Result<&'a mut Courier>;
}

/// Greedy dispatcher choosing the courier that reaches the order soonest.
///
/// Ties go to the courier that comes first in the slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourierDispatcher;

impl CourierDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for CourierDispatcher {
    fn dispatch<'a>(
        &self,
        order: &mut Order,
        couriers: &'a mut [Courier],
    ) -> Result<&'a mut Courier> {
        if order.status() != OrderStatus::Created {
            return Err(DomainError::InvalidOrder {
                order_id: order.id(),
                reason: "only orders in Created status can be dispatched",
            });
        }
        if couriers.is_empty() {
            return Err(DomainError::InvalidInput("no couriers to dispatch to"));
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, courier) in couriers.iter().enumerate() {
            if !courier.can_take_order(order) {
                continue;
            }
            let time = courier.calculate_time_to_location(order.location());
            match best {
                Some((_, best_time)) if time >= best_time => {}
                _ => best = Some((index, time)),
            }
        }

        let (index, time) = best.ok_or(DomainError::NoCandidate {
            order_id: order.id(),
        })?;
        let courier = &mut couriers[index];

        courier.take_order(order)?;
        if let Err(err) = order.assign(courier.id()) {
            courier.release_order(order.id())?;
            return Err(err);
        }

        tracing::debug!(
            order_id = %order.id(),
            courier_id = %courier.id(),
            time,
            "Order dispatched"
        );
        Ok(courier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Location;
    use common::OrderId;

    fn location(x: i32, y: i32) -> Location {
        Location::new(x, y).unwrap()
    }

    fn new_order(x: i32, y: i32, volume: i32) -> Order {
        Order::create(OrderId::new(), location(x, y), volume)
            .unwrap()
            .0
    }

    fn courier_at(name: &str, x: i32, y: i32, speed: i32) -> Courier {
        Courier::new(name, speed, location(x, y)).unwrap()
    }

    #[test]
    fn test_selects_closest_courier() {
        let mut order = new_order(5, 5, 1);
        let mut couriers = vec![
            courier_at("far", 10, 5, 1),
            courier_at("near", 5, 4, 1),
        ];
        let near_id = couriers[1].id();

        let chosen = dispatcher().dispatch(&mut order, &mut couriers).unwrap();
        assert_eq!(chosen.id(), near_id);
        assert!(!chosen.is_free());
        assert_eq!(order.status(), OrderStatus::Assigned);
        assert_eq!(order.courier_id(), Some(near_id));
        assert!(couriers[0].is_free());
    }

    #[test]
    fn test_faster_courier_beats_closer_one() {
        let mut order = new_order(1, 1, 1);
        let mut couriers = vec![
            courier_at("slow", 1, 3, 1),
            courier_at("fast", 1, 7, 4),
        ];
        let fast_id = couriers[1].id();

        let chosen = dispatcher().dispatch(&mut order, &mut couriers).unwrap();
        assert_eq!(chosen.id(), fast_id);
    }

    #[test]
    fn test_ties_go_to_first_courier() {
        let mut order = new_order(5, 5, 1);
        let mut couriers = vec![
            courier_at("first", 5, 7, 1),
            courier_at("second", 5, 3, 1),
        ];
        let first_id = couriers[0].id();

        let chosen = dispatcher().dispatch(&mut order, &mut couriers).unwrap();
        assert_eq!(chosen.id(), first_id);
    }

    #[test]
    fn test_skips_couriers_without_capacity() {
        let mut order = new_order(5, 5, 8);
        let mut busy = courier_at("busy", 5, 5, 1);
        busy.take_order(&new_order(1, 1, 5)).unwrap();
        let mut couriers = vec![busy, courier_at("free", 9, 9, 1)];
        let free_id = couriers[1].id();

        let chosen = dispatcher().dispatch(&mut order, &mut couriers).unwrap();
        assert_eq!(chosen.id(), free_id);
    }

    #[test]
    fn test_no_couriers_is_invalid_input() {
        let mut order = new_order(5, 5, 1);
        let mut couriers: Vec<Courier> = Vec::new();
        let result = dispatcher().dispatch(&mut order, &mut couriers);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(order.status(), OrderStatus::Created);
    }

    #[test]
    fn test_no_capacity_is_no_candidate() {
        let mut order = new_order(5, 5, 11);
        let mut couriers = vec![courier_at("a", 1, 1, 1), courier_at("b", 2, 2, 1)];
        let order_id = order.id();

        let result = dispatcher().dispatch(&mut order, &mut couriers);
        assert_eq!(result.unwrap_err(), DomainError::NoCandidate { order_id });
        assert_eq!(order.status(), OrderStatus::Created);
        assert!(couriers.iter().all(Courier::is_free));
    }

    #[test]
    fn test_assigned_order_is_rejected() {
        let mut order = new_order(5, 5, 1);
        order.assign(common::CourierId::new()).unwrap();
        let mut couriers = vec![courier_at("a", 1, 1, 1)];

        let result = dispatcher().dispatch(&mut order, &mut couriers);
        assert!(matches!(result, Err(DomainError::InvalidOrder { .. })));
        assert!(couriers[0].is_free());
    }

    fn dispatcher() -> CourierDispatcher {
        CourierDispatcher::new()
    }
}
