//! Integration tests for the delivery domain.
//!
//! These tests drive orders and couriers through dispatch, movement and
//! completion using only the public API.

use common::OrderId;
use domain::{
    Aggregate, Courier, CourierDispatcher, Dispatcher, DomainError, DomainEvent, Location, Order,
    OrderEvent, OrderStatus,
};

fn location(x: i32, y: i32) -> Location {
    Location::new(x, y).unwrap()
}

fn deliver(order: &mut Order, courier: &mut Courier) -> (usize, OrderEvent) {
    let mut ticks = 0;
    loop {
        courier.move_towards(order.location()).unwrap();
        ticks += 1;
        if courier.location() == order.location() {
            let event = order.complete().unwrap();
            courier.complete_order(order).unwrap();
            return (ticks, event);
        }
    }
}

mod delivery_lifecycle {
    use super::*;

    #[test]
    fn order_is_dispatched_delivered_and_completed() {
        let (mut order, created) = Order::create(OrderId::new(), location(5, 5), 4).unwrap();
        let mut couriers = vec![
            Courier::new("far", 2, location(10, 10)).unwrap(),
            Courier::new("near", 2, location(1, 1)).unwrap(),
        ];

        let courier = CourierDispatcher::new()
            .dispatch(&mut order, &mut couriers)
            .unwrap();
        assert_eq!(courier.name(), "near");
        assert_eq!(order.status(), OrderStatus::Assigned);

        let (ticks, completed) = deliver(&mut order, courier);
        assert_eq!(ticks, 4);
        assert!(courier.is_free());
        assert_eq!(order.status(), OrderStatus::Completed);

        assert_eq!(created.event_type(), "OrderCreated");
        assert_eq!(completed.event_type(), "OrderCompleted");
        assert_eq!(created.order_id(), order.id());
        assert_eq!(completed.order_id(), order.id());
    }

    #[test]
    fn freed_courier_can_take_the_next_order() {
        let mut couriers = vec![Courier::new("solo", 3, location(1, 1)).unwrap()];
        let dispatcher = CourierDispatcher::new();

        let (mut first, _) = Order::create(OrderId::new(), location(2, 2), 10).unwrap();
        let (mut second, _) = Order::create(OrderId::new(), location(3, 3), 10).unwrap();

        dispatcher.dispatch(&mut first, &mut couriers).unwrap();
        let result = dispatcher.dispatch(&mut second, &mut couriers);
        assert!(matches!(result, Err(DomainError::NoCandidate { .. })));

        deliver(&mut first, &mut couriers[0]);
        let chosen = dispatcher.dispatch(&mut second, &mut couriers).unwrap();
        assert_eq!(second.courier_id(), Some(chosen.id()));
    }

    #[test]
    fn failed_complete_raises_no_event() {
        let (mut order, _) = Order::create(OrderId::new(), location(5, 5), 1).unwrap();
        let result = order.complete();
        assert!(matches!(result, Err(DomainError::InvalidState { .. })));
        assert_eq!(order.status(), OrderStatus::Created);
    }
}
