use parkwise::application::engine::EntryOutcome;
use parkwise::domain::vehicle::VehicleClass;

mod common;

#[tokio::test]
async fn test_entries_count_down_until_full() {
    let clock = common::clock();
    let engine = common::engine(common::approving(), &clock);
    engine.add_slots(VehicleClass::Car, 1, 3).await.unwrap();
    engine.add_slots(VehicleClass::Bike, 1, 2).await.unwrap();

    for n in 1..=3 {
        common::admit(&engine, &format!("CAR{n}"), VehicleClass::Car).await;
        assert_eq!(
            engine.count_available(VehicleClass::Car).await.unwrap(),
            3 - n
        );
    }

    let overflow = engine.enter("CAR4", VehicleClass::Car).await.unwrap();
    assert_eq!(overflow, EntryOutcome::NoSlotAvailable);
    assert_eq!(engine.count_available(VehicleClass::Car).await.unwrap(), 0);

    // Other classes are unaffected.
    assert_eq!(engine.count_available(VehicleClass::Bike).await.unwrap(), 2);
    assert_eq!(engine.list_active().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_no_slot_has_no_side_effects() {
    let clock = common::clock();
    let engine = common::engine(common::approving(), &clock);

    let outcome = engine.enter("EV001", VehicleClass::Ev).await.unwrap();
    assert_eq!(outcome, EntryOutcome::NoSlotAvailable);
    assert!(engine.list_active().await.unwrap().is_empty());
    assert_eq!(engine.status().await.unwrap().active_tickets, 0);
}

#[tokio::test]
async fn test_same_plate_gets_a_new_ticket_each_session() {
    let clock = common::clock();
    let engine = common::engine(common::approving(), &clock);
    engine.add_slots(VehicleClass::Car, 1, 1).await.unwrap();
    engine
        .set_pricing_rule(
            VehicleClass::Car,
            common::amount(rust_decimal_macros::dec!(25)),
            common::amount(rust_decimal_macros::dec!(60)),
        )
        .await
        .unwrap();

    let first = common::admit(&engine, "ABC123", VehicleClass::Car).await;
    engine.exit(first.id).await.unwrap();
    let second = common::admit(&engine, "ABC123", VehicleClass::Car).await;

    assert_ne!(first.id, second.id);
    assert!(!engine.find_ticket(first.id).await.unwrap().unwrap().is_active());
    assert!(second.is_active());
}
