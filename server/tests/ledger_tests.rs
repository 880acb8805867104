use std::sync::Arc;
use terraforming_server::{
    events::{EventBus, GameEvent},
    game::{
        resources::{Payment, PlayerResources},
        types::{Resource, ResourceSet},
    },
    GameError,
};
use uuid::Uuid;

fn ledger() -> (PlayerResources, Arc<EventBus>) {
    let bus = Arc::new(EventBus::new());
    let ledger = PlayerResources::new(Uuid::new_v4(), Uuid::new_v4(), 20, Arc::clone(&bus));
    (ledger, bus)
}

#[test]
fn pay_cost_is_all_or_nothing() {
    let (ledger, _bus) = ledger();
    ledger
        .add(&ResourceSet {
            credits: 10,
            steel: 1,
            ..ResourceSet::default()
        })
        .unwrap();

    let err = ledger
        .pay_cost(&ResourceSet {
            credits: 5,
            steel: 2,
            ..ResourceSet::default()
        })
        .unwrap_err();
    assert_eq!(
        err,
        GameError::InsufficientResources {
            resource: Resource::Steel,
            needed: 2,
            available: 1,
        }
    );
    // nothing was taken
    assert_eq!(ledger.get().credits, 10);
    assert_eq!(ledger.get().steel, 1);

    ledger
        .pay_cost(&ResourceSet {
            credits: 5,
            steel: 1,
            ..ResourceSet::default()
        })
        .unwrap();
    assert_eq!(ledger.get().credits, 5);
    assert_eq!(ledger.get().steel, 0);
}

#[test]
fn add_rejects_a_batch_that_would_go_negative() {
    let (ledger, _bus) = ledger();
    ledger.add(&ResourceSet::of(Resource::Plants, 3)).unwrap();

    let batch = ResourceSet {
        plants: -4,
        heat: 5,
        ..ResourceSet::default()
    };
    assert!(matches!(
        ledger.add(&batch),
        Err(GameError::InsufficientResources {
            resource: Resource::Plants,
            ..
        })
    ));
    assert_eq!(ledger.get().heat, 0);
    assert_eq!(ledger.get().plants, 3);
}

#[test]
fn production_is_clamped() {
    let (ledger, _bus) = ledger();
    let applied = ledger.add_production(&ResourceSet {
        credits: -8,
        steel: -1,
        heat: 2,
        ..ResourceSet::default()
    });

    let production = ledger.production();
    assert_eq!(production.credits, -5);
    assert_eq!(production.steel, 0);
    assert_eq!(production.heat, 2);
    assert_eq!(applied.credits, -5);
    assert_eq!(applied.steel, 0);
}

#[test]
fn production_phase_payout() {
    let (ledger, _bus) = ledger();
    ledger.add(&ResourceSet::of(Resource::Energy, 3)).unwrap();
    ledger.add_production(&ResourceSet {
        credits: 2,
        energy: 1,
        ..ResourceSet::default()
    });

    let report = ledger.apply_production();
    assert_eq!(report.energy_converted, 3);

    let balance = ledger.get();
    assert_eq!(balance.credits, 22); // production 2 + terraform rating 20
    assert_eq!(balance.energy, 1);
    assert_eq!(balance.heat, 3);
}

#[test]
fn production_payout_reports_what_was_actually_paid() {
    let (ledger, _bus) = ledger();
    ledger
        .add(&ResourceSet {
            credits: 1,
            plants: 2,
            ..ResourceSet::default()
        })
        .unwrap();
    ledger.add_production(&ResourceSet {
        credits: -5,
        plants: 3,
        ..ResourceSet::default()
    });
    ledger.update_terraform_rating(-18);

    let report = ledger.apply_production();

    // 1 + (-5 + 2) floors at zero
    assert_eq!(ledger.get().credits, 0);
    assert_eq!(report.income.credits, -1);
    assert_eq!(ledger.get().plants, 5);
    assert_eq!(report.income.plants, 3);
    assert_eq!(report.income.steel, 0);
}

#[test]
fn storage_never_goes_negative() {
    let (ledger, _bus) = ledger();
    ledger.add_to_storage("ants", 2).unwrap();
    assert!(matches!(
        ledger.remove_from_storage("ants", 3),
        Err(GameError::InsufficientStorage { .. })
    ));
    assert_eq!(ledger.storage("ants"), 2);
}

#[test]
fn payment_with_storage_debit_is_atomic() {
    let (ledger, _bus) = ledger();
    ledger.add(&ResourceSet::credits(5)).unwrap();
    ledger.add_to_storage("ants", 1).unwrap();

    let payment = Payment {
        cost: ResourceSet::credits(3),
        storage: vec![("ants".to_string(), 2)],
    };
    assert!(ledger.pay(&payment).is_err());
    assert_eq!(ledger.get().credits, 5);
    assert_eq!(ledger.storage("ants"), 1);
}

#[test]
fn removal_takes_what_is_there() {
    let (ledger, _bus) = ledger();
    ledger.add(&ResourceSet::of(Resource::Plants, 2)).unwrap();
    assert_eq!(ledger.remove_up_to(Resource::Plants, 5), 2);
    assert_eq!(ledger.get().plants, 0);
}

#[tokio::test]
async fn one_event_per_batch() {
    let (ledger, bus) = ledger();
    let mut rx = bus.subscribe();

    ledger
        .add(&ResourceSet {
            credits: 3,
            plants: 2,
            ..ResourceSet::default()
        })
        .unwrap();

    let envelope = rx.try_recv().expect("event published");
    match envelope.event {
        GameEvent::ResourcesChanged { changes, .. } => {
            assert_eq!(changes.len(), 2);
            assert_eq!(changes[&Resource::Credits], 3);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}
