//! End-to-end scenarios against `TicketService` over in-memory tables.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use chrono::Duration;
use common::{Harness, admin, concert};
use ticket_ledger_core::environment::Clock;
use ticketing::{
    AccessProfile, ErrorKind, Identity, ListingId, OrganizerSequence, ServicePolicy, SoldTicketId,
    TicketError,
};

fn fan() -> Identity {
    Identity::new("fan")
}

#[tokio::test]
async fn capacity_one_concert_sells_out_after_first_purchase() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service
        .create_listing(&admin(), concert(Some(1)))
        .await
        .unwrap();

    service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();
    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 1);
    assert!(!service.check_availability(&listing.id).await.unwrap());

    let error = service
        .purchase_ticket(&Identity::new("fan-2"), &listing.id, "bob")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 1);
    assert_eq!(harness.sold_tickets.inner().len(), 1);
}

#[tokio::test]
async fn deleted_listing_is_not_found() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();

    let deleted = service.delete_listing(&admin(), &listing.id).await.unwrap();
    assert_eq!(deleted.id, listing.id);

    assert_eq!(
        service.get_listing(&listing.id).await.unwrap_err(),
        TicketError::ListingNotFound(listing.id.clone())
    );
    assert!(
        service
            .delete_listing(&admin(), &listing.id)
            .await
            .unwrap_err()
            .kind()
            == ErrorKind::NotFound
    );
}

#[tokio::test]
async fn failed_counter_increment_leaves_no_sold_record() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service
        .create_listing(&admin(), concert(Some(10)))
        .await
        .unwrap();

    harness.listings.fail_inserts(true);
    let error = service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap_err();
    harness.listings.fail_inserts(false);

    assert_eq!(error.kind(), ErrorKind::Internal);
    assert!(harness.sold_tickets.inner().is_empty());
    assert!(service.list_sold_records().await.unwrap().is_empty());
    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 0);
}

#[tokio::test]
async fn failed_record_insert_leaves_counter_untouched() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service
        .create_listing(&admin(), concert(Some(10)))
        .await
        .unwrap();

    harness.sold_tickets.fail_inserts(true);
    assert!(
        service
            .purchase_ticket(&fan(), &listing.id, "alice")
            .await
            .is_err()
    );

    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 0);
}

#[tokio::test]
async fn reservation_is_idempotent_for_holder() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();

    let first = service.reserve_ticket(&listing.id, "alice").await.unwrap();
    let second = service.reserve_ticket(&listing.id, "alice").await.unwrap();
    assert_eq!(first, listing.id);
    assert_eq!(second, listing.id);

    let error = service
        .reserve_ticket(&listing.id, "bob")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn advisory_reservation_does_not_block_other_buyers() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();
    service.reserve_ticket(&listing.id, "alice").await.unwrap();

    service
        .purchase_ticket(&fan(), &listing.id, "bob")
        .await
        .unwrap();

    let after = service.get_listing(&listing.id).await.unwrap();
    assert_eq!(after.reserved_by.as_deref(), Some("alice"));
}

#[tokio::test]
async fn enforced_reservation_blocks_others_and_is_consumed_by_holder() {
    let harness = Harness::new(ServicePolicy {
        enforce_reservations: true,
        ..ServicePolicy::default()
    });
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();
    service.reserve_ticket(&listing.id, "alice").await.unwrap();

    let error = service
        .purchase_ticket(&fan(), &listing.id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(error, TicketError::ReservationConflict { .. }));
    assert!(harness.sold_tickets.inner().is_empty());

    service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();
    let after = service.get_listing(&listing.id).await.unwrap();
    assert_eq!(after.reserved_by, None);
    assert_eq!(after.total_sold, 1);

    service
        .purchase_ticket(&fan(), &listing.id, "bob")
        .await
        .unwrap();
}

#[tokio::test]
async fn release_reservation_lets_another_holder_reserve() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();
    service.reserve_ticket(&listing.id, "alice").await.unwrap();

    assert_eq!(
        service
            .release_reservation(&listing.id, "bob")
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::Conflict
    );
    service
        .release_reservation(&listing.id, "alice")
        .await
        .unwrap();
    service.reserve_ticket(&listing.id, "bob").await.unwrap();
}

#[tokio::test]
async fn stranger_cannot_add_organizer_and_counter_stays_put() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;

    let error = service
        .add_organizer(&Identity::new("stranger"), Identity::new("org"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Unauthorized);
    assert!(harness.organizers.is_empty());
    assert!(harness.sequences.is_empty());

    let added = service
        .add_organizer(&admin(), Identity::new("org"))
        .await
        .unwrap();
    assert_eq!(added.sequence, OrganizerSequence::new(1));
}

#[tokio::test]
async fn organizer_management_round_trip() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    harness.add_organizer("org-a").await;
    harness.add_organizer("org-b").await;

    assert!(service.is_authorized(&Identity::new("org-a")).await.unwrap());
    assert!(service.is_authorized(&admin()).await.unwrap());
    assert!(!service.is_authorized(&Identity::new("fan")).await.unwrap());

    let removed = service
        .remove_organizer(&Identity::new("org-b"), OrganizerSequence::new(1))
        .await
        .unwrap();
    assert_eq!(removed.identity, Identity::new("org-a"));
    assert!(!service.is_authorized(&Identity::new("org-a")).await.unwrap());

    let identities: Vec<Identity> = service
        .list_organizers()
        .await
        .unwrap()
        .into_iter()
        .map(|organizer| organizer.identity)
        .collect();
    assert_eq!(identities, vec![Identity::new("org-b")]);

    assert_eq!(
        service
            .remove_organizer(&admin(), OrganizerSequence::new(1))
            .await
            .unwrap_err(),
        TicketError::OrganizerNotFound(OrganizerSequence::new(1))
    );
}

#[tokio::test]
async fn non_owner_resale_is_rejected_under_ownership_gate() {
    let harness = Harness::new(ServicePolicy::with_profile(AccessProfile::OwnershipGated));
    let service = &harness.service;
    let listing = service
        .create_listing(&Identity::new("creator"), concert(None))
        .await
        .unwrap();
    let ticket = service
        .purchase_ticket(&Identity::new("alice-id"), &listing.id, "alice")
        .await
        .unwrap();

    let error = service
        .resell_ticket(&Identity::new("mallory"), &ticket.id, "mallory", None)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Unauthorized);
    assert_eq!(
        service.get_sold_record(&ticket.id).await.unwrap().buyer_username,
        "alice"
    );
}

#[tokio::test]
async fn organizers_are_forbidden_to_buy_under_role_gate() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    harness.add_organizer("org").await;
    let listing = service
        .create_listing(&Identity::new("org"), concert(None))
        .await
        .unwrap();

    let error = service
        .purchase_ticket(&Identity::new("org"), &listing.id, "org")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);

    // Role is checked before existence.
    let error = service
        .purchase_ticket(&admin(), &ListingId::new("missing"), "root")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn open_profile_lets_anyone_create_and_buy() {
    let harness = Harness::new(ServicePolicy::with_profile(AccessProfile::Open));
    let service = &harness.service;

    let listing = service
        .create_listing(&Identity::new("anyone"), concert(Some(2)))
        .await
        .unwrap();
    service
        .purchase_ticket(&admin(), &listing.id, "root")
        .await
        .unwrap();
    service
        .delete_listing(&Identity::new("someone-else"), &listing.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn refund_restores_inventory_by_default() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service
        .create_listing(&admin(), concert(Some(1)))
        .await
        .unwrap();
    let ticket = service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();

    assert_eq!(service.refund_ticket(&ticket.id).await.unwrap(), ticket.id);

    assert!(matches!(
        service.get_sold_record(&ticket.id).await,
        Err(TicketError::SoldTicketNotFound(_))
    ));
    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 0);
    assert!(service.check_availability(&listing.id).await.unwrap());
}

#[tokio::test]
async fn refund_can_keep_inventory_consumed() {
    let harness = Harness::new(ServicePolicy {
        restore_inventory_on_refund: false,
        ..ServicePolicy::default()
    });
    let service = &harness.service;
    let listing = service
        .create_listing(&admin(), concert(Some(1)))
        .await
        .unwrap();
    let ticket = service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();

    service.refund_ticket(&ticket.id).await.unwrap();

    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 1);
    assert!(!service.check_availability(&listing.id).await.unwrap());
}

#[tokio::test]
async fn failed_inventory_restore_keeps_the_record() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();
    let ticket = service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();

    harness.listings.fail_inserts(true);
    assert!(service.refund_ticket(&ticket.id).await.is_err());
    harness.listings.fail_inserts(false);

    assert_eq!(service.get_sold_record(&ticket.id).await.unwrap(), ticket);
    assert_eq!(service.get_listing(&listing.id).await.unwrap().total_sold, 1);
}

#[tokio::test]
async fn orphaned_records_stay_usable() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();
    let ticket = service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();

    service.delete_listing(&admin(), &listing.id).await.unwrap();

    let orphan = service.get_sold_record(&ticket.id).await.unwrap();
    assert_eq!(orphan.event_ticket_id, listing.id);
    service.transfer_ticket(&ticket.id, "bob").await.unwrap();
    service
        .resell_ticket(&fan(), &ticket.id, "carol", None)
        .await
        .unwrap();
    assert_eq!(service.refund_ticket(&ticket.id).await.unwrap(), ticket.id);
}

#[tokio::test]
async fn transfer_and_refund_of_unknown_ticket_are_not_found() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let missing = SoldTicketId::new("missing");

    assert_eq!(
        service.transfer_ticket(&missing, "bob").await.unwrap_err(),
        TicketError::SoldTicketNotFound(missing.clone())
    );
    assert_eq!(
        service.refund_ticket(&missing).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn purchase_stamps_listing_update_time() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    let listing = service.create_listing(&admin(), concert(None)).await.unwrap();
    assert_eq!(listing.updated_at, None);

    harness.clock.advance(Duration::hours(2));
    let ticket = service
        .purchase_ticket(&fan(), &listing.id, "alice")
        .await
        .unwrap();

    let after = service.get_listing(&listing.id).await.unwrap();
    assert_eq!(after.created_at, listing.created_at);
    assert_eq!(after.updated_at, Some(harness.clock.now()));
    assert_eq!(ticket.purchased_at, harness.clock.now());
    assert_eq!(ticket.owner, Some(fan()));
}

#[tokio::test]
async fn list_returns_every_listing() {
    let harness = Harness::new(ServicePolicy::default());
    let service = &harness.service;
    for capacity in [Some(1), None, Some(3)] {
        service
            .create_listing(&admin(), concert(capacity))
            .await
            .unwrap();
    }

    assert_eq!(service.list_listings().await.unwrap().len(), 3);
    assert_eq!(harness.listings.inner().len(), 3);
}

#[tokio::test]
async fn negative_price_is_rejected_without_writing() {
    let harness = Harness::new(ServicePolicy::default());
    let mut payload = concert(None);
    payload.unit_price = -5.0;

    let error = harness
        .service
        .create_listing(&admin(), payload)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    assert!(harness.listings.inner().is_empty());
}

#[tokio::test]
async fn service_reports_the_policy_it_was_built_with() {
    let policy = ServicePolicy {
        enforce_reservations: true,
        restore_inventory_on_refund: false,
        ..ServicePolicy::with_profile(AccessProfile::OwnershipGated)
    };
    let harness = Harness::new(policy);

    assert_eq!(harness.service.policy(), &policy);
}
