//! Gateway client against the endpoint server over a real socket.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use skybox_core::api::{
    EventConfirmationRequest, FeedbackRequestPayload, LoyaltyPointsRequest,
    NewsletterConfirmationRequest, RegistrationCheckRequest, VipBroadcastRequest,
};
use skybox_core::{LoyaltyReason, Phone};
use skybox_integration_tests::TestServer;
use skybox_storefront::GatewayError;
use skybox_storefront::hooks::{Remote, RemoteState};

fn api_error(err: GatewayError) -> (u16, String) {
    match err {
        GatewayError::Api { status, message } => (status, message),
        other => panic!("expected an API error, got {other}"),
    }
}

#[tokio::test]
async fn test_confirmation_then_registration_check() {
    let server = TestServer::start().await;
    let client = server.client();
    let event = server.add_event("Clásico Paisa", 3).await;

    let sent = client
        .send_event_confirmation(&EventConfirmationRequest {
            name: Some("Ana".to_owned()),
            phone: Some("+57 300 123 4567".to_owned()),
            event_name: Some("Clásico Paisa".to_owned()),
            event_date: Some("Sábado 8 pm".to_owned()),
            event_id: Some(event.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(sent.success);
    assert!(sent.message_id.starts_with("SM"));
    assert_eq!(server.messenger.sent().len(), 1);

    let check = client
        .check_event_registration(&RegistrationCheckRequest {
            event_id: Some(event.to_string()),
            phone: Some("+573001234567".to_owned()),
        })
        .await
        .unwrap();

    assert!(check.exists);
    assert_eq!(check.registration.unwrap().status, "sent");
}

#[tokio::test]
async fn test_loyalty_update_round_trip() {
    let server = TestServer::start().await;
    let customer = server.add_customer("Luis", "+573005550000", "customer", 40).await;

    let response = server
        .client()
        .update_loyalty_points(&LoyaltyPointsRequest {
            customer_id: Some(customer.to_string()),
            reason: Some("vip-bonus".to_owned()),
            amount: None,
        })
        .await
        .unwrap();

    assert_eq!(response.previous_points, 40);
    assert_eq!(response.points_added, LoyaltyReason::VipBonus.default_points());
    assert_eq!(response.new_total, 40 + LoyaltyReason::VipBonus.default_points());
    assert_eq!(server.store.profile(customer).await.unwrap().loyalty_points(), response.new_total);
}

#[tokio::test]
async fn test_validation_message_reaches_caller() {
    let server = TestServer::start().await;

    let err = server
        .client()
        .update_loyalty_points(&LoyaltyPointsRequest {
            customer_id: Some("not-used".to_owned()),
            reason: Some("birthday".to_owned()),
            amount: None,
        })
        .await
        .unwrap_err();

    assert_eq!(
        api_error(err),
        (400, "Invalid reason. Must be: checkin, order, or vip-bonus".to_owned())
    );
}

#[tokio::test]
async fn test_broadcast_counts_failures() {
    let server = TestServer::start().await;
    server.add_customer("Ana", "+573001111111", "vip", 0).await;
    server.add_customer("Luis", "+573002222222", "vip", 0).await;
    server.add_customer("Marta", "+573003333333", "customer", 0).await;
    server.messenger.fail_for(Phone::parse("+573002222222").unwrap());

    let response = server
        .client()
        .send_vip_broadcast(&VipBroadcastRequest {
            segment: Some("vip".to_owned()),
            message: Some("Mesa VIP para la final".to_owned()),
        })
        .await
        .unwrap();

    assert_eq!(response.total_customers, 2);
    assert_eq!(response.sent_count, 1);
    assert_eq!(response.failed_count, 1);
}

#[tokio::test]
async fn test_feedback_requests_for_delivered_attendees() {
    let server = TestServer::start().await;
    let event = server.add_event("Final Liga", -1).await;
    server.add_confirmation(event, "+573001111111", "delivered").await;
    server.add_confirmation(event, "+573002222222", "failed").await;

    let response = server
        .client()
        .send_event_feedback_request(&FeedbackRequestPayload {
            event_id: Some(event.to_string()),
            feedback_link: Some("https://forms.skybox.test/final".to_owned()),
        })
        .await
        .unwrap();

    assert_eq!((response.sent, response.failed, response.total), (1, 0, 1));
    assert!(server.messenger.sent()[0].body.contains("https://forms.skybox.test/final"));
}

#[tokio::test]
async fn test_newsletter_without_messaging_configured() {
    let server = TestServer::without_messaging().await;

    let err = server
        .client()
        .send_newsletter_confirmation(&NewsletterConfirmationRequest {
            name: Some("Ana".to_owned()),
            phone: Some("+573001234567".to_owned()),
        })
        .await
        .unwrap_err();

    assert_eq!(api_error(err), (500, "WhatsApp service not configured".to_owned()));
}

#[tokio::test]
async fn test_remote_hook_tracks_gateway_outcome() {
    let server = TestServer::start().await;
    let client = server.client();
    let mut remote = Remote::new();

    remote
        .run(client.send_vip_broadcast(&VipBroadcastRequest {
            segment: Some("recent".to_owned()),
            message: Some("Hoy hay partido".to_owned()),
        }))
        .await;

    let RemoteState::Ready(response) = remote.state() else {
        panic!("broadcast failed: {:?}", remote.error());
    };
    assert_eq!(response.total_customers, 0);
    assert_eq!(
        response.message.as_deref(),
        Some("No customers found in this segment")
    );
}
