//! Example: Arm and disarm partition 1 through the action interface.

use envisalink_bridge::{ActionRequest, Session, SessionConfig, SessionEvent};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = SessionConfig::builder()
        .host("192.168.0.99")
        .password("user")
        .alarm_code("1234")
        .partition_name(1, "Home")
        .build();

    let (session, handle) = Session::new(config);
    tokio::spawn(session.run());

    // Wait for the login handshake before issuing commands
    let mut events = handle.subscribe();
    loop {
        match events.recv().await? {
            SessionEvent::LoggedIn => break,
            event => println!("Event: {:?}", event),
        }
    }

    println!("Arming partition 1 (stay)...");
    handle.request(ActionRequest::StayArm).await?;
    sleep(Duration::from_secs(10)).await;

    println!("Disarming partition 1...");
    handle
        .request(ActionRequest::Disarm { code: None })
        .await?;

    // Watch the resulting partition events for a while
    let watch = async {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::StateChange(change) = event {
                println!("{}", change.message);
            }
        }
    };
    tokio::select! {
        _ = watch => {}
        _ = sleep(Duration::from_secs(10)) => {}
    }

    Ok(())
}
