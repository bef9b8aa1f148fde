//! Example: Connect to a panel interface and print session events.

use envisalink_bridge::{Session, SessionConfig, SessionEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = SessionConfig::builder()
        .host("192.168.0.99")
        .port(4025)
        .password("user")
        .alarm_code("1234")
        .partition_name(1, "Home")
        .zone_name(1, "Front Door")
        .zone_name(2, "Back Door")
        .user_name(1, "Alice")
        .build();

    let (session, handle) = Session::new(config);
    let session_task = tokio::spawn(session.run());

    let mut events = handle.subscribe();
    println!("Listening for panel events (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(SessionEvent::StateChange(change)) => {
                        println!("{} {}: {}", change.kind.as_str(), change.target, change.message);
                    }
                    Ok(event) => {
                        println!("Event: {:?}", event);
                    }
                    Err(e) => {
                        println!("Event channel error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    drop(handle);
    session_task.await??;
    Ok(())
}
