// MIT License - Copyright (c) 2026 Peter Wright

//! # envisalink-bridge
//!
//! Persistent TCP client for the Envisalink alarm-panel interface module.
//!
//! Maintains a single long-lived connection to the panel interface,
//! authenticates, parses inbound status lines into structured events and
//! fans them out to subscribers, and translates action requests
//! (arm, disarm, refresh) into wire commands.
//!
//! ## Quick Start
//!
//! ```no_run
//! use envisalink_bridge::{ActionRequest, Session, SessionConfig, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::builder()
//!         .host("192.168.0.99")
//!         .port(4025)
//!         .password("user")
//!         .partition_name(1, "Home")
//!         .zone_name(1, "Front Door")
//!         .build();
//!
//!     let (session, handle) = Session::new(config);
//!     tokio::spawn(session.run());
//!
//!     let mut events = handle.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let SessionEvent::StateChange(change) = event {
//!                 println!("{}", change.message);
//!             }
//!         }
//!     });
//!
//!     handle.request(ActionRequest::Refresh).await?;
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{EnvisalinkError, Result};
pub use event::{ActionRequest, EventReceiver, SessionEvent, SessionHandle, StateChange};
pub use registry::{DefaultStatus, EventKind, PartitionStatus, ResponseDescriptor, ZoneStatus};
pub use session::{Phase, Session};
