// MIT License - Copyright (c) 2026 Peter Wright

pub mod framer;
pub mod sender;

pub use framer::LineFramer;
pub use sender::CommandSender;
