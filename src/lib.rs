#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

mod blink;
mod config;
mod error;
mod mode;
mod platform;
#[cfg(feature = "rp2040")]
mod rp;
mod service;
mod state;

pub use blink::*;
pub use config::*;
pub use error::*;
pub use mode::*;
pub use platform::*;
#[cfg(feature = "rp2040")]
pub use rp::*;
pub use service::*;
pub use state::*;
