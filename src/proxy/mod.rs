//! Proxy-side components: the recipe wire protocol and server loop.

pub mod server;
pub mod wire;

pub use server::{run_reallocation_loop, serve};
pub use wire::Message;
