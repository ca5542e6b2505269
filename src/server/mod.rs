/// Server module: router construction and the serve loop
mod server;

pub use server::{build_router, run_server};
