//! `sdm ping` – liveness and version of a running `sdm download`.

use anyhow::Result;
use sdm_core::protocol::ControlRequest;

use crate::cli::control_socket;

pub async fn run_ping() -> Result<()> {
    let path = sdm_core::control::default_control_socket_path()?;
    match control_socket::send_request(&path, ControlRequest::Ping).await? {
        Some(reply) => {
            let version = reply.version.unwrap_or_default();
            let state = if reply.active == Some(true) {
                "downloading"
            } else {
                "idle"
            };
            println!("sdm {} ({}): {}", version, reply.status, state);
        }
        None => println!("No download running"),
    }
    Ok(())
}
