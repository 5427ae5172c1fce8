//! `sdm stop` – ask a running `sdm download` to stop before its next item.

use anyhow::Result;
use sdm_core::protocol::ControlRequest;

use crate::cli::control_socket;

pub async fn run_stop() -> Result<()> {
    let path = sdm_core::control::default_control_socket_path()?;
    match control_socket::send_request(&path, ControlRequest::StopDownload).await? {
        Some(_) => println!("Stop requested; the current item will finish first"),
        None => println!("No download running"),
    }
    Ok(())
}
