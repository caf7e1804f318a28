use std::net::{Ipv4Addr, TcpListener};

use crate::error::{HarnessError, Result};

/// Asks the OS for an ephemeral TCP port on the loopback interface.
///
/// The listener is closed before returning, so the port is only very likely
/// to still be free when the container binds it.
pub fn acquire_free_port() -> Result<u16> {
    let listener =
        TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(HarnessError::PortUnavailable)?;
    let port = listener
        .local_addr()
        .map_err(HarnessError::PortUnavailable)?
        .port();
    drop(listener);

    tracing::debug!(port, "acquired free port");
    Ok(port)
}
