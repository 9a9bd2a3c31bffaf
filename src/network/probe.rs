use std::time::Duration;

use async_trait::async_trait;

use super::health::LinkState;

/// Connectivity collaborator: radio, HTTP client and payment socket.
///
/// Status queries are synchronous reads of driver state. The two probes are
/// async and must honor their timeout; the supervisor also bounds them.
/// Reconnect calls only kick off the work and return at once.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + 'static {
    fn link_status(&self) -> LinkState;

    fn socket_is_connected(&self) -> bool;

    /// Sends a liveness ping on the socket; the pong arrives as an external event.
    fn send_ping(&self);

    /// Performs a GET; returns the status code, or `None` on transport failure.
    async fn http_probe(&self, url: &str, timeout: Duration) -> Option<u16>;

    /// Opens and closes a TCP connection.
    async fn tcp_probe(&self, host: &str, port: u16, timeout: Duration) -> bool;

    fn disconnect_socket(&self);

    fn reconnect_socket(&self);

    /// Starts re-associating with the access point.
    fn begin_link_reconnect(&self);
}
