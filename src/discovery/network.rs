// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Active network scanning for controllers.
//!
//! Every assigned IPv4 address of every non-loopback interface defines a
//! subnet; every host address in those subnets is probed fully in parallel.
//! A probe is two stages: a short-timeout TCP reachability check on the
//! controller port, then an HTTP request to the data-listing endpoint. Any
//! failure at either stage collapses to "absent" with no distinction
//! surfaced. The scan completes when all probes settle or the search
//! window elapses, whichever comes first.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use ipnetwork::Ipv4Network;
use tokio::net::TcpStream;

use crate::host::{DiscoveryCandidate, DiscoverySink};
use crate::protocol::CONTROLLER_PORT;

/// Default TCP reachability timeout per address.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default bound on the whole scan.
const DEFAULT_SEARCH_WINDOW: Duration = Duration::from_secs(240);

/// Options for a network scan.
///
/// # Examples
///
/// ```
/// use veralink::discovery::ScanOptions;
/// use std::time::Duration;
///
/// let options = ScanOptions::new()
///     .with_port(3480)
///     .with_search_window(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct ScanOptions {
    port: u16,
    probe_timeout: Duration,
    search_window: Duration,
}

impl ScanOptions {
    /// Creates scan options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the controller port to probe.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the TCP reachability timeout per address.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the bound on the whole scan.
    #[must_use]
    pub fn with_search_window(mut self, window: Duration) -> Self {
        self.search_window = window;
        self
    }

    /// Returns the controller port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the per-address probe timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Returns the search window.
    #[must_use]
    pub fn search_window(&self) -> Duration {
        self.search_window
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            port: CONTROLLER_PORT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            search_window: DEFAULT_SEARCH_WINDOW,
        }
    }
}

/// Scans the local subnets for controllers.
///
/// Safe to run repeatedly: candidates already known to the host (previous
/// results or registered entities) are not re-emitted.
pub struct NetworkScanner {
    options: ScanOptions,
    sink: Arc<dyn DiscoverySink>,
}

impl NetworkScanner {
    /// Creates a scanner with default options.
    #[must_use]
    pub fn new(sink: Arc<dyn DiscoverySink>) -> Self {
        Self::with_options(sink, ScanOptions::default())
    }

    /// Creates a scanner with custom options.
    #[must_use]
    pub fn with_options(sink: Arc<dyn DiscoverySink>, options: ScanOptions) -> Self {
        Self { options, sink }
    }

    /// Runs one scan pass.
    ///
    /// Probes run fully in parallel with no ordering guarantee between
    /// candidates; the pass returns once every probe settled or the search
    /// window elapsed.
    pub async fn scan(&self) {
        let targets = subnet_hosts();
        tracing::info!(
            targets = targets.len(),
            window_secs = self.options.search_window.as_secs(),
            "Starting controller scan"
        );

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build probe HTTP client");
                return;
            }
        };

        let mut probes = Vec::with_capacity(targets.len());
        for address in targets {
            let options = self.options.clone();
            let client = client.clone();
            probes.push(tokio::spawn(async move {
                probe(address, &options, &client).await
            }));
        }

        let deadline = tokio::time::Instant::now() + self.options.search_window;
        let mut found = 0_usize;
        let mut expired = false;
        for mut handle in probes {
            if expired {
                handle.abort();
                continue;
            }
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(Some(address))) => {
                    if self.emit(address) {
                        found += 1;
                    }
                }
                Ok(_) => {}
                Err(_) => {
                    tracing::debug!("Search window elapsed, aborting remaining probes");
                    handle.abort();
                    expired = true;
                }
            }
        }

        tracing::info!(found, "Controller scan completed");
    }

    /// Emits a candidate unless the host already knows it. Returns true
    /// when the candidate was forwarded.
    fn emit(&self, address: Ipv4Addr) -> bool {
        let candidate = DiscoveryCandidate::from_address(address);
        if self.sink.is_known(&candidate.uid) {
            tracing::debug!(uid = %candidate.uid, "Controller already known, skipping");
            return false;
        }
        tracing::info!(address = %address, "Controller found");
        self.sink.controller_found(candidate);
        true
    }
}

/// Two-stage probe of one address: TCP reachability, then an HTTP request
/// to the data-listing endpoint. Every failure collapses to `None`.
async fn probe(
    address: Ipv4Addr,
    options: &ScanOptions,
    client: &reqwest::Client,
) -> Option<Ipv4Addr> {
    let socket = SocketAddr::from((address, options.port));
    match tokio::time::timeout(options.probe_timeout, TcpStream::connect(socket)).await {
        Ok(Ok(_stream)) => {}
        _ => return None,
    }

    let url = format!(
        "http://{address}:{}/data_request?id=sdata&output_format=json",
        options.port
    );
    match client.get(&url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => Some(address),
        _ => None,
    }
}

/// Enumerates every host address in every subnet assigned to a local,
/// non-loopback interface.
fn subnet_hosts() -> Vec<Ipv4Addr> {
    let interfaces = match get_if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot enumerate network interfaces");
            return Vec::new();
        }
    };

    let mut hosts = Vec::new();
    for interface in interfaces {
        if interface.is_loopback() {
            continue;
        }
        let get_if_addrs::IfAddr::V4(ref addr) = interface.addr else {
            continue;
        };
        let prefix = match ipnetwork::ipv4_mask_to_prefix(addr.netmask) {
            Ok(prefix) => prefix,
            Err(e) => {
                tracing::debug!(interface = %interface.name, error = %e, "Bad netmask");
                continue;
            }
        };
        let Ok(network) = Ipv4Network::new(addr.ip, prefix) else {
            continue;
        };
        tracing::debug!(
            interface = %interface.name,
            network = %network,
            "Scanning subnet"
        );
        hosts.extend(hosts_in(network, addr.ip));
    }
    hosts
}

/// Host addresses of a subnet, excluding the network and broadcast
/// addresses and the local address itself.
fn hosts_in(network: Ipv4Network, local: Ipv4Addr) -> impl Iterator<Item = Ipv4Addr> {
    network
        .iter()
        .filter(move |addr| *addr != network.network() && *addr != network.broadcast())
        .filter(move |addr| *addr != local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests_support::RecordingSink;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn options_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.port(), 3480);
        assert_eq!(options.probe_timeout(), Duration::from_millis(100));
        assert_eq!(options.search_window(), Duration::from_secs(240));
    }

    #[test]
    fn options_chained() {
        let options = ScanOptions::new()
            .with_port(8080)
            .with_probe_timeout(Duration::from_millis(50))
            .with_search_window(Duration::from_secs(30));
        assert_eq!(options.port(), 8080);
        assert_eq!(options.probe_timeout(), Duration::from_millis(50));
        assert_eq!(options.search_window(), Duration::from_secs(30));
    }

    #[test]
    fn hosts_exclude_network_broadcast_and_local() {
        let local = Ipv4Addr::new(192, 168, 1, 10);
        let network = Ipv4Network::new(local, 29).unwrap();
        let hosts: Vec<Ipv4Addr> = hosts_in(network, local).collect();

        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 8))); // network
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 15))); // broadcast
        assert!(!hosts.contains(&local));
        assert_eq!(hosts.len(), 5);
    }

    #[tokio::test]
    async fn probe_accepts_responding_controller() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data_request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "devices": [], "scenes": []
            })))
            .mount(&server)
            .await;

        let address = Ipv4Addr::LOCALHOST;
        let port = server.address().port();
        let options = ScanOptions::new()
            .with_port(port)
            .with_probe_timeout(Duration::from_millis(500));
        let client = reqwest::Client::new();

        assert_eq!(probe(address, &options, &client).await, Some(address));
    }

    #[tokio::test]
    async fn probe_rejects_non_200_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let options = ScanOptions::new()
            .with_port(server.address().port())
            .with_probe_timeout(Duration::from_millis(500));
        let client = reqwest::Client::new();

        assert_eq!(probe(Ipv4Addr::LOCALHOST, &options, &client).await, None);
    }

    #[tokio::test]
    async fn probe_rejects_closed_port() {
        // Bind and drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let options = ScanOptions::new().with_port(port);
        let client = reqwest::Client::new();

        assert_eq!(probe(Ipv4Addr::LOCALHOST, &options, &client).await, None);
    }

    #[tokio::test]
    async fn emit_deduplicates_against_sink() {
        let sink = Arc::new(RecordingSink::default());
        let scanner = NetworkScanner::new(sink.clone() as Arc<dyn DiscoverySink>);
        let address = Ipv4Addr::new(192, 168, 1, 10);

        assert!(scanner.emit(address));
        // The first emission is retained by the host; a second pass must
        // not re-emit it.
        assert!(!scanner.emit(address));
        assert_eq!(sink.controllers.lock().len(), 1);
    }
}
