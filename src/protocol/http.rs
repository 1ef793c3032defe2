// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the controller API.

use std::time::Duration;

use reqwest::Client;

use crate::error::ConnectivityError;
use crate::snapshot::ControllerData;

const DATA_REQUEST_PATH: &str = "/data_request";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const SWITCH_SERVICE: &str = "urn:upnp-org:serviceId:SwitchPower1";
const DIMMING_SERVICE: &str = "urn:upnp-org:serviceId:Dimming1";

/// HTTP client for one controller endpoint.
///
/// Stateless: each request is independent, and command requests are
/// fire-and-forget (the response body carries no structured result worth
/// relying on).
///
/// # Examples
///
/// ```no_run
/// use veralink::protocol::ControllerClient;
///
/// # async fn example() -> veralink::Result<()> {
/// let client = ControllerClient::new("192.168.1.10", 3480)?;
/// let data = client.fetch_data().await?;
/// println!("{} devices", data.devices.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ControllerClient {
    base_url: String,
    client: Client,
}

impl ControllerClient {
    /// Creates a client for the controller at `host:port`.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be created.
    pub fn new(host: impl AsRef<str>, port: u16) -> Result<Self, ConnectivityError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ConnectivityError::Http)?;

        Ok(Self {
            base_url: format!("http://{}:{port}", host.as_ref()),
            client,
        })
    }

    /// Returns the base URL of the controller.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the data-listing endpoint.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!(
            "{}{DATA_REQUEST_PATH}?id=sdata&output_format=json",
            self.base_url
        )
    }

    fn action_url(&self, device_id: &str, service: &str, action: &str, argument: &str) -> String {
        format!(
            "{}{DATA_REQUEST_PATH}?id=action&output_format=json&DeviceNum={}&serviceId={service}&action={action}&{argument}",
            self.base_url,
            urlencoding::encode(device_id),
        )
    }

    /// Fetches the controller's current device/scene listing.
    ///
    /// # Errors
    ///
    /// Any non-200 response or malformed JSON body is a failed poll.
    pub async fn fetch_data(&self) -> Result<ControllerData, ConnectivityError> {
        let url = self.data_url();
        tracing::debug!(url = %url, "Fetching controller data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ConnectivityError::Http)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ConnectivityError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(ConnectivityError::Http)?;
        let data: ControllerData =
            serde_json::from_str(&body).map_err(ConnectivityError::MalformedResponse)?;

        tracing::debug!(
            devices = data.devices.len(),
            scenes = data.scenes.len(),
            "Controller data received"
        );

        Ok(data)
    }

    /// Issues a "set level" action for a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the controller answers
    /// non-200. Callers treat the action as fire-and-forget and only log
    /// failures.
    pub async fn set_level(&self, device_id: &str, level: &str) -> Result<(), ConnectivityError> {
        let argument = format!(
            "newLoadlevelTarget={}",
            urlencoding::encode(level)
        );
        let url = self.action_url(device_id, DIMMING_SERVICE, "SetLoadLevelTarget", &argument);
        self.send_action(&url).await
    }

    /// Issues a "turn on" or "turn off" action for a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the controller answers
    /// non-200.
    pub async fn switch(&self, device_id: &str, on: bool) -> Result<(), ConnectivityError> {
        let argument = format!("newTargetValue={}", u8::from(on));
        let url = self.action_url(device_id, SWITCH_SERVICE, "SetTarget", &argument);
        self.send_action(&url).await
    }

    async fn send_action(&self, url: &str) -> Result<(), ConnectivityError> {
        tracing::debug!(url = %url, "Sending controller action");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ConnectivityError::Http)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ConnectivityError::UnexpectedStatus(status.as_u16()));
        }

        Ok(())
    }
}
