/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::call_external_api;
use crate::tools::error::AppError;
use crate::tools::prometheus::CALL_EXTERNAL_API;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{error, info};

static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

fn header_map(headers: Vec<(&str, &str)>) -> Result<HeaderMap, AppError> {
    headers
        .into_iter()
        .map(|(key, value)| {
            let name = HeaderName::from_str(key)
                .map_err(|_| AppError::InvalidRequest(format!("Invalid Header Name : {key}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| AppError::InvalidRequest(format!("Invalid Header Value : {value}")))?;
            Ok((name, value))
        })
        .collect()
}

/// `scheme://host:port` of the target, used as the metric label.
fn host_label(url: &Url) -> String {
    format!(
        "{}://{}:{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.port_or_known_default().unwrap_or(80)
    )
}

/// Sends `body` as JSON to `url` and decodes a 2xx response into `T`.
///
/// Transport failures and non-2xx statuses both become `ExternalAPICallError`. Every call is
/// observed on `external_request_duration`, labelled by host, path and status.
pub async fn call_api<T, U>(
    method: Method,
    url: &Url,
    headers: Vec<(&str, &str)>,
    body: Option<U>,
    timeout: Option<Duration>,
) -> Result<T, AppError>
where
    T: DeserializeOwned,
    U: Serialize + Debug,
{
    let start_time = Instant::now();
    let host = host_label(url);

    let mut request = HTTP_CLIENT
        .request(method.to_owned(), url.to_owned())
        .headers(header_map(headers)?);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    if let Some(body) = &body {
        request = request.json(body);
    }

    let result: Result<Response, reqwest::Error> = request.send().await;

    let status = match &result {
        Ok(resp) => resp.status().as_str().to_string(),
        Err(err) => err
            .status()
            .map(|status| status.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
    };
    call_external_api!(
        method.as_str(),
        host.as_str(),
        url.path(),
        status.as_str(),
        start_time
    );

    let latency = format!("{:?}ms", start_time.elapsed().as_millis());
    match result {
        Ok(resp) if resp.status().is_success() => {
            info!(tag = "[OUTGOING API]", request_method = %method, request_url = %host, request_path = url.path(), request_body = ?body, response_status = %status, latency = latency);
            resp.json::<T>()
                .await
                .map_err(|err| AppError::DeserializationError(err.to_string()))
        }
        Ok(resp) => {
            error!(tag = "[OUTGOING API - ERROR]", request_method = %method, request_url = %host, request_path = url.path(), request_body = ?body, response_status = %status, latency = latency);
            Err(AppError::ExternalAPICallError(resp.status().to_string()))
        }
        Err(err) => {
            error!(tag = "[OUTGOING API - ERROR]", request_method = %method, request_url = %host, request_path = url.path(), request_body = ?body, error = %err, latency = latency);
            Err(AppError::ExternalAPICallError(err.to_string()))
        }
    }
}
