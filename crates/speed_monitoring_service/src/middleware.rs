/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use std::time::Duration;

use crate::incoming_api;
use crate::tools::prometheus::INCOMING_API;
use actix::fut::{ready, Ready};
use actix_http::{header::CONTENT_LENGTH, StatusCode};
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web::Data,
    Error, HttpRequest,
};
use futures::future::LocalBoxFuture;
use tokio::time::{timeout, Instant};
use tracing::{error, info, Span};
use tracing_actix_web::{DefaultRootSpanBuilder, RootSpanBuilder};
use uuid::Uuid;

use crate::{environment::AppState, tools::error::AppError};

/// Fails a request with `RequestTimeout` once it runs longer than `AppState::request_timeout`
/// milliseconds.
pub struct RequestTimeout;

impl<S: 'static> Transform<S, ServiceRequest> for RequestTimeout
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTimeoutMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimeoutMiddleware { service }))
    }
}

pub struct RequestTimeoutMiddleware<S> {
    service: S,
}

impl<S> Service<ServiceRequest> for RequestTimeoutMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_timeout = req
            .app_data::<Data<AppState>>()
            .map(|data| Duration::from_millis(data.request_timeout));

        let fut = self.service.call(req);
        match request_timeout {
            Some(request_timeout) => Box::pin(async move {
                timeout(request_timeout, fut)
                    .await
                    .map_err(|_| Error::from(AppError::RequestTimeout))?
            }),
            None => Box::pin(fut),
        }
    }
}

/// Root span for every request, tagged with the caller's `x-request-id` (a fresh uuid when
/// absent) and the `x-vehicle-number` header devices send alongside their fixes.
pub struct DomainRootSpanBuilder;

impl RootSpanBuilder for DomainRootSpanBuilder {
    fn on_request_start(request: &ServiceRequest) -> Span {
        let request_id = header_value(request, "x-request-id")
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let vehicle_number = header_value(request, "x-vehicle-number");

        tracing_actix_web::root_span!(request, request_id, vehicle_number)
    }

    fn on_request_end<B: MessageBody>(span: Span, outcome: &Result<ServiceResponse<B>, Error>) {
        DefaultRootSpanBuilder::on_request_end(span, outcome);
    }
}

fn header_value(request: &ServiceRequest, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Logs every request and observes its latency on the `incoming_api` histogram, labelled by
/// the matched route pattern rather than the raw path.
pub struct IncomingRequestMetrics;

impl<S> Transform<S, ServiceRequest> for IncomingRequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = IncomingRequestMetricsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IncomingRequestMetricsMiddleware { service }))
    }
}

pub struct IncomingRequestMetricsMiddleware<S> {
    service: S,
}

impl<S> Service<ServiceRequest> for IncomingRequestMetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let req_method = req.method().to_string();
        let req_path = route_path(req.request());

        let fut = self.service.call(req);
        Box::pin(async move {
            match fut.await {
                Ok(response) => {
                    record_request(
                        response.response().error(),
                        response.status(),
                        &req_method,
                        &route_path(response.request()),
                        start_time,
                    );
                    Ok(response)
                }
                Err(err) => {
                    record_request(
                        Some(&err),
                        err.error_response().status(),
                        &req_method,
                        &req_path,
                        start_time,
                    );
                    Err(err)
                }
            }
        })
    }
}

/// Labels a request by its route pattern, so `/ui/monitor/MH12AB1234/status` becomes
/// `/ui/monitor/{vehicleNumber}/status`. Unmatched requests keep their raw path.
fn route_path(request: &HttpRequest) -> String {
    request
        .match_pattern()
        .unwrap_or_else(|| request.path().to_string())
}

fn record_request(
    err_resp: Option<&Error>,
    resp_status: StatusCode,
    req_method: &str,
    req_path: &str,
    time: Instant,
) {
    let latency = format!("{:?}ms", time.elapsed().as_millis());
    match err_resp {
        Some(err_resp) => {
            let err_resp_code = err_resp.to_string();
            error!(tag = "[INCOMING API - ERROR]", request_method = %req_method, request_path = %req_path, response_code = err_resp_code, response_status = resp_status.as_str(), latency = latency);
            incoming_api!(
                req_method,
                req_path,
                resp_status.as_str(),
                err_resp_code.as_str(),
                time
            );
        }
        None => {
            info!(tag = "[INCOMING API]", request_method = %req_method, request_path = %req_path, response_status = resp_status.as_str(), latency = latency);
            incoming_api!(req_method, req_path, resp_status.as_str(), "SUCCESS", time);
        }
    }
}

/// Rejects requests whose declared `Content-Length` exceeds `AppState::max_allowed_req_size`.
/// Location pushes are tiny, so anything large is refused before the body is read.
pub struct CheckContentLength;

impl<S> Transform<S, ServiceRequest> for CheckContentLength
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CheckContentLengthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CheckContentLengthMiddleware { service }))
    }
}

pub struct CheckContentLengthMiddleware<S> {
    service: S,
}

impl<S> Service<ServiceRequest> for CheckContentLengthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let content_length = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|content_length| content_length.to_str().ok()?.parse::<usize>().ok());
        let limit = req
            .app_data::<Data<AppState>>()
            .map(|data| data.max_allowed_req_size);

        if let (Some(content_length), Some(limit)) = (content_length, limit) {
            if content_length > limit {
                return Box::pin(ready(Err(Error::from(AppError::LargePayloadSize(
                    content_length,
                    limit,
                )))));
            }
        }

        Box::pin(self.service.call(req))
    }
}
