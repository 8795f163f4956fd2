use crate::{builder::Builder, handler::Handler, payload::PushEvent, repository::Repository};
use log::{debug, error, info, warn};
use serde_json::json;
use std::{
    io::{Cursor, Read},
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};

/// The only route, everything else is a 404.
const TRIGGER_PATH: &str = "/trigger-benchmark";

/// A custom error describing the error cases for the webhook server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Cannot bind the listening socket, usually a permission or
    /// address-in-use problem.
    #[error("cannot start server on {0}")]
    FailedToBind(String),
}

/// A minimal HTTP 1.1 server receiving push webhooks.
///
/// Requests are taken off the socket one at a time and the handler sits
/// behind a mutex, so two pushes can never fetch, check out or build over
/// each other. The response is only sent once the whole sequence finished,
/// which is how the webhook dispatcher learns about build failures.
pub struct WebhookServer<R: Repository, B: Builder> {
    address: String,
    handler: Mutex<Handler<R, B>>,
}

impl<R: Repository, B: Builder> WebhookServer<R, B> {
    /// Creates a new server from an address ("0.0.0.0:80") and a handler.
    pub fn new(address: String, handler: Handler<R, B>) -> Self {
        WebhookServer {
            address,
            handler: Mutex::new(handler),
        }
    }

    /// Listen until the process is asked to terminate.
    ///
    /// A failing client write is logged and serving continues, a dropped
    /// webhook dispatcher must not stop the service.
    pub fn serve(&self) -> Result<(), ServerError> {
        let server = Server::http(&self.address)
            .map_err(|_| ServerError::FailedToBind(self.address.clone()))?;
        let server = Arc::new(server);
        Self::unblock_on_termination(&server);

        info!("Listening on {}...", self.address);
        for mut request in server.incoming_requests() {
            debug!("Received request on {} {}.", request.method(), request.url());

            let response = self.respond(&mut request);
            if let Err(err) = request.respond(response) {
                error!("Failed sending response: {err}.");
            }
        }

        info!("Shutting down.");
        Ok(())
    }

    fn respond(&self, request: &mut Request) -> Response<Cursor<Vec<u8>>> {
        let path = request.url().split('?').next().unwrap_or("");
        if path != TRIGGER_PATH {
            return Response::from_string("").with_status_code(404);
        }
        if request.method() != &Method::Post {
            return Response::from_string("").with_status_code(405);
        }

        let mut body = String::new();
        if let Err(err) = request.as_reader().read_to_string(&mut body) {
            warn!("Failed reading request body: {err}.");
            return json_response(400, "Invalid payload", &err.to_string());
        }
        let event: PushEvent = match serde_json::from_str(&body) {
            Ok(event) => event,
            Err(err) => {
                warn!("Failed parsing request body: {err}.");
                return json_response(400, "Invalid payload", &err.to_string());
            }
        };

        // One push at a time: the sequence on the shared checkout never
        // interleaves. A poisoned lock means a previous request panicked,
        // the checkout is still usable so serving continues.
        let mut handler = match self.handler.lock() {
            Ok(handler) => handler,
            Err(poisoned) => poisoned.into_inner(),
        };
        match handler.handle(&event) {
            Ok(_) => Response::from_string("").with_status_code(200),
            Err(err) => {
                error!("Errored: {err}.");
                json_response(500, "An error occurred", &err.to_string())
            }
        }
    }

    #[cfg(unix)]
    fn unblock_on_termination(server: &Arc<Server>) {
        use signal_hook::{consts::TERM_SIGNALS, iterator::Signals};
        use std::thread;

        match Signals::new(TERM_SIGNALS) {
            Ok(mut signals) => {
                let server = server.clone();
                thread::spawn(move || {
                    if let Some(signal) = signals.forever().next() {
                        debug!("Got signal {signal}, terminating after the current request.");
                        server.unblock();
                    }
                });
            }
            Err(err) => warn!("Failed setting up signal handler: {err}."),
        }
    }

    #[cfg(not(unix))]
    fn unblock_on_termination(_server: &Arc<Server>) {
        debug!("Signal handlers are not supported on non-unix systems.");
    }
}

fn json_response(status: u16, message: &str, error: &str) -> Response<Cursor<Vec<u8>>> {
    let body = json!({ "message": message, "error": error });
    let mut response = Response::from_string(body.to_string()).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}
