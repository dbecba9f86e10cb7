use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One canned answer. A `None` status never answers: the connection stays
/// open until the stub shuts down.
#[derive(Debug, Clone)]
pub struct StubRoute {
    pub method: &'static str,
    pub path: &'static str,
    pub status: Option<u16>,
    pub body: String,
}

impl StubRoute {
    pub fn json(method: &'static str, path: &'static str, status: u16, body: &str) -> Self {
        Self {
            method,
            path,
            status: Some(status),
            body: body.to_owned(),
        }
    }

    pub fn hang(method: &'static str, path: &'static str) -> Self {
        Self {
            method,
            path,
            status: None,
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

pub struct ContentApiStub {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ContentApiStub {
    pub fn spawn(routes: Vec<StubRoute>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start content api stub");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/api/v1");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut parked = Vec::new();
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let method = request.method().to_string().to_uppercase();
                let path = request.url().to_string();
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.lock().expect("lock").push(RecordedRequest {
                    method: method.clone(),
                    path: path.clone(),
                    body,
                });

                let route = routes
                    .iter()
                    .find(|r| r.method == method && format!("/api/v1{}", r.path) == path);
                match route {
                    Some(StubRoute {
                        status: Some(status),
                        body,
                        ..
                    }) => {
                        let header = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"application/json"[..],
                        )
                        .expect("content-type header");
                        let _ = request.respond(
                            tiny_http::Response::from_string(body.clone())
                                .with_status_code(*status)
                                .with_header(header),
                        );
                    }
                    Some(_) => parked.push(request),
                    None => {
                        let _ = request.respond(
                            tiny_http::Response::from_string(r#"{"detail":"Not Found"}"#)
                                .with_status_code(404),
                        );
                    }
                }
            }
            drop(parked);
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Drop for ContentApiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
