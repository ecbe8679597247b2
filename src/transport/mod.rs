//! Interface boundary to the HTTP collaborator. The engine only calls
//! this during association resolution; retry, timeout and
//! authentication policy all belong to the implementation behind the
//! trait, and transport failures propagate through unchanged.

use crate::core::{ResourceError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Blocking wire transport. `Ok(None)` means the server reported no
/// content for the request.
pub trait Transport {
    fn fetch(&self, path: &str, query: Option<&str>) -> Result<Option<Vec<u8>>>;

    fn send(&self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Option<Vec<u8>>>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn fetch(&self, path: &str, query: Option<&str>) -> Result<Option<Vec<u8>>> {
        (**self).fetch(path, query)
    }

    fn send(&self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Option<Vec<u8>>> {
        (**self).send(method, path, body)
    }
}

/// In-memory transport double: canned responses keyed by path, with a
/// request log for call-count assertions.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the response body served for `path`.
    pub fn respond(&mut self, path: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.insert(path.into(), body.into());
    }

    /// Registers a no-content response for `path`.
    pub fn respond_empty(&mut self, path: impl Into<String>) {
        self.responses.insert(path.into(), Vec::new());
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Transport for MockTransport {
    fn fetch(&self, path: &str, _query: Option<&str>) -> Result<Option<Vec<u8>>> {
        self.requests.lock()?.push(path.to_string());
        match self.responses.get(path) {
            Some(body) if body.is_empty() => Ok(None),
            Some(body) => Ok(Some(body.clone())),
            None => Err(ResourceError::Transport(format!(
                "no response registered for '{}'",
                path
            ))),
        }
    }

    fn send(&self, _method: Method, path: &str, _body: Option<&[u8]>) -> Result<Option<Vec<u8>>> {
        self.fetch(path, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_requests() {
        let mut transport = MockTransport::new();
        transport.respond("/people/1.json", br#"{"id":1}"#.to_vec());

        let body = transport.fetch("/people/1.json", None).unwrap();
        assert!(body.is_some());
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests(), vec!["/people/1.json".to_string()]);
    }

    #[test]
    fn test_mock_no_content_and_missing() {
        let mut transport = MockTransport::new();
        transport.respond_empty("/people/1/avatar.json");

        assert_eq!(transport.fetch("/people/1/avatar.json", None).unwrap(), None);
        assert!(matches!(
            transport.fetch("/nowhere.json", None),
            Err(ResourceError::Transport(_))
        ));
    }
}
