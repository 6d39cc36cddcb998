//! In-memory ACME client for tests and dry runs

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::{CertClient, CertError, IssueRequest};

type SuccessHook = Box<dyn Fn(&IssueRequest)>;

/// [`CertClient`] with scripted outcomes per hostname.
///
/// Hosts without a script succeed. The success hook lets tests drop a
/// certificate where the real client would.
#[derive(Default)]
pub struct InMemoryCertClient {
    always_fail: HashMap<String, CertError>,
    fail_first: RefCell<HashMap<String, VecDeque<CertError>>>,
    on_success: Option<SuccessHook>,
    requests: RefCell<Vec<IssueRequest>>,
}

impl fmt::Debug for InMemoryCertClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCertClient")
            .field("always_fail", &self.always_fail)
            .field("requests", &self.requests.borrow().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryCertClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request for `hostname` fails with `error`.
    pub fn failing(mut self, hostname: &str, error: CertError) -> Self {
        self.always_fail.insert(hostname.to_string(), error);
        self
    }

    /// The next `times` requests for `hostname` fail, later ones succeed.
    pub fn failing_times(self, hostname: &str, times: usize, error: CertError) -> Self {
        self.fail_first
            .borrow_mut()
            .insert(hostname.to_string(), std::iter::repeat_n(error, times).collect());
        self
    }

    pub fn on_success(mut self, hook: impl Fn(&IssueRequest) + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Hostnames requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| r.hostname.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<IssueRequest> {
        self.requests.borrow().clone()
    }
}

impl CertClient for InMemoryCertClient {
    fn issue(&self, request: &IssueRequest) -> Result<(), CertError> {
        self.requests.borrow_mut().push(request.clone());

        if let Some(error) = self.always_fail.get(&request.hostname) {
            return Err(error.clone());
        }
        if let Some(error) = self
            .fail_first
            .borrow_mut()
            .get_mut(&request.hostname)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        if let Some(hook) = &self.on_success {
            hook(request);
        }
        Ok(())
    }
}
