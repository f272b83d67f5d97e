//! Command dispatcher
//!
//! Runs validated requests against an injected store.

use std::sync::Arc;

use crate::error::KvError;
use crate::protocol::Value;
use crate::store::Store;

use super::Request;

/// Routes requests to their handlers
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<Store>,
}

impl Dispatcher {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Run a request and produce its reply
    pub fn dispatch(&self, request: &Request) -> Value {
        (request.kind.spec().handler)(&self.store, &request.args)
    }
}

/// Render an error as an `-ERR ...` reply
pub fn error_reply(err: &KvError) -> Value {
    Value::error(format!("ERR {}", err))
}
