//! Command handlers
//!
//! Arity is checked before a handler runs, so handlers index `args` freely.

use bytes::Bytes;

use crate::protocol::Value;
use crate::store::Store;

pub(super) fn ping(_store: &Store, args: &[Bytes]) -> Value {
    match args.first() {
        Some(msg) => Value::bulk(msg.clone()),
        None => Value::simple("PONG"),
    }
}

pub(super) fn echo(_store: &Store, args: &[Bytes]) -> Value {
    Value::bulk(args[0].clone())
}

pub(super) fn set(store: &Store, args: &[Bytes]) -> Value {
    store.set(args[0].clone(), args[1].clone());
    Value::ok()
}

pub(super) fn get(store: &Store, args: &[Bytes]) -> Value {
    store.get(&args[0]).into()
}

pub(super) fn del(store: &Store, args: &[Bytes]) -> Value {
    let removed = args.iter().filter(|key| store.remove(key)).count();
    Value::integer(removed as i64)
}

pub(super) fn exists(store: &Store, args: &[Bytes]) -> Value {
    let found = args.iter().filter(|key| store.contains(key)).count();
    Value::integer(found as i64)
}

pub(super) fn dbsize(store: &Store, _args: &[Bytes]) -> Value {
    Value::integer(store.len() as i64)
}

/// The engine notices the request itself; the reply is just the acknowledgement
pub(super) fn shutdown(_store: &Store, _args: &[Bytes]) -> Value {
    Value::ok()
}
