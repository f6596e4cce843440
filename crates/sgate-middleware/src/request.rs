//! # Request Attributes
//!
//! The only thing the middleware needs from a request is a way to look up
//! a named part of it. Attribute names are open-ended: whatever names the
//! host's request type exposes can be configured.

use std::collections::HashMap;
use std::hash::BuildHasher;

use serde_json::{Map, Value};

/// Read access to the named parts of a request.
pub trait RequestAttributes {
    /// Value of the attribute called `name`, or `None` if the request has no
    /// such attribute.
    ///
    /// Missing attributes are validated as JSON `null`. JSON has no
    /// "undefined", so a schema that accepts `null` (`{"type": "null"}`,
    /// `true`, `{}`) also accepts an absent attribute. Use a non-null type
    /// to make an attribute mandatory.
    fn attribute(&self, name: &str) -> Option<&Value>;
}

impl RequestAttributes for Map<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<S: BuildHasher> RequestAttributes for HashMap<String, Value, S> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// A JSON object acts as a request keyed by its top-level fields; any other
/// value has no attributes.
impl RequestAttributes for Value {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(name))
    }
}
