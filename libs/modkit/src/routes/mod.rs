//! Route declarations, parsed definitions and the shared route table.

pub mod pattern;
pub mod table;

use http::Method;
use serde::Serialize;

pub use pattern::{Converter, PatternError, RoutePattern};
pub use table::RouteTable;

/// A route as declared by a module, before the registry validates it.
///
/// Methods default to `GET`; the handler id defaults to `<module>::<endpoint>`.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) pattern: String,
    pub(crate) endpoint: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) handler_id: Option<String>,
}

impl Route {
    #[must_use]
    pub fn new(pattern: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            endpoint: endpoint.into(),
            methods: Vec::new(),
            handler_id: None,
        }
    }

    #[must_use]
    pub fn get(pattern: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(pattern, endpoint).method(Method::GET)
    }

    #[must_use]
    pub fn post(pattern: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(pattern, endpoint).method(Method::POST)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    #[must_use]
    pub fn methods(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, Self::method)
    }

    #[must_use]
    pub fn handler(mut self, handler_id: impl Into<String>) -> Self {
        self.handler_id = Some(handler_id.into());
        self
    }

    pub(crate) fn into_definition(
        self,
        module: &str,
    ) -> Result<RouteDefinition, PatternError> {
        let pattern = RoutePattern::parse(&self.pattern)?;
        let methods = if self.methods.is_empty() {
            vec![Method::GET]
        } else {
            self.methods
        };
        let handler_id = self
            .handler_id
            .unwrap_or_else(|| format!("{module}::{}", self.endpoint));
        Ok(RouteDefinition {
            pattern,
            methods,
            endpoint: self.endpoint,
            handler_id,
            module: module.to_owned(),
        })
    }
}

/// A validated route owned by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDefinition {
    pattern: RoutePattern,
    #[serde(serialize_with = "serialize_methods")]
    methods: Vec<Method>,
    endpoint: String,
    handler_id: String,
    module: String,
}

impl RouteDefinition {
    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Opaque reference the HTTP host uses to pick a handler.
    #[must_use]
    pub fn handler_id(&self) -> &str {
        &self.handler_id
    }

    /// Identifier of the owning module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

fn serialize_methods<S: serde::Serializer>(
    methods: &[Method],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(methods.iter().map(Method::as_str))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_get_and_derived_handler_id() {
        let def = Route::new("/chat", "chat_home")
            .into_definition("chat")
            .unwrap();
        assert_eq!(def.methods(), &[Method::GET]);
        assert_eq!(def.handler_id(), "chat::chat_home");
        assert_eq!(def.module(), "chat");
    }

    #[test]
    fn methods_are_deduplicated_in_declaration_order() {
        let def = Route::get("/register", "register")
            .methods([Method::POST, Method::GET])
            .handler("auth::register_form")
            .into_definition("auth")
            .unwrap();
        assert_eq!(def.methods(), &[Method::GET, Method::POST]);
        assert_eq!(def.handler_id(), "auth::register_form");
    }

    #[test]
    fn serializes_methods_as_strings() {
        let def = Route::post("/chat/api/send", "send_message")
            .into_definition("chat")
            .unwrap();
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["methods"], serde_json::json!(["POST"]));
        assert_eq!(json["pattern"], "/chat/api/send");
    }
}
