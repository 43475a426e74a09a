use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// Per-call context supplied by the transport, e.g. the authenticated caller.
///
/// The server core never looks inside: it threads the context through to every resource, tool
/// and prompt handler unchanged. Values are keyed by type, so each transport or middleware can
/// attach its own without coordinating on names.
///
/// # Examples
///
/// ```
/// # use quay::context::CallContext;
/// #[derive(Debug, PartialEq)]
/// struct Caller(String);
///
/// let ctx = CallContext::new().with(Caller("alice".into()));
/// assert_eq!(ctx.get::<Caller>(), Some(&Caller("alice".into())));
/// assert_eq!(ctx.get::<u32>(), None);
/// ```
#[derive(Clone, Default)]
pub struct CallContext {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.as_ref().downcast_ref::<T>())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("entries", &self.map.len())
            .finish()
    }
}
