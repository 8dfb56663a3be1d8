//! Handlers, handler instantiators and the type-erased call they compile to.

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::engine::context::Context;
use crate::engine::error::InvocationError;
use crate::engine::failure::Failure;
use crate::engine::options::HandlerOptions;
use crate::engine::shape::{Payload, Signature, TypeShape};
use crate::parser::Method;

/// Type alias for the boxed future a bound handler returns.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Outcome, InvocationError>> + Send>>;

/// Type alias for a handler erased to `(context, body, path params)`.
pub type HandlerFn = Arc<dyn Fn(Context, Body, Vec<String>) -> HandlerFuture + Send + Sync>;

/// Type alias for the decoder of a handler's body type.
pub type DecodeFn = fn(&[u8]) -> Result<Body, serde_json::Error>;

/// What a handler call produced.
pub enum Outcome {
    /// The encoded result.
    Success(Vec<u8>),
    /// The handler returned an error.
    Failed(Box<dyn Failure>),
    /// The handler succeeded but its result could not be encoded.
    Unencodable(serde_json::Error),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(bytes) => f.debug_tuple("Success").field(&String::from_utf8_lossy(bytes)).finish(),
            Outcome::Failed(failure) => f.debug_tuple("Failed").field(&failure.to_string()).finish(),
            Outcome::Unencodable(error) => f.debug_tuple("Unencodable").field(error).finish(),
        }
    }
}

/// A decoded request body on its way to a handler.
///
/// Middleware sees the body between decoding and invocation. It can inspect
/// it as JSON, mutate it in place, or swap it for another value.
pub struct Body {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
    inspect: fn(&(dyn Any + Send)) -> Option<serde_json::Value>,
}

impl Body {
    pub fn new<T: Serialize + Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
            inspect: inspect::<T>,
        }
    }

    /// Name of the type currently held.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        (*self.value).is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        (*self.value).downcast_mut::<T>()
    }

    /// Take the value out, or get the body back if it holds another type.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let Body {
            value,
            type_name,
            inspect,
        } = self;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Body {
                value,
                type_name,
                inspect,
            }),
        }
    }

    /// The body re-encoded as a JSON value.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        (self.inspect)(&*self.value)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("type", &self.type_name).finish()
    }
}

fn inspect<T: Serialize + 'static>(value: &(dyn Any + Send)) -> Option<serde_json::Value> {
    value
        .downcast_ref::<T>()
        .and_then(|value| serde_json::to_value(value).ok())
}

/// Types a handler can take as its body. An empty request body decodes to
/// `Default::default()`.
pub trait RequestBody: DeserializeOwned + Serialize + Default + Payload + Send {}

impl<T> RequestBody for T where T: DeserializeOwned + Serialize + Default + Payload + Send {}

/// Types a handler can return.
pub trait Reply: Serialize + Payload + Send {}

impl<T> Reply for T where T: Serialize + Payload + Send {}

/// Decode a request body as `B`.
pub fn decode_body<B: RequestBody>(bytes: &[u8]) -> Result<Body, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(Body::new(B::default()));
    }
    serde_json::from_slice::<B>(bytes).map(Body::new)
}

/// An async function usable as a request handler.
///
/// Implemented for `Fn(Context, B, String, ...) -> impl Future<Output =
/// Result<R, E>>` with up to four trailing `String` parameters, which bind
/// to the route's path placeholders left to right.
pub trait Handler<Args>: Send + Sync + Sized + 'static {
    fn signature() -> Signature;

    /// Erase the handler into a callable the dispatcher can invoke.
    fn prepare(self, name: String) -> Prepared;
}

macro_rules! string_type {
    ($param:ident) => {
        String
    };
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_handler {
    ($($param:ident),*) => {
        impl<F, Fut, B, R, E> Handler<(B, $(string_type!($param),)*)> for F
        where
            F: Fn(Context, B $(, string_type!($param))*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Result<R, E>> + Send + 'static,
            B: RequestBody,
            R: Reply,
            E: Failure,
        {
            fn signature() -> Signature {
                Signature::handler::<B, R>(count!($($param)*))
            }

            fn prepare(self, name: String) -> Prepared {
                let handler = Arc::new(self);
                let call: HandlerFn = Arc::new(move |context: Context, body: Body, params: Vec<String>| -> HandlerFuture {
                    let handler = Arc::clone(&handler);
                    Box::pin(async move {
                        let expected = count!($($param)*);
                        let [$($param),*]: [String; count!($($param)*)] = params
                            .try_into()
                            .map_err(|params: Vec<String>| InvocationError::Arity {
                                expected,
                                found: params.len(),
                            })?;

                        let found = body.type_name();
                        let body = body.downcast::<B>().map_err(|_| InvocationError::BodyType {
                            expected: type_name::<B>(),
                            found,
                        })?;

                        let outcome = match (*handler)(context, body $(, $param)*).await {
                            Ok(reply) => match serde_json::to_vec(&reply) {
                                Ok(bytes) => Outcome::Success(bytes),
                                Err(error) => Outcome::Unencodable(error),
                            },
                            Err(error) => Outcome::Failed(Box::new(error)),
                        };
                        Ok(outcome)
                    })
                });

                Prepared {
                    name,
                    signature: Self::signature(),
                    decode: decode_body::<B>,
                    call,
                }
            }
        }
    };
}

impl_handler!();
impl_handler!(p1);
impl_handler!(p1, p2);
impl_handler!(p1, p2, p3);
impl_handler!(p1, p2, p3, p4);

/// A zero-argument factory returning a handler together with its options.
///
/// The options may be returned as `HandlerOptions` or
/// `Option<HandlerOptions>`; `None` means "infer everything".
pub trait Instantiator<Args>: Send + 'static {
    fn signature() -> Signature;

    /// Run the factory and prepare the handler it returned.
    fn instantiate(self, name: String) -> (HandlerOptions, Prepared);
}

impl<F, O, H, Args> Instantiator<Args> for F
where
    F: FnOnce() -> (O, H) + Send + 'static,
    O: Payload + Into<Option<HandlerOptions>>,
    H: Handler<Args>,
{
    fn signature() -> Signature {
        Signature::new(
            Vec::new(),
            vec![O::shape(), TypeShape::Callable(Box::new(H::signature()))],
        )
    }

    fn instantiate(self, name: String) -> (HandlerOptions, Prepared) {
        let (options, handler) = self();
        (options.into().unwrap_or_default(), handler.prepare(name))
    }
}

/// A handler erased and ready to bind.
pub struct Prepared {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) decode: DecodeFn,
    pub(crate) call: HandlerFn,
}

impl Prepared {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prepared")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// A handler bound to a route key.
pub struct Route {
    name: String,
    template: String,
    method: Method,
    signature: Signature,
    decode: DecodeFn,
    call: HandlerFn,
}

impl Route {
    pub(crate) fn bind(prepared: Prepared, template: String, method: Method) -> Self {
        Self {
            name: prepared.name,
            template,
            method,
            signature: prepared.signature,
            decode: prepared.decode,
            call: prepared.call,
        }
    }

    /// Identifier the handler was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Number of path parameters the handler declares.
    pub fn path_params(&self) -> usize {
        self.signature.path_params()
    }

    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<Body, serde_json::Error> {
        (self.decode)(bytes)
    }

    pub(crate) fn call(&self, context: Context, body: Body, params: Vec<String>) -> HandlerFuture {
        (self.call)(context, body, params)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("method", &self.method)
            .field("signature", &self.signature)
            .finish()
    }
}
