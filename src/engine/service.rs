//! Bulk registration of the operations of a server value.

use std::fmt;
use std::sync::Arc;

use crate::engine::handler::{Handler, Instantiator, Prepared};
use crate::engine::options::HandlerOptions;
use crate::engine::shape::{Signature, TypeShape};

/// A value whose methods are exposed as handlers.
///
/// `operations` lists the methods to consider. Each one is classified when
/// the server is registered: handlers bind through convention inference
/// under the server prefix, instantiators run once and bind with their own
/// options, and anything else is skipped.
///
/// ```
/// use std::sync::Arc;
/// use autoroute::engine::{Context, Engine, Operations, Server};
///
/// struct Greeter;
///
/// impl Greeter {
///     async fn get_hello(&self, _ctx: Context, _body: ()) -> Result<String, String> {
///         Ok("hello".to_string())
///     }
/// }
///
/// impl Server for Greeter {
///     fn operations(self: Arc<Self>, ops: &mut Operations) {
///         ops.handler("GetHello", move |ctx: Context, body: ()| {
///             let this = Arc::clone(&self);
///             async move { this.get_hello(ctx, body).await }
///         });
///     }
/// }
///
/// let mut engine = Engine::new();
/// engine.register_server(Greeter, None);
/// assert_eq!(engine.routes().count(), 1);
/// ```
pub trait Server: Send + Sync + 'static {
    /// Structural shape of the server value; a record unless overridden.
    fn shape() -> TypeShape
    where
        Self: Sized,
    {
        TypeShape::record::<Self>()
    }

    fn operations(self: Arc<Self>, ops: &mut Operations);
}

impl<S: Server> Server for Arc<S> {
    fn shape() -> TypeShape {
        TypeShape::Indirect(Box::new(S::shape()))
    }

    fn operations(self: Arc<Self>, ops: &mut Operations) {
        S::operations(Arc::clone(&*self), ops)
    }
}

pub(crate) type InstantiateFn = Box<dyn FnOnce(String) -> (HandlerOptions, Prepared) + Send>;

pub(crate) enum Operation {
    Handler(Prepared),
    Instantiator(InstantiateFn),
    Other,
}

/// One operation offered by a server.
pub struct Candidate {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) operation: Operation,
}

impl Candidate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// The operations a server offers, in declaration order.
#[derive(Debug, Default)]
pub struct Operations {
    candidates: Vec<Candidate>,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a handler method.
    pub fn handler<H, Args>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
    {
        self.candidates.push(Candidate {
            name: name.to_string(),
            signature: H::signature(),
            operation: Operation::Handler(handler.prepare(name.to_string())),
        });
        self
    }

    /// Offer a method that builds a handler and its options.
    pub fn instantiator<I, Args>(&mut self, name: &str, instantiator: I) -> &mut Self
    where
        I: Instantiator<Args>,
    {
        self.candidates.push(Candidate {
            name: name.to_string(),
            signature: I::signature(),
            operation: Operation::Instantiator(Box::new(move |name| instantiator.instantiate(name))),
        });
        self
    }

    /// Describe a method that is not routable. It is listed but never bound.
    pub fn other(&mut self, name: &str, signature: Signature) -> &mut Self {
        self.candidates.push(Candidate {
            name: name.to_string(),
            signature,
            operation: Operation::Other,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|candidate| candidate.name.as_str())
    }

    pub(crate) fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}
