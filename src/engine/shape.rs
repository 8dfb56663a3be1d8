//! Structural descriptors for handlers and their payload types.
//!
//! Rust erases most of what a registration needs to know about a callable
//! by the time it reaches the engine, so every registrable callable carries a
//! [`Signature`] assembled from its parameter and result types at
//! registration time. [`classify`] inspects that descriptor and nothing else.

use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Declaring namespace and bare name of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    /// Module path the type is declared in, `::`-separated. May be empty.
    pub namespace: String,
    /// The bare type identifier, without generic arguments.
    pub name: String,
}

impl TypeName {
    /// Derive the name of `T` from [`std::any::type_name`].
    pub fn of<T: ?Sized>() -> Self {
        Self::parse(type_name::<T>())
    }

    /// Split a path such as `my_app::types::Foo<u8>` into namespace and name.
    pub fn parse(path: &str) -> Self {
        let base = path.split('<').next().unwrap_or(path);
        match base.rsplit_once("::") {
            Some((namespace, name)) => Self {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            None => Self {
                namespace: String::new(),
                name: base.to_string(),
            },
        }
    }

    /// Lower-cased, namespace-qualified name.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_lowercase()
        } else {
            format!("{}::{}", self.namespace, self.name).to_lowercase()
        }
    }

    /// Lower-cased bare name.
    pub fn short_name(&self) -> String {
        self.name.to_lowercase()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.namespace, self.name)
        }
    }
}

/// What a parameter or result slot holds, as far as routing is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// The request context capability.
    Context,
    /// The failure indicator capability.
    Failure,
    /// A string; the only type path parameters bind to.
    Text,
    /// The empty value `()`.
    Unit,
    /// An open, untyped value. No schema can be derived from it.
    Any,
    /// A scalar such as `u32` or `bool`.
    Primitive(&'static str),
    /// A named structural record.
    Record(TypeName),
    /// An ordered collection of elements.
    Sequence(Box<TypeShape>),
    /// A pointer or optional value.
    Indirect(Box<TypeShape>),
    /// A keyed collection; the shape is the value type.
    Mapping(Box<TypeShape>),
    /// The handler options descriptor.
    Options,
    /// Something callable.
    Callable(Box<Signature>),
}

impl TypeShape {
    /// The record shape of `T`.
    pub fn record<T: ?Sized>() -> Self {
        TypeShape::Record(TypeName::of::<T>())
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, TypeShape::Callable(_))
    }

    /// Strip sequences, indirections and mappings down to the element shape.
    pub fn element(&self) -> &TypeShape {
        match self {
            TypeShape::Sequence(inner) | TypeShape::Indirect(inner) | TypeShape::Mapping(inner) => inner.element(),
            other => other,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Context => f.write_str("Context"),
            TypeShape::Failure => f.write_str("Failure"),
            TypeShape::Text => f.write_str("String"),
            TypeShape::Unit => f.write_str("()"),
            TypeShape::Any => f.write_str("Any"),
            TypeShape::Primitive(name) => f.write_str(name),
            TypeShape::Record(name) => write!(f, "{name}"),
            TypeShape::Sequence(inner) => write!(f, "[{inner}]"),
            TypeShape::Indirect(inner) => write!(f, "*{inner}"),
            TypeShape::Mapping(inner) => write!(f, "map[{inner}]"),
            TypeShape::Options => f.write_str("HandlerOptions"),
            TypeShape::Callable(signature) => write!(f, "{signature}"),
        }
    }
}

/// Parameter and result shapes of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<TypeShape>,
    pub returns: Vec<TypeShape>,
}

impl Signature {
    pub fn new(params: Vec<TypeShape>, returns: Vec<TypeShape>) -> Self {
        Self { params, returns }
    }

    /// The signature of `fn(Context, B, String × path_params) -> Result<R, E>`.
    pub fn handler<B: Payload, R: Payload>(path_params: usize) -> Self {
        let mut params = vec![TypeShape::Context, B::shape()];
        params.extend(std::iter::repeat(TypeShape::Text).take(path_params));
        Self::new(params, vec![R::shape(), TypeShape::Failure])
    }

    /// The body slot, if the signature has one.
    pub fn body(&self) -> Option<&TypeShape> {
        self.params.get(1)
    }

    /// The result slot, if the signature has one.
    pub fn reply(&self) -> Option<&TypeShape> {
        self.returns.first()
    }

    /// Number of parameters past the body slot.
    pub fn path_params(&self) -> usize {
        self.params.len().saturating_sub(2)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |shapes: &[TypeShape]| {
            shapes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "fn({}) -> ({})", join(&self.params), join(&self.returns))
    }
}

/// How a callable may be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Handler,
    HandlerInstantiator,
    Invalid,
}

/// Classify a callable by its signature.
///
/// A handler takes `(Context, body, String...)` and returns
/// `(result, Failure)`, where neither the body nor the result is callable and
/// the result is not an indirection to an indirection or to a callable. A
/// handler instantiator takes nothing and returns `(HandlerOptions, handler)`.
pub fn classify(signature: &Signature) -> Kind {
    if is_handler(signature) {
        Kind::Handler
    } else if is_instantiator(signature) {
        Kind::HandlerInstantiator
    } else {
        Kind::Invalid
    }
}

fn is_handler(signature: &Signature) -> bool {
    let [context, body, path_params @ ..] = signature.params.as_slice() else {
        return false;
    };
    let [reply, failure] = signature.returns.as_slice() else {
        return false;
    };

    *context == TypeShape::Context
        && !body.is_callable()
        && path_params.iter().all(|param| *param == TypeShape::Text)
        && is_encodable(reply)
        && *failure == TypeShape::Failure
}

fn is_encodable(reply: &TypeShape) -> bool {
    match reply {
        TypeShape::Callable(_) => false,
        TypeShape::Indirect(inner) => !matches!(**inner, TypeShape::Indirect(_) | TypeShape::Callable(_)),
        _ => true,
    }
}

fn is_instantiator(signature: &Signature) -> bool {
    if !signature.params.is_empty() {
        return false;
    }
    let [options, handler] = signature.returns.as_slice() else {
        return false;
    };

    let options_ok = match options {
        TypeShape::Options => true,
        TypeShape::Indirect(inner) => **inner == TypeShape::Options,
        _ => false,
    };
    options_ok && matches!(handler, TypeShape::Callable(inner) if is_handler(inner))
}

/// A type that can travel as a request body or a handler result.
///
/// The default shape is a [`TypeShape::Record`] named after the type, which
/// is right for plain structs and enums:
///
/// ```
/// use autoroute::engine::{Payload, TypeShape};
///
/// struct Foo;
/// impl Payload for Foo {}
///
/// assert!(matches!(Foo::shape(), TypeShape::Record(name) if name.name == "Foo"));
/// ```
pub trait Payload: 'static {
    fn shape() -> TypeShape {
        TypeShape::record::<Self>()
    }
}

macro_rules! primitive_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Payload for $ty {
                fn shape() -> TypeShape {
                    TypeShape::Primitive(stringify!($ty))
                }
            }
        )*
    };
}

primitive_payload!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl Payload for String {
    fn shape() -> TypeShape {
        TypeShape::Text
    }
}

impl Payload for () {
    fn shape() -> TypeShape {
        TypeShape::Unit
    }
}

impl Payload for serde_json::Value {
    fn shape() -> TypeShape {
        TypeShape::Any
    }
}

impl Payload for serde_json::Map<String, serde_json::Value> {
    fn shape() -> TypeShape {
        TypeShape::Mapping(Box::new(TypeShape::Any))
    }
}

macro_rules! wrapper_payload {
    ($variant:ident => $($wrapper:ident),*) => {
        $(
            impl<T: Payload> Payload for $wrapper<T> {
                fn shape() -> TypeShape {
                    TypeShape::$variant(Box::new(T::shape()))
                }
            }
        )*
    };
}

wrapper_payload!(Sequence => Vec, VecDeque, BTreeSet, HashSet);
wrapper_payload!(Indirect => Option, Box, Arc);

impl<K: 'static, V: Payload, S: 'static> Payload for HashMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::Mapping(Box::new(V::shape()))
    }
}

impl<K: 'static, V: Payload> Payload for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::Mapping(Box::new(V::shape()))
    }
}
