//! How session records get built.
//!
//! A store never knows how to construct its record type. It asks a
//! [`SessionFactory`]. Two ready-made ones cover most cases:
//!
//! - [`FnFactory`]: any closure, for records that need the identity or
//!   external state to build.
//! - [`ConstructorFactory`]: a registered zero-argument constructor,
//!   usually `S::default`.

use crate::{Identity, SessionError};

/// Builds a new record for an identity seen for the first time.
///
/// An `Err` is not fatal: the store logs it and treats the identity as
/// having no session for that access.
pub trait SessionFactory<S>: Send + Sync + 'static {
    fn create(&self, identity: &Identity) -> Result<S, SessionError>;
}

/// A factory backed by a closure.
///
/// ```rust
/// use tether_session::{FnFactory, Identity, SessionError, SessionFactory};
///
/// let factory = FnFactory::new(|id: &Identity| Ok::<_, SessionError>(id.to_string()));
/// let built = factory.create(&Identity::Named("console".into())).unwrap();
/// assert_eq!(built, "@console");
/// ```
pub struct FnFactory<F> {
    build: F,
}

impl<F> FnFactory<F> {
    pub fn new(build: F) -> Self {
        Self { build }
    }
}

impl<S, F> SessionFactory<S> for FnFactory<F>
where
    F: Fn(&Identity) -> Result<S, SessionError> + Send + Sync + 'static,
{
    fn create(&self, identity: &Identity) -> Result<S, SessionError> {
        (self.build)(identity)
    }
}

enum Constructor<S> {
    Infallible(fn() -> S),
    Fallible(fn() -> Result<S, String>),
}

/// A factory backed by a registered zero-argument constructor.
pub struct ConstructorFactory<S> {
    ctor: Constructor<S>,
}

impl<S> ConstructorFactory<S> {
    pub fn new(ctor: fn() -> S) -> Self {
        Self {
            ctor: Constructor::Infallible(ctor),
        }
    }

    /// A constructor that can fail. The error text ends up in the
    /// [`SessionError::Construction`] the store logs.
    pub fn fallible(ctor: fn() -> Result<S, String>) -> Self {
        Self {
            ctor: Constructor::Fallible(ctor),
        }
    }
}

impl<S: Default> ConstructorFactory<S> {
    /// Uses `S::default` as the constructor.
    pub fn of_default() -> Self {
        Self::new(S::default)
    }
}

impl<S: 'static> SessionFactory<S> for ConstructorFactory<S> {
    fn create(&self, _identity: &Identity) -> Result<S, SessionError> {
        match &self.ctor {
            Constructor::Infallible(ctor) => Ok(ctor()),
            Constructor::Fallible(ctor) => {
                ctor().map_err(|reason| SessionError::Construction {
                    kind: std::any::type_name::<S>(),
                    reason,
                })
            }
        }
    }
}
