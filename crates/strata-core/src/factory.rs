//! Per-stage entity construction strategies.

use crate::entity::{Entity, FieldMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builds the entity instance for one row.
///
/// The materializer always copies every declared field onto the returned
/// instance afterwards, so a factory only needs to set up what the row's
/// fields don't carry. A value the factory stores under a declared field
/// name is overwritten.
pub trait EntityFactory: Send + Sync {
    fn create(&self, fields: &FieldMap) -> Entity;
}

/// Factory backed by a closure.
pub struct FnFactory<F>(pub F);

impl<F> EntityFactory for FnFactory<F>
where
    F: Fn(&FieldMap) -> Entity + Send + Sync,
{
    fn create(&self, fields: &FieldMap) -> Entity {
        (self.0)(fields)
    }
}

/// A named entity class.
///
/// Implementors tag their instances with [`EntityClass::CLASS`] and may
/// pre-populate derived values in [`EntityClass::initialize`].
pub trait EntityClass: 'static {
    const CLASS: &'static str;

    fn initialize(_entity: &mut Entity, _fields: &FieldMap) {}
}

/// Factory that instantiates an [`EntityClass`].
pub struct ClassFactory<T>(PhantomData<fn() -> T>);

impl<T> Default for ClassFactory<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: EntityClass> EntityFactory for ClassFactory<T> {
    fn create(&self, fields: &FieldMap) -> Entity {
        let mut entity = Entity::new().with_class(T::CLASS);
        T::initialize(&mut entity, fields);
        entity
    }
}

/// How a stage's rows become entities.
#[derive(Clone, Default)]
pub enum Materialization {
    /// Plain [`Entity`] built straight from the row
    #[default]
    Default,
    /// Caller-supplied factory
    Custom(Arc<dyn EntityFactory>),
}

impl Materialization {
    pub fn custom(factory: impl EntityFactory + 'static) -> Self {
        Self::Custom(Arc::new(factory))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&FieldMap) -> Entity + Send + Sync + 'static,
    {
        Self::custom(FnFactory(f))
    }

    pub fn class<T: EntityClass>() -> Self {
        Self::custom(ClassFactory::<T>::default())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Debug for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
