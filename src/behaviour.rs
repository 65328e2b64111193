//! Behaviour slots: at most one Movement, Slidable and Damagable per entity.
//!
//! Behaviours are stored as ECS components, so the world already holds at
//! most one of each per entity. Attaching goes through [`add_behaviour`],
//! which turns a second attachment of the same kind into a configuration
//! error instead of silently replacing the first.

use crate::components::{Damagable, EntityKind, Movement, Slidable};
use crate::error::SimError;
use bevy_ecs::prelude::*;

/// Tag for each behaviour type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourKind {
    Movement,
    Slidable,
    Damagable,
}

/// A behaviour instance ready to be attached.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Movement(Movement),
    Slidable(Slidable),
    Damagable(Damagable),
}

impl Behaviour {
    pub fn kind(&self) -> BehaviourKind {
        match self {
            Behaviour::Movement(_) => BehaviourKind::Movement,
            Behaviour::Slidable(_) => BehaviourKind::Slidable,
            Behaviour::Damagable(_) => BehaviourKind::Damagable,
        }
    }
}

/// Components that act as behaviours.
pub trait BehaviourComponent: Component {
    const KIND: BehaviourKind;
}

impl BehaviourComponent for Movement {
    const KIND: BehaviourKind = BehaviourKind::Movement;
}

impl BehaviourComponent for Slidable {
    const KIND: BehaviourKind = BehaviourKind::Slidable;
}

impl BehaviourComponent for Damagable {
    const KIND: BehaviourKind = BehaviourKind::Damagable;
}

/// Whether `entity` has a behaviour of `kind`. False for unknown entities.
pub fn has_behaviour(world: &World, entity: Entity, kind: BehaviourKind) -> bool {
    match kind {
        BehaviourKind::Movement => world.get::<Movement>(entity).is_some(),
        BehaviourKind::Slidable => world.get::<Slidable>(entity).is_some(),
        BehaviourKind::Damagable => world.get::<Damagable>(entity).is_some(),
    }
}

/// The behaviour of type `T`, if attached.
pub fn get_behaviour<T: BehaviourComponent>(world: &World, entity: Entity) -> Option<&T> {
    world.get::<T>(entity)
}

/// Attach `behaviour` to `entity`.
///
/// Fails with [`SimError::DuplicateBehaviour`] if one of the same kind is
/// already attached, and [`SimError::UnknownEntity`] if the entity is gone.
pub fn add_behaviour(world: &mut World, entity: Entity, behaviour: Behaviour) -> Result<(), SimError> {
    if world.get::<EntityKind>(entity).is_none() {
        return Err(SimError::UnknownEntity(entity));
    }
    let kind = behaviour.kind();
    if has_behaviour(world, entity, kind) {
        return Err(SimError::DuplicateBehaviour(kind));
    }

    let mut entity_mut = world.entity_mut(entity);
    match behaviour {
        Behaviour::Movement(movement) => entity_mut.insert(movement),
        Behaviour::Slidable(slidable) => entity_mut.insert(slidable),
        Behaviour::Damagable(damagable) => entity_mut.insert(damagable),
    };
    Ok(())
}
