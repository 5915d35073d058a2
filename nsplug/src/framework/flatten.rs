//! Boundary flattening: reduces a resolved [`Object`] to a plain [`Value`].

use super::namespace::Object;
use crate::error::FlattenError;
use crate::value::{MapKey, Value};

/// Flattens a resolved object for return to the host.
///
/// Absence at the top level is `Undefined`. Inside lists and maps it is
/// `Null`. Mappable namespaces are replaced by their full mapping, which is
/// flattened recursively; any other namespace cannot cross the boundary.
pub fn flatten(object: &Object) -> Result<Value, FlattenError> {
    flatten_at(object, false)
}

fn flatten_at(object: &Object, nested: bool) -> Result<Value, FlattenError> {
    let absent = || if nested { Value::Null } else { Value::Undefined };

    match object {
        Object::Nil => Ok(absent()),
        Object::Value(value) => Ok(value.clone()),
        Object::List(items) => items
            .iter()
            .map(|item| flatten_at(item, true))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Object::Map(entries) => entries
            .iter()
            .map(|(k, v)| -> Result<(MapKey, Value), FlattenError> {
                Ok((k.clone(), flatten_at(v, true)?))
            })
            .collect::<Result<_, _>>()
            .map(Value::Map),
        Object::Namespace(namespace) => {
            let mappable = namespace
                .as_mappable()
                .ok_or(FlattenError::NotMappable)?;
            match mappable.map().map_err(FlattenError::Map)? {
                None => Ok(absent()),
                Some(fields) => fields
                    .iter()
                    .map(|(k, v)| -> Result<(MapKey, Value), FlattenError> {
                        Ok((MapKey::String(k.clone()), flatten_at(v, true)?))
                    })
                    .collect::<Result<_, _>>()
                    .map(Value::Map),
            }
        }
    }
}
