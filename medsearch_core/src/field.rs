use std::fmt;
use std::sync::Arc;

use crate::value::FieldValue;

/// Typed accessor from an entity to one of its fields.
pub type Accessor<T> = fn(&T) -> FieldValue<'_>;

/// Symbolic reference to a field of `T`.
///
/// The name is what rendered predicates refer to; the accessor is what
/// in-memory evaluation calls. Both are fixed at construction.
pub struct Field<T> {
    name: Arc<str>,
    read: Accessor<T>,
}

impl<T> Field<T> {
    pub fn new<N>(name: N, read: Accessor<T>) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self {
            name: name.into(),
            read,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the field from an entity.
    pub fn read<'a>(&self, entity: &'a T) -> FieldValue<'a> {
        (self.read)(entity)
    }
}

// Manual impls: `T` itself need not be Clone or Debug.
impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            read: self.read,
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

impl<T> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Device {
        label: Option<String>,
        online: bool,
    }

    #[test]
    fn test_field_reads_entity() {
        let label = Field::new("label", |d: &Device| d.label.as_ref().into());
        let online = Field::<Device>::new("online", |d| d.online.into());
        let device = Device {
            label: Some("Cabinet 4".to_string()),
            online: true,
        };
        assert_eq!(label.read(&device), FieldValue::Text("Cabinet 4"));
        assert_eq!(online.read(&device), FieldValue::Boolean(true));
        assert_eq!(label.name(), "label");
        assert_eq!(format!("{:?}", label.clone()), "Field(\"label\")");
    }
}
