//! Field and column descriptors.

/// Metadata about an entity field/column.
///
/// Instances are normally produced by `#[derive(Entity)]` and stored in a
/// `static` slice returned from [`crate::Entity::fields`].
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Rust field name.
    pub name: &'static str,
    /// Database column name (may differ from the field name).
    pub column_name: &'static str,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
    /// Whether this field is nullable (`Option<T>` in the struct).
    pub nullable: bool,
}

impl FieldInfo {
    /// Create a new field descriptor.
    ///
    /// The column name defaults to the field's own name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column_name: name,
            primary_key: false,
            nullable: false,
        }
    }

    /// Set the database column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column_name = name;
        self
    }

    /// Set the primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set the nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }
}
