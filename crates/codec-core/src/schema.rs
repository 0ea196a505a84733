//! Leaf vocabulary shared by the raw syntax tree and the resolved model.
//!
//! These are small value types that need no resolution: the parser produces
//! them directly and the resolver copies them into the resolved model.

use std::fmt;

/// Action taken on dependent rows when the referenced row is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OnDelete {
    #[default]
    None,
    Cascade,
    SetNull,
    Restrict,
}

impl OnDelete {
    /// Returns the keyword used for this action in schema source.
    pub fn keyword(&self) -> &'static str {
        match self {
            OnDelete::None => "none",
            OnDelete::Cascade => "cascade",
            OnDelete::SetNull => "set_null",
            OnDelete::Restrict => "restrict",
        }
    }
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How an abstract entity hierarchy maps to physical storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InheritanceKind {
    /// Every concrete subtype shares one table, told apart by a discriminator column.
    SingleTable,
    /// Each level of the hierarchy has its own table joined by primary key.
    #[default]
    JoinedTable,
}

impl fmt::Display for InheritanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InheritanceKind::SingleTable => f.write_str("single_table"),
            InheritanceKind::JoinedTable => f.write_str("joined_table"),
        }
    }
}

/// The storage strategy of an abstract entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InheritanceStrategy {
    kind: InheritanceKind,
    discriminator: Option<String>,
}

impl InheritanceStrategy {
    /// Creates a strategy of the given kind with an optional discriminator column.
    pub fn new(kind: InheritanceKind, discriminator: Option<String>) -> Self {
        Self {
            kind,
            discriminator,
        }
    }

    /// Creates a joined-table strategy.
    pub fn joined_table() -> Self {
        Self::new(InheritanceKind::JoinedTable, None)
    }

    /// Creates a single-table strategy using `discriminator` to tell subtypes apart.
    pub fn single_table(discriminator: impl Into<String>) -> Self {
        Self::new(InheritanceKind::SingleTable, Some(discriminator.into()))
    }

    pub fn kind(&self) -> InheritanceKind {
        self.kind
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }
}

/// The shape of a to-many relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Ordered, duplicates allowed (`many`).
    List,
    /// Unordered, no duplicates (`set`).
    Set,
}

/// Which side of a bidirectional relationship owns the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationSide {
    Owning,
    Inverse,
}

/// The kind of a table-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Index,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::PrimaryKey => f.write_str("primary_key"),
            ConstraintKind::Unique => f.write_str("unique"),
            ConstraintKind::Index => f.write_str("index"),
        }
    }
}

/// Comparison operator used in a view's `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    LessEq,
    GreaterEq,
    Less,
    Greater,
}

impl CompareOp {
    /// Operators ordered so that no symbol is tried before a longer one it prefixes.
    pub const BY_LENGTH_DESC: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::NotEq,
        CompareOp::LessEq,
        CompareOp::GreaterEq,
        CompareOp::Less,
        CompareOp::Greater,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::LessEq => "<=",
            CompareOp::GreaterEq => ">=",
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A literal operand in a view's `where` clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String(String),
    Integer(i64),
    Bool(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => write!(f, "{value:?}"),
            Literal::Integer(value) => write!(f, "{value}"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inheritance_strategy_defaults_to_joined_table() {
        let strategy = InheritanceStrategy::default();
        assert_eq!(strategy.kind(), InheritanceKind::JoinedTable);
        assert_eq!(strategy.discriminator(), None);
    }

    #[test]
    fn test_single_table_strategy() {
        let strategy = InheritanceStrategy::single_table("kind");
        assert_eq!(strategy.kind(), InheritanceKind::SingleTable);
        assert_eq!(strategy.discriminator(), Some("kind"));
    }

    #[test]
    fn test_compare_op_order_has_no_shadowed_prefix() {
        let ops = CompareOp::BY_LENGTH_DESC;
        for (i, earlier) in ops.iter().enumerate() {
            for later in &ops[i + 1..] {
                assert!(
                    !later.symbol().starts_with(earlier.symbol()),
                    "`{earlier}` shadows `{later}`"
                );
            }
        }
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::String("a\"b".to_string()).to_string(), "\"a\\\"b\"");
        assert_eq!(Literal::Integer(-4).to_string(), "-4");
        assert_eq!(Literal::Bool(true).to_string(), "true");
        assert_eq!(Literal::Null.to_string(), "null");
    }

    #[test]
    fn test_on_delete_keyword() {
        assert_eq!(OnDelete::default(), OnDelete::None);
        assert_eq!(OnDelete::SetNull.to_string(), "set_null");
    }
}
