//! Values appearing in expression positions

use quarry_types::SqlValue;
use std::sync::Arc;

use crate::{Compilable, Criterion, Function, Property, Query};

/// Anything that can stand where an SQL expression is expected.
///
/// Nodes are shared, so an operand can be reused across statements without
/// copying its subtree.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A compilable node; nested statements are parenthesized
    Node(Arc<dyn Compilable>),
    /// A collection, rendered inline or bound as one `?[]` argument
    List(Vec<SqlValue>),
    /// A scalar, rendered inline or bound as `?`
    Value(SqlValue),
}

impl Operand {
    pub fn node(node: impl Compilable + 'static) -> Self {
        Self::Node(Arc::new(node))
    }

    pub fn list<T: Into<SqlValue>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn null() -> Self {
        Self::Value(SqlValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(SqlValue::Null))
    }
}

macro_rules! impl_operand_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

impl_operand_from_value!(SqlValue, i32, i64, f64, bool, String, &str, Vec<u8>);

impl<T: Into<SqlValue>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Self::Value(value.map_or(SqlValue::Null, Into::into))
    }
}

macro_rules! impl_operand_from_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(node: $ty) -> Self {
                    Self::node(node)
                }
            }

            impl From<&$ty> for Operand {
                fn from(node: &$ty) -> Self {
                    Self::node(node.clone())
                }
            }
        )*
    };
}

impl_operand_from_node!(Property, Criterion, Function, Query);
