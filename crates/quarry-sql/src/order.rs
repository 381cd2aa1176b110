//! ORDER BY terms

use crate::{CompileResult, Operand, SqlBuilder, VersionCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Placement of nulls relative to other values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

/// One term of an ORDER BY clause.
///
/// An explicit null placement renders as `NULLS FIRST` / `NULLS LAST` on
/// engines that support it and as a leading `(expr IS NULL)` sort key on
/// older ones.
#[derive(Debug, Clone)]
pub struct Order {
    expression: Operand,
    direction: Direction,
    nulls: Option<NullsOrder>,
}

impl Order {
    pub fn asc(expression: impl Into<Operand>) -> Self {
        Self {
            expression: expression.into(),
            direction: Direction::Asc,
            nulls: None,
        }
    }

    pub fn desc(expression: impl Into<Operand>) -> Self {
        Self {
            expression: expression.into(),
            direction: Direction::Desc,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        let native_nulls = builder.version().is_at_least(VersionCode::V3_30_0);
        if let Some(nulls) = self.nulls.filter(|_| !native_nulls) {
            builder.append("(");
            builder.append_value(&self.expression, for_validation)?;
            builder.append(match nulls {
                NullsOrder::First => " IS NULL) DESC, ",
                NullsOrder::Last => " IS NULL) ASC, ",
            });
        }

        builder.append_value(&self.expression, for_validation)?;
        builder.append(" ").append(self.direction.keyword());

        if native_nulls {
            match self.nulls {
                Some(NullsOrder::First) => {
                    builder.append(" NULLS FIRST");
                }
                Some(NullsOrder::Last) => {
                    builder.append(" NULLS LAST");
                }
                None => {}
            }
        }
        Ok(())
    }
}
