//! Boolean conditions for WHERE, HAVING and JOIN clauses

use quarry_types::SqlValue;
use std::fmt;

use crate::compilable::impl_display_as_raw_sql;
use crate::{Compilable, CompileResult, Operand, Query, SqlBuilder};

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Is,
    IsNot,
    Glob,
}

impl ComparisonOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::Glob => "GLOB",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Rendering of the connective applied to no operands
    const fn identity(&self) -> &'static str {
        match self {
            Self::And => "1",
            Self::Or => "0",
        }
    }
}

/// A boolean condition.
///
/// Composite criteria render inside their own parentheses, so a criterion
/// can be embedded anywhere without regard to operator precedence.
#[derive(Debug, Clone)]
pub enum Criterion {
    Binary {
        left: Operand,
        op: ComparisonOp,
        right: Operand,
    },
    NullCheck {
        operand: Operand,
        negated: bool,
    },
    In {
        operand: Operand,
        values: Operand,
        negated: bool,
    },
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
        negated: bool,
    },
    Like {
        operand: Operand,
        pattern: Operand,
        escape: Option<char>,
        negated: bool,
    },
    Exists {
        query: Box<Query>,
        negated: bool,
    },
    Conjunction {
        op: LogicalOp,
        criteria: Vec<Criterion>,
    },
    Not(Box<Criterion>),
    /// A hand-written condition with `?` placeholders for `args`
    Raw {
        selection: String,
        args: Vec<SqlValue>,
    },
}

impl Criterion {
    pub fn binary(left: impl Into<Operand>, op: ComparisonOp, right: impl Into<Operand>) -> Self {
        Self::Binary {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    pub fn null_check(operand: impl Into<Operand>, negated: bool) -> Self {
        Self::NullCheck {
            operand: operand.into(),
            negated,
        }
    }

    pub fn in_operand(
        operand: impl Into<Operand>,
        values: impl Into<Operand>,
        negated: bool,
    ) -> Self {
        Self::In {
            operand: operand.into(),
            values: values.into(),
            negated,
        }
    }

    pub fn between(
        operand: impl Into<Operand>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
        negated: bool,
    ) -> Self {
        Self::Between {
            operand: operand.into(),
            low: low.into(),
            high: high.into(),
            negated,
        }
    }

    pub fn like(
        operand: impl Into<Operand>,
        pattern: impl Into<Operand>,
        escape: Option<char>,
        negated: bool,
    ) -> Self {
        Self::Like {
            operand: operand.into(),
            pattern: pattern.into(),
            escape,
            negated,
        }
    }

    pub fn exists(query: Query) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: false,
        }
    }

    pub fn not_exists(query: Query) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: true,
        }
    }

    /// Raw condition; each `?` in `selection` binds the next value of `args`
    pub fn raw(selection: impl Into<String>, args: impl IntoIterator<Item = SqlValue>) -> Self {
        Self::Raw {
            selection: selection.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Conjunction of all `criteria`; true when empty
    pub fn all(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Self::Conjunction {
            op: LogicalOp::And,
            criteria: criteria.into_iter().collect(),
        }
    }

    /// Disjunction of all `criteria`; false when empty
    pub fn any(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Self::Conjunction {
            op: LogicalOp::Or,
            criteria: criteria.into_iter().collect(),
        }
    }

    pub fn and(self, other: Criterion) -> Self {
        self.join(LogicalOp::And, other)
    }

    pub fn or(self, other: Criterion) -> Self {
        self.join(LogicalOp::Or, other)
    }

    fn join(self, op: LogicalOp, other: Criterion) -> Self {
        match self {
            Self::Conjunction {
                op: existing,
                mut criteria,
            } if existing == op => {
                criteria.push(other);
                Self::Conjunction { op, criteria }
            }
            lhs => Self::Conjunction {
                op,
                criteria: vec![lhs, other],
            },
        }
    }

    /// Logical negation, folded into the operator where SQL has one
    pub fn negate(self) -> Self {
        match self {
            Self::NullCheck { operand, negated } => Self::NullCheck {
                operand,
                negated: !negated,
            },
            Self::In {
                operand,
                values,
                negated,
            } => Self::In {
                operand,
                values,
                negated: !negated,
            },
            Self::Between {
                operand,
                low,
                high,
                negated,
            } => Self::Between {
                operand,
                low,
                high,
                negated: !negated,
            },
            Self::Like {
                operand,
                pattern,
                escape,
                negated,
            } => Self::Like {
                operand,
                pattern,
                escape,
                negated: !negated,
            },
            Self::Exists { query, negated } => Self::Exists {
                query,
                negated: !negated,
            },
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

fn not_keyword(negated: bool) -> &'static str {
    if negated { " NOT" } else { "" }
}

impl Compilable for Criterion {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        match self {
            Self::Binary { left, op, right } => {
                builder.append_value(left, for_validation)?;
                builder.append(" ").append(op.symbol()).append(" ");
                builder.append_value(right, for_validation)
            }
            Self::NullCheck { operand, negated } => {
                builder.append_value(operand, for_validation)?;
                builder.append(if *negated { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }
            Self::In {
                operand,
                values,
                negated,
            } => {
                builder.append_value(operand, for_validation)?;
                builder.append(not_keyword(*negated)).append(" IN ");
                match values {
                    Operand::Node(node) if node.is_statement() => {
                        builder.append_value(values, for_validation)
                    }
                    _ => {
                        builder.append("(");
                        builder.append_value(values, for_validation)?;
                        builder.append(")");
                        Ok(())
                    }
                }
            }
            Self::Between {
                operand,
                low,
                high,
                negated,
            } => {
                builder.append_value(operand, for_validation)?;
                builder.append(not_keyword(*negated)).append(" BETWEEN ");
                builder.append_value(low, for_validation)?;
                builder.append(" AND ");
                builder.append_value(high, for_validation)
            }
            Self::Like {
                operand,
                pattern,
                escape,
                negated,
            } => {
                builder.append_value(operand, for_validation)?;
                builder.append(not_keyword(*negated)).append(" LIKE ");
                builder.append_value(pattern, for_validation)?;
                if let Some(escape) = escape {
                    builder.append(" ESCAPE ");
                    builder.append_scalar(&SqlValue::Text(escape.to_string()))?;
                }
                Ok(())
            }
            Self::Exists { query, negated } => {
                builder.append(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                query.append_to_sql_builder(builder, for_validation)?;
                builder.append(")");
                Ok(())
            }
            Self::Conjunction { op, criteria } => {
                if criteria.is_empty() {
                    builder.append(op.identity());
                    return Ok(());
                }
                if for_validation {
                    builder.append("(");
                }
                builder.append("(");
                let separator = format!(" {} ", op.symbol());
                builder.append_concatenated(criteria, &separator, for_validation)?;
                builder.append(")");
                if for_validation {
                    builder.append(")");
                }
                Ok(())
            }
            Self::Not(inner) => {
                builder.append("NOT (");
                inner.append_to_sql_builder(builder, for_validation)?;
                builder.append(")");
                Ok(())
            }
            Self::Raw { selection, args } => {
                builder.append("(");
                builder.append_fragment_with_args(selection, args)?;
                builder.append(")");
                Ok(())
            }
        }
    }
}

impl_display_as_raw_sql!(Criterion);
