//! SQL function calls and arithmetic

use smallvec::SmallVec;
use std::fmt;

use crate::compilable::impl_display_as_raw_sql;
use crate::{Compilable, CompileResult, Operand, SqlBuilder};

/// Arithmetic and concatenation operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
}

impl ArithmeticOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Concat => "||",
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A computed expression
#[derive(Debug, Clone)]
pub enum Function {
    /// `name(arg, ...)`, optionally `name(DISTINCT arg, ...)`
    Call {
        name: String,
        args: SmallVec<[Operand; 2]>,
        distinct: bool,
    },
    /// `COUNT(*)`
    CountAll,
    /// `(left op right)`
    Arithmetic {
        op: ArithmeticOp,
        left: Operand,
        right: Operand,
    },
    /// A hand-written expression, checked under validation
    Raw(String),
}

impl Function {
    pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Operand>) -> Self {
        Self::Call {
            name: name.into(),
            args: args.into_iter().collect(),
            distinct: false,
        }
    }

    fn unary(name: &str, arg: impl Into<Operand>) -> Self {
        Self::call(name, [arg.into()])
    }

    pub fn count(arg: impl Into<Operand>) -> Self {
        Self::unary("COUNT", arg)
    }

    pub fn count_all() -> Self {
        Self::CountAll
    }

    pub fn count_distinct(arg: impl Into<Operand>) -> Self {
        Self::unary("COUNT", arg).distinct()
    }

    pub fn max(arg: impl Into<Operand>) -> Self {
        Self::unary("MAX", arg)
    }

    pub fn min(arg: impl Into<Operand>) -> Self {
        Self::unary("MIN", arg)
    }

    pub fn sum(arg: impl Into<Operand>) -> Self {
        Self::unary("SUM", arg)
    }

    pub fn avg(arg: impl Into<Operand>) -> Self {
        Self::unary("AVG", arg)
    }

    pub fn upper(arg: impl Into<Operand>) -> Self {
        Self::unary("UPPER", arg)
    }

    pub fn lower(arg: impl Into<Operand>) -> Self {
        Self::unary("LOWER", arg)
    }

    pub fn length(arg: impl Into<Operand>) -> Self {
        Self::unary("LENGTH", arg)
    }

    pub fn abs(arg: impl Into<Operand>) -> Self {
        Self::unary("ABS", arg)
    }

    pub fn coalesce(args: impl IntoIterator<Item = Operand>) -> Self {
        Self::call("COALESCE", args)
    }

    pub fn ifnull(arg: impl Into<Operand>, fallback: impl Into<Operand>) -> Self {
        Self::call("IFNULL", [arg.into(), fallback.into()])
    }

    pub fn arithmetic(left: impl Into<Operand>, op: ArithmeticOp, right: impl Into<Operand>) -> Self {
        Self::Arithmetic {
            op,
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn add(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::arithmetic(left, ArithmeticOp::Add, right)
    }

    pub fn subtract(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::arithmetic(left, ArithmeticOp::Subtract, right)
    }

    pub fn concat(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::arithmetic(left, ArithmeticOp::Concat, right)
    }

    pub fn raw(expression: impl Into<String>) -> Self {
        Self::Raw(expression.into())
    }

    /// Apply the call to distinct argument values only
    pub fn distinct(self) -> Self {
        match self {
            Self::Call { name, args, .. } => Self::Call {
                name,
                args,
                distinct: true,
            },
            other => other,
        }
    }
}

impl Compilable for Function {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        match self {
            Self::Call {
                name,
                args,
                distinct,
            } => {
                builder.append_identifier(name)?;
                builder.append(if *distinct { "(DISTINCT " } else { "(" });
                builder.append_values(args, ", ", for_validation)?;
                builder.append(")");
                Ok(())
            }
            Self::CountAll => {
                builder.append("COUNT(*)");
                Ok(())
            }
            Self::Arithmetic { op, left, right } => {
                builder.append("(");
                builder.append_value(left, for_validation)?;
                builder.append(" ").append(op.symbol()).append(" ");
                builder.append_value(right, for_validation)?;
                builder.append(")");
                Ok(())
            }
            Self::Raw(expression) => builder.append_fragment(expression),
        }
    }
}

impl_display_as_raw_sql!(Function);
