use crate::{Clause, Param, Pattern, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    Add,
    Subtract,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEquals => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEquals => ">=",
            BinaryOperator::In => "IN",
            BinaryOperator::Contains => "CONTAINS",
            BinaryOperator::StartsWith => "STARTS WITH",
            BinaryOperator::EndsWith => "ENDS WITH",
            BinaryOperator::Matches => "=~",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
        }
    }
}

/// An entry of a map projection, `this { .title, actors: var2 }`.
#[derive(Debug, Clone, PartialEq)]
pub enum MapProjectionItem {
    /// `.name`, reads the property of the same name.
    Property(String),
    /// `key: expression`
    Entry(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(Variable),
    Param(Param),
    /// A parameter provided by the caller under a fixed name, such as `$jwt`.
    NamedParam(String),
    /// A binding introduced by a user-provided statement, the column of a `@cypher` field.
    Name(String),
    Null,
    Boolean(bool),
    Integer(i64),
    /// Internal string constants only (type names, fixed messages). Literals from an operation
    /// always go through [`Expr::Param`].
    String(String),
    Property(Box<Expr>, String),
    Function(String, Vec<Expr>),
    CountStar,
    Distinct(Box<Expr>),
    Binary(BinaryOperator, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    MapProjection(Variable, Vec<MapProjectionItem>),
    HasLabels(Variable, Vec<String>),
    Exists(Vec<Clause>),
    Count(Vec<Clause>),
    /// `[pattern WHERE predicate | projection]`
    PatternComprehension {
        pattern: Box<Pattern>,
        predicate: Option<Box<Expr>>,
        projection: Box<Expr>,
    },
    /// `[variable IN list WHERE predicate | projection]`
    ListComprehension {
        variable: Variable,
        list: Box<Expr>,
        predicate: Option<Box<Expr>>,
        projection: Option<Box<Expr>>,
    },
    /// `CASE WHEN condition THEN value ELSE fallback END`
    Case {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    pub fn property(self, name: impl Into<String>) -> Expr {
        Expr::Property(Box::new(self), name.into())
    }

    pub fn function(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Function(name.into(), args.into_iter().collect())
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::String(value.into())
    }

    pub fn named_param(name: impl Into<String>) -> Expr {
        Expr::NamedParam(name.into())
    }

    pub fn name(name: impl Into<String>) -> Expr {
        Expr::Name(name.into())
    }

    pub fn binary(self, operator: BinaryOperator, other: impl Into<Expr>) -> Expr {
        Expr::Binary(operator, Box::new(self), Box::new(other.into()))
    }

    pub fn equals(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Equals, other)
    }

    pub fn not_equals(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::NotEquals, other)
    }

    pub fn greater_than(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::GreaterThan, other)
    }

    pub fn in_list(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::In, other)
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNotNull(Box::new(self))
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    pub fn distinct(self) -> Expr {
        Expr::Distinct(Box::new(self))
    }

    /// Conjunction of the given predicates, flattening nested conjunctions and dropping the
    /// empty ones. Returns `None` if nothing is left.
    pub fn and(predicates: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        let mut flat = Vec::new();

        for predicate in predicates {
            match predicate {
                Expr::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Expr::And(flat)),
        }
    }

    pub fn or(predicates: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        let mut flat: Vec<Expr> = predicates.into_iter().collect();

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Expr::Or(flat)),
        }
    }

    pub fn count(self) -> Expr {
        Expr::function("count", [self])
    }

    pub fn collect(self) -> Expr {
        Expr::function("collect", [self])
    }

    pub fn head(self) -> Expr {
        Expr::function("head", [self])
    }

    pub fn size(self) -> Expr {
        Expr::function("size", [self])
    }

    pub fn last(self) -> Expr {
        Expr::function("last", [self])
    }
}

impl From<Variable> for Expr {
    fn from(variable: Variable) -> Self {
        Expr::Variable(variable)
    }
}

impl From<Param> for Expr {
    fn from(param: Param) -> Self {
        Expr::Param(param)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Integer(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Boolean(value)
    }
}

impl Variable {
    pub fn property(self, name: impl Into<String>) -> Expr {
        Expr::Variable(self).property(name)
    }

    pub fn project(self, items: Vec<MapProjectionItem>) -> Expr {
        Expr::MapProjection(self, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Names;

    #[test]
    fn and_flattens_and_drops_singletons() {
        let names = Names::new();
        let a = names.node();

        let single = Expr::and([a.property("x").is_null()]).unwrap();
        assert!(matches!(single, Expr::IsNull(_)));

        let nested = Expr::and([
            Expr::and([a.property("x").is_null(), a.property("y").is_null()]).unwrap(),
            a.property("z").is_null(),
        ])
        .unwrap();

        assert!(matches!(nested, Expr::And(ref items) if items.len() == 3));

        assert!(Expr::and([]).is_none());
    }
}
