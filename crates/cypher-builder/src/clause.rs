use crate::{Expr, Pattern, Variable};

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(Match),
    With(Projection),
    Return(Projection),
    Unwind(Expr, Variable),
    Call(Call),
    /// Only valid as the whole body of a [`Call`], the imports are repeated in every branch.
    Union(Vec<Vec<Clause>>),
    CallProcedure(CallProcedure),
    Create(Pattern),
    Merge(Pattern),
    Set(Vec<SetItem>),
    Delete { detach: bool, items: Vec<Expr> },
    Raw(Raw),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub optional: bool,
    pub pattern: Pattern,
    pub predicate: Option<Expr>,
}

impl Match {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            optional: false,
            pattern: pattern.into(),
            predicate: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn predicate(mut self, predicate: Option<Expr>) -> Self {
        self.predicate = predicate;
        self
    }
}

impl From<Match> for Clause {
    fn from(value: Match) -> Self {
        Clause::Match(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alias {
    Variable(Variable),
    Name(String),
}

impl From<Variable> for Alias {
    fn from(variable: Variable) -> Self {
        Alias::Variable(variable)
    }
}

impl From<&str> for Alias {
    fn from(name: &str) -> Self {
        Alias::Name(name.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// The body shared by `WITH` and `RETURN`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub distinct: bool,
    pub star: bool,
    pub items: Vec<(Expr, Option<Alias>)>,
    pub order_by: Vec<(Expr, Order)>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
    /// `WITH ... WHERE`, ignored for `RETURN`.
    pub predicate: Option<Expr>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn star() -> Self {
        Self {
            star: true,
            ..Default::default()
        }
    }

    pub fn variables(variables: impl IntoIterator<Item = Variable>) -> Self {
        Self {
            items: variables.into_iter().map(|var| (Expr::Variable(var), None)).collect(),
            ..Default::default()
        }
    }

    pub fn item(mut self, expr: impl Into<Expr>, alias: impl Into<Alias>) -> Self {
        self.items.push((expr.into(), Some(alias.into())));
        self
    }

    pub fn bare(mut self, expr: impl Into<Expr>) -> Self {
        self.items.push((expr.into(), None));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn order_by(mut self, order_by: Vec<(Expr, Order)>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn skip(mut self, skip: Option<Expr>) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: Option<Expr>) -> Self {
        self.limit = limit;
        self
    }

    pub fn predicate(mut self, predicate: Option<Expr>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn has_modifiers(&self) -> bool {
        !self.order_by.is_empty() || self.skip.is_some() || self.limit.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Imports {
    None,
    Star,
    Variables(Vec<Variable>),
}

/// `CALL { WITH <imports> <body> }`. Subqueries never capture their enclosing scope implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub imports: Imports,
    pub body: Vec<Clause>,
}

impl Call {
    pub fn new(imports: Imports, body: Vec<Clause>) -> Self {
        Self { imports, body }
    }

    pub fn importing(variables: impl IntoIterator<Item = Variable>, body: Vec<Clause>) -> Self {
        let variables: Vec<_> = variables.into_iter().collect();
        let imports = if variables.is_empty() {
            Imports::None
        } else {
            Imports::Variables(variables)
        };

        Self { imports, body }
    }
}

impl From<Call> for Clause {
    fn from(value: Call) -> Self {
        Clause::Call(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallProcedure {
    pub name: String,
    pub arguments: Vec<Expr>,
    pub yields: Vec<(String, Variable)>,
    pub predicate: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetItem {
    Property { target: Expr, value: Expr },
}

impl SetItem {
    pub fn property(variable: Variable, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        SetItem::Property {
            target: variable.property(name),
            value: value.into(),
        }
    }
}

/// A user-provided statement. Every `$name` token listed in `substitutions` is replaced by the
/// rendering of the associated expression, any other text is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub statement: String,
    pub substitutions: Vec<(String, Expr)>,
}
