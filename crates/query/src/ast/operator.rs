//! Condition operators.

use core::fmt;

/// How many operand values an operator takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    /// Operand values are ignored.
    Unary,
    /// Exactly `n` operand values.
    Exactly(usize),
    /// At least one operand value.
    AtLeastOne,
    /// Any number of operand values, including none.
    Any,
}

impl Arity {
    /// Checks an operand count against this arity.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Unary | Arity::Any => true,
            Arity::Exactly(n) => count == *n,
            Arity::AtLeastOne => count >= 1,
        }
    }

    /// Human readable description of the expected count.
    pub fn describe(&self) -> String {
        match self {
            Arity::Unary => "0".into(),
            Arity::Exactly(n) => n.to_string(),
            Arity::AtLeastOne => "at least 1".into(),
            Arity::Any => "any number of".into(),
        }
    }
}

macro_rules! condition_operators {
    ($( $(#[$doc:meta])* $variant:ident => $fetch:expr, $arity:expr; )*) => {
        /// A condition operator.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ConditionOperator {
            $( $(#[$doc])* $variant, )*
        }

        impl ConditionOperator {
            /// Every operator, in declaration order.
            pub const ALL: &'static [ConditionOperator] = &[$( ConditionOperator::$variant, )*];

            /// FetchXML spelling of the operator. `None` for operators that
            /// only exist in the structured form.
            pub fn fetch_name(&self) -> Option<&'static str> {
                match self {
                    $( ConditionOperator::$variant => $fetch, )*
                }
            }

            /// Operand arity of the operator.
            pub fn arity(&self) -> Arity {
                match self {
                    $( ConditionOperator::$variant => $arity, )*
                }
            }
        }
    };
}

condition_operators! {
    Equal => Some("eq"), Arity::AtLeastOne;
    NotEqual => Some("ne"), Arity::AtLeastOne;
    GreaterThan => Some("gt"), Arity::Exactly(1);
    GreaterEqual => Some("ge"), Arity::Exactly(1);
    LessThan => Some("lt"), Arity::Exactly(1);
    LessEqual => Some("le"), Arity::Exactly(1);
    Like => Some("like"), Arity::Exactly(1);
    NotLike => Some("not-like"), Arity::Exactly(1);
    BeginsWith => Some("begins-with"), Arity::Exactly(1);
    DoesNotBeginWith => Some("not-begin-with"), Arity::Exactly(1);
    /// Rendered as `like '%value%'` in FetchXML.
    Contains => None, Arity::Exactly(1);
    /// Rendered as `not-like '%value%'` in FetchXML.
    DoesNotContain => None, Arity::Exactly(1);
    EndsWith => Some("ends-with"), Arity::Exactly(1);
    DoesNotEndWith => Some("not-end-with"), Arity::Exactly(1);
    In => Some("in"), Arity::Any;
    NotIn => Some("not-in"), Arity::Any;
    Between => Some("between"), Arity::Exactly(2);
    NotBetween => Some("not-between"), Arity::Exactly(2);
    Null => Some("null"), Arity::Unary;
    NotNull => Some("not-null"), Arity::Unary;
    On => Some("on"), Arity::Exactly(1);
    NotOn => Some("not-on"), Arity::Exactly(1);
    OnOrAfter => Some("on-or-after"), Arity::Exactly(1);
    OnOrBefore => Some("on-or-before"), Arity::Exactly(1);
    Today => Some("today"), Arity::Unary;
    Yesterday => Some("yesterday"), Arity::Unary;
    Tomorrow => Some("tomorrow"), Arity::Unary;
    Last7Days => Some("last-seven-days"), Arity::Unary;
    Next7Days => Some("next-seven-days"), Arity::Unary;
    LastWeek => Some("last-week"), Arity::Unary;
    ThisWeek => Some("this-week"), Arity::Unary;
    NextWeek => Some("next-week"), Arity::Unary;
    LastMonth => Some("last-month"), Arity::Unary;
    ThisMonth => Some("this-month"), Arity::Unary;
    NextMonth => Some("next-month"), Arity::Unary;
    LastYear => Some("last-year"), Arity::Unary;
    ThisYear => Some("this-year"), Arity::Unary;
    NextYear => Some("next-year"), Arity::Unary;
    LastXHours => Some("last-x-hours"), Arity::Exactly(1);
    NextXHours => Some("next-x-hours"), Arity::Exactly(1);
    LastXDays => Some("last-x-days"), Arity::Exactly(1);
    NextXDays => Some("next-x-days"), Arity::Exactly(1);
    LastXWeeks => Some("last-x-weeks"), Arity::Exactly(1);
    NextXWeeks => Some("next-x-weeks"), Arity::Exactly(1);
    LastXMonths => Some("last-x-months"), Arity::Exactly(1);
    NextXMonths => Some("next-x-months"), Arity::Exactly(1);
    LastXYears => Some("last-x-years"), Arity::Exactly(1);
    NextXYears => Some("next-x-years"), Arity::Exactly(1);
    OlderThanXMinutes => Some("olderthan-x-minutes"), Arity::Exactly(1);
    OlderThanXHours => Some("olderthan-x-hours"), Arity::Exactly(1);
    OlderThanXDays => Some("olderthan-x-days"), Arity::Exactly(1);
    OlderThanXWeeks => Some("olderthan-x-weeks"), Arity::Exactly(1);
    OlderThanXMonths => Some("olderthan-x-months"), Arity::Exactly(1);
    OlderThanXYears => Some("olderthan-x-years"), Arity::Exactly(1);
    EqualUserId => Some("eq-userid"), Arity::Unary;
    NotEqualUserId => Some("ne-userid"), Arity::Unary;
    EqualBusinessId => Some("eq-businessid"), Arity::Unary;
    NotEqualBusinessId => Some("ne-businessid"), Arity::Unary;
    ThisFiscalYear => Some("this-fiscal-year"), Arity::Unary;
    ThisFiscalPeriod => Some("this-fiscal-period"), Arity::Unary;
    LastFiscalYear => Some("last-fiscal-year"), Arity::Unary;
    LastFiscalPeriod => Some("last-fiscal-period"), Arity::Unary;
    NextFiscalYear => Some("next-fiscal-year"), Arity::Unary;
    NextFiscalPeriod => Some("next-fiscal-period"), Arity::Unary;
    LastXFiscalYears => Some("last-x-fiscal-years"), Arity::Exactly(1);
    LastXFiscalPeriods => Some("last-x-fiscal-periods"), Arity::Exactly(1);
    NextXFiscalYears => Some("next-x-fiscal-years"), Arity::Exactly(1);
    NextXFiscalPeriods => Some("next-x-fiscal-periods"), Arity::Exactly(1);
    InFiscalYear => Some("in-fiscal-year"), Arity::Exactly(1);
    InFiscalPeriod => Some("in-fiscal-period"), Arity::Exactly(1);
    InFiscalPeriodAndYear => Some("in-fiscal-period-and-year"), Arity::Exactly(2);
    InOrBeforeFiscalPeriodAndYear => Some("in-or-before-fiscal-period-and-year"), Arity::Exactly(2);
    InOrAfterFiscalPeriodAndYear => Some("in-or-after-fiscal-period-and-year"), Arity::Exactly(2);
    Above => Some("above"), Arity::Exactly(1);
    AboveOrEqual => Some("eq-or-above"), Arity::Exactly(1);
    Under => Some("under"), Arity::Exactly(1);
    UnderOrEqual => Some("eq-or-under"), Arity::Exactly(1);
    NotUnder => Some("not-under"), Arity::Exactly(1);
    ContainValues => Some("contain-values"), Arity::Any;
    DoesNotContainValues => Some("not-contain-values"), Arity::Any;
}

impl ConditionOperator {
    /// Looks up an operator by its FetchXML spelling (case-insensitive).
    pub fn from_fetch_name(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        if lowered == "neq" {
            return Some(ConditionOperator::NotEqual);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.fetch_name() == Some(lowered.as_str()))
    }

    /// Operators evaluated as a date window or date comparison.
    pub fn is_date_operator(&self) -> bool {
        use ConditionOperator::*;
        matches!(
            self,
            On | NotOn
                | OnOrAfter
                | OnOrBefore
                | Today
                | Yesterday
                | Tomorrow
                | Last7Days
                | Next7Days
                | LastWeek
                | ThisWeek
                | NextWeek
                | LastMonth
                | ThisMonth
                | NextMonth
                | LastYear
                | ThisYear
                | NextYear
                | LastXHours
                | NextXHours
                | LastXDays
                | NextXDays
                | LastXWeeks
                | NextXWeeks
                | LastXMonths
                | NextXMonths
                | LastXYears
                | NextXYears
                | OlderThanXMinutes
                | OlderThanXHours
                | OlderThanXDays
                | OlderThanXWeeks
                | OlderThanXMonths
                | OlderThanXYears
        ) || self.is_fiscal()
    }

    /// Fiscal calendar operators.
    pub fn is_fiscal(&self) -> bool {
        use ConditionOperator::*;
        matches!(
            self,
            ThisFiscalYear
                | ThisFiscalPeriod
                | LastFiscalYear
                | LastFiscalPeriod
                | NextFiscalYear
                | NextFiscalPeriod
                | LastXFiscalYears
                | LastXFiscalPeriods
                | NextXFiscalYears
                | NextXFiscalPeriods
                | InFiscalYear
                | InFiscalPeriod
                | InFiscalPeriodAndYear
                | InOrBeforeFiscalPeriodAndYear
                | InOrAfterFiscalPeriodAndYear
        )
    }

    /// Hierarchy traversal operators.
    pub fn is_hierarchy(&self) -> bool {
        use ConditionOperator::*;
        matches!(self, Above | AboveOrEqual | Under | UnderOrEqual | NotUnder)
    }

    /// Operators allowed when comparing two columns of the same row.
    pub fn supports_column_comparison(&self) -> bool {
        use ConditionOperator::*;
        matches!(
            self,
            Equal | NotEqual | GreaterThan | GreaterEqual | LessThan | LessEqual
        )
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
