use crate::model::{Expr, Statement};

/// `this.markDirty("<property>", <value>)`, bound to the capability's
/// instrumentation method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationCall<'a> {
    pub method: &'a str,
    pub property: &'a str,
    pub value_var: &'a str,
}

impl<'a> InstrumentationCall<'a> {
    pub fn new(method: &'a str, property: &'a str, value_var: &'a str) -> Self {
        Self {
            method,
            property,
            value_var,
        }
    }

    pub fn to_statement(&self) -> Statement {
        Statement::expr(Expr::call(
            self.method,
            vec![Expr::string(self.property), Expr::var(self.value_var)],
        ))
    }

    /// True if `statement` is this exact call.
    pub fn matches(&self, statement: &Statement) -> bool {
        *statement == self.to_statement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_a_call_on_this() {
        let call = InstrumentationCall::new("markDirty", "balance", "value");
        assert_eq!(call.to_statement().to_string(), "this.markDirty(\"balance\", value)");
        assert!(call.matches(&call.to_statement()));
        assert!(!InstrumentationCall::new("markDirty", "other", "value").matches(&call.to_statement()));
    }
}
