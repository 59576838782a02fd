// src/domain/service/mod.rs
// Symbol classification

use crate::domain::model::{Classification, Exchange, Product};

pub const DEFAULT_CURRENCY_TOKENS: [&str; 5] = ["USDINR", "EURINR", "GBPINR", "JPYINR", "INR"];

/// Rule table driving symbol classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierRules {
    /// Digits a symbol needs before it is treated as a derivative contract
    pub min_digits: usize,
    /// Uppercase substrings marking a currency derivative
    pub currency_tokens: Vec<String>,
    pub equity_product: Product,
    pub derivatives_product: Product,
    pub currency_product: Product,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            min_digits: 1,
            currency_tokens: DEFAULT_CURRENCY_TOKENS.iter().map(|t| t.to_string()).collect(),
            equity_product: Product::Cash,
            derivatives_product: Product::Margin,
            currency_product: Product::Margin,
        }
    }
}

impl ClassifierRules {
    pub fn with_min_digits(mut self, min_digits: usize) -> Self {
        // zero would classify every symbol as a derivative
        self.min_digits = min_digits.max(1);
        self
    }

    /// Default product for orders on `exchange`.
    pub fn product_for(&self, exchange: Exchange) -> Product {
        match exchange {
            Exchange::Equity => self.equity_product,
            Exchange::Derivatives => self.derivatives_product,
            Exchange::CurrencyDerivatives => self.currency_product,
        }
    }
}

/// Infers exchange and default product from a symbol's lexical shape.
#[derive(Debug, Clone, Default)]
pub struct SymbolClassifier {
    rules: ClassifierRules,
}

impl SymbolClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    pub fn classify(&self, symbol: &str) -> Classification {
        let digits = symbol.chars().filter(|c| c.is_ascii_digit()).count();

        let exchange = if digits >= self.rules.min_digits {
            let upper = symbol.to_uppercase();
            if self
                .rules
                .currency_tokens
                .iter()
                .any(|token| upper.contains(token.as_str()))
            {
                Exchange::CurrencyDerivatives
            } else {
                Exchange::Derivatives
            }
        } else {
            Exchange::Equity
        };

        Classification {
            exchange,
            default_product: self.rules.product_for(exchange),
        }
    }
}
