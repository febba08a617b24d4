//! Fixed-rate amortization. Kept separate from the engine so the annuity
//! math and its zero-rate fallback can be tested in isolation.

#[derive(Debug, Clone, Copy)]
pub struct MortgageTerms {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_months: u32,
}

impl MortgageTerms {
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }

    /// Annuity payment `P*r / (1 - (1+r)^-n)`. A zero rate degenerates the
    /// formula to 0/0, so it falls back to straight-line `P/n`.
    pub fn monthly_payment(&self) -> f64 {
        if self.principal <= 0.0 || self.term_months == 0 {
            return 0.0;
        }
        let n = f64::from(self.term_months);
        let r = self.monthly_rate();
        if r == 0.0 {
            self.principal / n
        } else {
            self.principal * r / (1.0 - (1.0 + r).powf(-n))
        }
    }
}

/// Running loan balance, advanced one month at a time.
#[derive(Debug, Clone)]
pub struct AmortizationSchedule {
    payment: f64,
    monthly_rate: f64,
    remaining: f64,
}

impl AmortizationSchedule {
    pub fn new(terms: MortgageTerms) -> Self {
        Self {
            payment: terms.monthly_payment(),
            monthly_rate: terms.monthly_rate(),
            remaining: terms.principal.max(0.0),
        }
    }

    pub fn monthly_payment(&self) -> f64 {
        self.payment
    }

    pub fn remaining_principal(&self) -> f64 {
        self.remaining
    }

    /// Accrues one month of interest and applies one payment. Clamped at
    /// zero so float residue in the final month cannot leave a negative
    /// balance.
    pub fn advance_month(&mut self) {
        if self.remaining <= 0.0 {
            return;
        }
        let interest = self.remaining * self.monthly_rate;
        self.remaining = (self.remaining + interest - self.payment).max(0.0);
    }
}
