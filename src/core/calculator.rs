use crate::domain::model::{CalculationResult, LoanParameters, LoanQuote, OFFERED_TERMS};

/// Annuity calculation. Returns `None` when the parameters are not yet
/// calculable (non-positive principal or term, negative or non-finite rate).
///
/// The monthly payment is rounded half away from zero first; the total is
/// that rounded payment times the term, and the overpayment is the rounded
/// difference between the total and the principal.
pub fn calculate(params: &LoanParameters) -> Option<CalculationResult> {
    let principal = params.principal;
    let months = params.term_months;

    if !principal.is_finite() || principal <= 0.0 || months == 0 {
        return None;
    }
    if !params.annual_rate.is_finite() || params.annual_rate < 0.0 {
        return None;
    }

    let monthly_rate = params.annual_rate / 100.0 / 12.0;
    let raw_monthly = if monthly_rate == 0.0 {
        principal / f64::from(months)
    } else {
        // (1+i)^-n tends to zero for long terms instead of overflowing.
        let discount = (1.0 + monthly_rate).powf(-f64::from(months));
        principal * monthly_rate / (1.0 - discount)
    };

    if !raw_monthly.is_finite() {
        return None;
    }

    let monthly_payment = raw_monthly.round() as u64;
    let total_payment = monthly_payment.checked_mul(u64::from(months))?;
    let overpayment = (total_payment as f64 - principal).round() as i64;

    Some(CalculationResult {
        monthly_payment,
        total_payment,
        overpayment,
    })
}

pub fn quote(params: LoanParameters) -> Option<LoanQuote> {
    calculate(&params).map(|result| LoanQuote {
        parameters: params,
        result,
    })
}

pub fn is_offered_term(months: u32) -> bool {
    OFFERED_TERMS.contains(&months)
}

/// Builds parameters from raw form text. Blank or unparsable input yields `None`.
/// Group separators (spaces) and a decimal comma are accepted in numbers.
pub fn parse_form(amount: &str, term: &str, rate: &str) -> Option<LoanParameters> {
    let principal = parse_decimal(amount)?;
    let term_months = term.trim().parse::<u32>().ok()?;
    let annual_rate = parse_decimal(rate)?;

    Some(LoanParameters {
        principal,
        term_months,
        annual_rate,
    })
}

pub(crate) fn parse_decimal(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
