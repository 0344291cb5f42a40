use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::UnderwritingError;
use crate::real_assets::loan_sizing::{resolve, LoanSizingInput, SizedLoan};
use crate::rounding::{round2, round4};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Periods, Rate};
use crate::UnderwritingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Acquisition and operating assumptions for the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealAssumptions {
    pub purchase_price: Money,
    pub closing_and_renovations: Money,
    /// Cap rate the deal was priced at (year-1 NOI / price)
    pub going_in_cap_rate: Rate,
    pub initial_revenue: Money,
    pub initial_operating_expenses: Money,
    /// Signed reserve cash flow added to NOI each year
    pub initial_capital_reserves: Money,
    pub projected_revenue_growth: Rate,
    pub projected_operating_expenses_growth: Rate,
    pub projected_capital_reserves_growth: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAssumptions {
    /// Share of the purchase price attributable to land (not depreciable)
    pub land_value_ratio: Rate,
    /// Straight-line depreciation life of the building, in periods
    pub depreciation_timeline: Periods,
    pub income_tax_rate: Rate,
    pub capital_gains_tax_rate: Rate,
    pub depreciation_recapture_tax_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleAssumptions {
    pub exit_cap_rate: Rate,
    /// Selling costs as a fraction of the gross sale price
    pub cost_of_sale: Rate,
    /// Year of sale; must coincide with the loan term
    pub sale_year: Periods,
}

impl SaleAssumptions {
    /// Net sale price for a forward NOI capitalised at the exit cap rate.
    pub fn projected_sale_price(&self, noi: Money) -> UnderwritingResult<Money> {
        let gross = round2(checked::div(noi, self.exit_cap_rate, "sale price at exit cap rate")?);
        let selling_costs = checked::mul(gross, self.cost_of_sale, "cost of sale")?;
        Ok(round2(checked::sub(gross, selling_costs, "net sale price")?))
    }
}

/// Deal, tax and sale assumptions for one projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAssumptions {
    pub deal: DealAssumptions,
    pub tax: TaxAssumptions,
    pub sale: SaleAssumptions,
}

/// Full analysis request: assumptions plus the loan terms to size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAnalysisInput {
    pub deal: DealAssumptions,
    pub tax: TaxAssumptions,
    pub sale: SaleAssumptions,
    pub loan: LoanSizingInput,
}

/// Terminal sale folded into the final projected year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEvent {
    /// NOI one compounding step past the term, capitalised at exit
    pub forward_noi: Money,
    pub sale_price: Money,
    pub capital_gain: Money,
    pub capital_gains_tax: Money,
    pub depreciation_recapture_tax: Money,
    pub balloon_payment: Money,
    /// The year's net cash flow before the sale was folded in
    pub operating_net_cash_flow: Money,
}

/// One projected year. Year 0 carries only the acquisition outlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: Periods,
    pub revenue: Money,
    pub expense: Money,
    pub noi: Money,
    pub reserve: Money,
    pub principal_payment: Money,
    pub interest_payment: Money,
    /// Signed amortizing loan payment charged against the year, IO years included
    pub debt_service: Money,
    pub cashflow_after_debt_service: Money,
    pub depreciation_expense: Money,
    pub income_tax: Money,
    /// |income tax / cash flow after debt service|
    pub implied_income_tax: Rate,
    pub net_cash_flow: Money,
    pub cash_on_cash_return: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleEvent>,
}

impl CashFlowYear {
    fn acquisition(cost: Money) -> Self {
        CashFlowYear {
            year: 0,
            revenue: Decimal::ZERO,
            expense: Decimal::ZERO,
            noi: Decimal::ZERO,
            reserve: Decimal::ZERO,
            principal_payment: Decimal::ZERO,
            interest_payment: Decimal::ZERO,
            debt_service: Decimal::ZERO,
            cashflow_after_debt_service: Decimal::ZERO,
            depreciation_expense: Decimal::ZERO,
            income_tax: Decimal::ZERO,
            implied_income_tax: Decimal::ZERO,
            net_cash_flow: cost,
            cash_on_cash_return: Decimal::ZERO,
            sale: None,
        }
    }
}

/// Projected return on a leveraged acquisition.
///
/// Built once by [`project`]; the assumptions and the sized loan are copied
/// in and the whole record is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnOfInvestment {
    pub deal: DealAssumptions,
    pub tax: TaxAssumptions,
    pub sale: SaleAssumptions,
    pub loan: SizedLoan,
    /// Equity outlay at closing (negative)
    pub acquisition_cost: Money,
    pub building_value: Money,
    /// Yearly straight-line depreciation (negative)
    pub building_depreciation: Money,
    /// Year 0 through the sale year
    pub net_cash_flow_projection: Vec<CashFlowYear>,
    /// Not computed yet.
    pub internal_rate_of_return: Option<Rate>,
    /// Not computed yet.
    pub equity_multiple: Option<Multiple>,
    /// Not computed yet.
    pub average_cash_on_cash_return: Option<Rate>,
}

impl ReturnOfInvestment {
    /// The final projected year, which carries the sale.
    pub fn sale_year(&self) -> Option<&CashFlowYear> {
        self.net_cash_flow_projection.last()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project yearly cash flows for the hold and fold the sale into the last year.
pub fn project(
    assumptions: &InvestmentAssumptions,
    loan: &SizedLoan,
) -> UnderwritingResult<ReturnOfInvestment> {
    validate_assumptions(assumptions, loan)?;

    let acquisition_cost = acquisition_cost(&assumptions.deal, loan)?;
    let building_value = round2(checked::mul(
        assumptions.deal.purchase_price,
        Decimal::ONE - assumptions.tax.land_value_ratio,
        "building value",
    )?);
    let building_depreciation = round2(checked::div(
        -building_value,
        Decimal::from(assumptions.tax.depreciation_timeline),
        "building depreciation",
    )?);

    let (mut operating, forward) =
        operating_years(assumptions, loan, acquisition_cost, building_depreciation)?;

    let sale = sale_event(assumptions, loan, building_depreciation, &forward, &operating)?;
    if let Some(last) = operating.last_mut() {
        last.net_cash_flow = round2(checked::sum(
            [
                sale.operating_net_cash_flow,
                sale.sale_price,
                sale.depreciation_recapture_tax,
                sale.capital_gains_tax,
                sale.balloon_payment,
            ],
            "sale year net cash flow",
        )?);
        last.sale = Some(sale);
    }

    debug!(
        "Projected {} years; acquisition cost {acquisition_cost}",
        operating.len()
    );

    let mut net_cash_flow_projection = Vec::with_capacity(operating.len() + 1);
    net_cash_flow_projection.push(CashFlowYear::acquisition(acquisition_cost));
    net_cash_flow_projection.extend(operating);

    Ok(ReturnOfInvestment {
        deal: assumptions.deal.clone(),
        tax: assumptions.tax.clone(),
        sale: assumptions.sale.clone(),
        loan: loan.clone(),
        acquisition_cost,
        building_value,
        building_depreciation,
        net_cash_flow_projection,
        internal_rate_of_return: None,
        equity_multiple: None,
        average_cash_on_cash_return: None,
    })
}

/// Size the loan, project the hold, and wrap the result with warnings.
pub fn analyze_investment(
    input: &InvestmentAnalysisInput,
) -> UnderwritingResult<ComputationOutput<ReturnOfInvestment>> {
    let start = Instant::now();

    let loan = resolve(&input.loan)?;
    let assumptions = InvestmentAssumptions {
        deal: input.deal.clone(),
        tax: input.tax.clone(),
        sale: input.sale.clone(),
    };
    let roi = project(&assumptions, &loan)?;
    let warnings = projection_warnings(&roi);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Leveraged Real Estate Cash Flow Projection (after-tax, with sale)",
        input,
        warnings,
        elapsed,
        roi,
    ))
}

// ---------------------------------------------------------------------------
// Projection steps
// ---------------------------------------------------------------------------

/// Equity needed at closing: price and costs plus the fee, less loan proceeds.
fn acquisition_cost(deal: &DealAssumptions, loan: &SizedLoan) -> UnderwritingResult<Money> {
    let amount = loan.maximum_loan_amount();
    let fee = checked::mul(loan.terms().loan_origination_fees, amount, "origination fee")?;
    let cost = checked::sum(
        [-deal.purchase_price, -deal.closing_and_renovations, -fee, amount],
        "acquisition cost",
    )?;
    Ok(round2(cost))
}

/// Revenue, expense and reserve for one year; each grows additively.
#[derive(Debug, Clone)]
struct OperatingLine {
    revenue: Money,
    expense: Money,
    reserve: Money,
}

impl OperatingLine {
    fn initial(deal: &DealAssumptions) -> Self {
        OperatingLine {
            revenue: deal.initial_revenue,
            expense: deal.initial_operating_expenses,
            reserve: deal.initial_capital_reserves,
        }
    }

    fn noi(&self) -> UnderwritingResult<Money> {
        Ok(round2(checked::sub(self.revenue, self.expense, "NOI")?))
    }

    fn grown(&self, deal: &DealAssumptions) -> UnderwritingResult<Self> {
        Ok(OperatingLine {
            revenue: grow(self.revenue, deal.projected_revenue_growth, "revenue growth")?,
            expense: grow(self.expense, deal.projected_operating_expenses_growth, "expense growth")?,
            reserve: grow(self.reserve, deal.projected_capital_reserves_growth, "reserve growth")?,
        })
    }
}

/// `amount` plus its growth for the year, the increment rounded to cents.
fn grow(amount: Money, growth: Rate, context: &str) -> UnderwritingResult<Money> {
    let increment = round2(checked::mul(amount, growth, context)?);
    checked::add(amount, increment, context)
}

/// Years 1..=term, plus the line one step past the term.
fn operating_years(
    assumptions: &InvestmentAssumptions,
    loan: &SizedLoan,
    acquisition_cost: Money,
    building_depreciation: Money,
) -> UnderwritingResult<(Vec<CashFlowYear>, OperatingLine)> {
    let deal = &assumptions.deal;
    let tax = &assumptions.tax;
    let distribution = loan.payment_distribution();
    let term = loan.terms().term;

    let mut line = OperatingLine::initial(deal);
    let mut years = Vec::with_capacity(term as usize);

    for (year, (principal_payment, interest_payment)) in (1..=term).zip(
        distribution
            .principal
            .iter()
            .copied()
            .zip(distribution.interest.iter().copied()),
    ) {
        let noi = line.noi()?;
        let debt_service = loan.loan_payment();
        let cashflow_after_debt_service = round2(checked::sum(
            [noi, line.reserve, debt_service],
            "cash flow after debt service",
        )?);

        let depreciation_expense = if year < tax.depreciation_timeline {
            building_depreciation
        } else {
            Decimal::ZERO
        };

        let taxable_income = checked::sum(
            [noi, interest_payment, depreciation_expense],
            "taxable income",
        )?;
        let income_tax = round2(checked::mul(-taxable_income, tax.income_tax_rate, "income tax")?);
        let implied_income_tax = ratio(income_tax, cashflow_after_debt_service);
        let net_cash_flow = round2(checked::add(
            cashflow_after_debt_service,
            income_tax,
            "net cash flow",
        )?);

        years.push(CashFlowYear {
            year,
            revenue: line.revenue,
            expense: line.expense,
            noi,
            reserve: line.reserve,
            principal_payment,
            interest_payment,
            debt_service,
            cashflow_after_debt_service,
            depreciation_expense,
            income_tax,
            implied_income_tax,
            net_cash_flow,
            cash_on_cash_return: ratio(net_cash_flow, acquisition_cost),
            sale: None,
        });

        line = line.grown(deal)?;
    }

    Ok((years, line))
}

fn sale_event(
    assumptions: &InvestmentAssumptions,
    loan: &SizedLoan,
    building_depreciation: Money,
    forward: &OperatingLine,
    operating: &[CashFlowYear],
) -> UnderwritingResult<SaleEvent> {
    let deal = &assumptions.deal;
    let tax = &assumptions.tax;
    let sale = &assumptions.sale;

    let forward_noi = forward.noi()?;
    let sale_price = sale.projected_sale_price(forward_noi)?;

    let capital_gain = round2(checked::sum(
        [sale_price, -deal.purchase_price, -deal.closing_and_renovations],
        "capital gain",
    )?);
    let capital_gains_tax =
        round2(checked::mul(capital_gain, tax.capital_gains_tax_rate, "capital gains tax")?);
    let depreciation_taken = checked::mul(
        building_depreciation,
        Decimal::from(sale.sale_year),
        "depreciation recapture",
    )?;
    let depreciation_recapture_tax = round2(checked::mul(
        depreciation_taken,
        tax.depreciation_recapture_tax_rate,
        "depreciation recapture",
    )?);

    let operating_net_cash_flow = operating
        .last()
        .map(|y| y.net_cash_flow)
        .unwrap_or(Decimal::ZERO);

    Ok(SaleEvent {
        forward_noi,
        sale_price,
        capital_gain,
        capital_gains_tax,
        depreciation_recapture_tax,
        balloon_payment: loan.balloon_payment(),
        operating_net_cash_flow,
    })
}

/// |numerator / denominator| to four places; zero when the base is zero.
fn ratio(numerator: Money, denominator: Money) -> Rate {
    numerator
        .checked_div(denominator)
        .map(|r| round4(r.abs()))
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_assumptions(
    assumptions: &InvestmentAssumptions,
    loan: &SizedLoan,
) -> UnderwritingResult<()> {
    let term = loan.terms().term;

    if assumptions.sale.sale_year != term {
        return Err(UnderwritingError::validation(
            "sale_year",
            assumptions.sale.sale_year,
            format!("Sale year must equal the loan term ({term})"),
        ));
    }

    if assumptions.sale.exit_cap_rate <= Decimal::ZERO {
        return Err(UnderwritingError::validation(
            "exit_cap_rate",
            assumptions.sale.exit_cap_rate,
            "Exit cap rate must be positive",
        ));
    }

    if assumptions.tax.depreciation_timeline == 0 {
        return Err(UnderwritingError::validation(
            "depreciation_timeline",
            assumptions.tax.depreciation_timeline,
            "Depreciation timeline must be at least 1 period",
        ));
    }

    let land = assumptions.tax.land_value_ratio;
    if land < Decimal::ZERO || land > Decimal::ONE {
        return Err(UnderwritingError::validation(
            "land_value_ratio",
            land,
            "Land value ratio must be between 0 and 1",
        ));
    }

    Ok(())
}

fn projection_warnings(roi: &ReturnOfInvestment) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(first) = roi.net_cash_flow_projection.get(1) {
        let implied_cap =
            checked::div(first.noi, roi.deal.purchase_price, "implied cap rate").map(round4);
        if let Ok(implied_cap) = implied_cap {
            let off_by = implied_cap.checked_sub(roi.deal.going_in_cap_rate);
            if off_by.map_or(false, |d| d.abs() > dec!(0.005)) {
                warnings.push(format!(
                    "Year-1 NOI implies a {implied_cap} cap rate against a stated going-in cap rate of {}",
                    roi.deal.going_in_cap_rate
                ));
            }
        }
    }

    for year in roi.net_cash_flow_projection.iter().skip(1) {
        let operating = year
            .sale
            .as_ref()
            .map(|s| s.operating_net_cash_flow)
            .unwrap_or(year.net_cash_flow);
        if operating < Decimal::ZERO {
            warnings.push(format!(
                "Year {} operating net cash flow is negative ({operating})",
                year.year
            ));
        }
    }

    if roi.tax.depreciation_timeline <= roi.sale.sale_year {
        warnings.push(format!(
            "Depreciation timeline of {} ends before the sale; recapture is still taken over {} years",
            roi.tax.depreciation_timeline, roi.sale.sale_year
        ));
    }

    if roi.acquisition_cost >= Decimal::ZERO {
        warnings.push(
            "Loan proceeds cover the full acquisition; cash-on-cash returns are reported as 0"
                .to_string(),
        );
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_loan() -> LoanSizingInput {
        LoanSizingInput {
            max_ltv: dec!(0.70),
            min_dscr: dec!(1.25),
            amortization: 30,
            term: 10,
            io_period: 2,
            rate: dec!(0.045),
            property_value: dec!(6_500_000),
            noi: dec!(387_500),
            requested_loan_amount: dec!(5_000_000),
            loan_origination_fees: dec!(0.01),
        }
    }

    fn sample_assumptions() -> InvestmentAssumptions {
        InvestmentAssumptions {
            deal: DealAssumptions {
                purchase_price: dec!(6_500_000),
                closing_and_renovations: dec!(225_000),
                going_in_cap_rate: dec!(0.0596),
                initial_revenue: dec!(687_500),
                initial_operating_expenses: dec!(300_000),
                initial_capital_reserves: dec!(7_500),
                projected_revenue_growth: dec!(0.035),
                projected_operating_expenses_growth: dec!(0.025),
                projected_capital_reserves_growth: dec!(0.025),
            },
            tax: TaxAssumptions {
                land_value_ratio: dec!(0.3),
                depreciation_timeline: 27,
                income_tax_rate: dec!(0.25),
                capital_gains_tax_rate: dec!(0.15),
                depreciation_recapture_tax_rate: dec!(0.25),
            },
            sale: SaleAssumptions {
                exit_cap_rate: dec!(0.065),
                cost_of_sale: dec!(0.025),
                sale_year: 10,
            },
        }
    }

    #[test]
    fn test_projected_sale_price() {
        let sale = sample_assumptions().sale;
        assert_eq!(
            sale.projected_sale_price(dec!(585_761.29)).unwrap(),
            dec!(8_786_419.35)
        );
    }

    #[test]
    fn test_projected_sale_price_zero_cap_is_numeric_fault() {
        let mut sale = sample_assumptions().sale;
        sale.exit_cap_rate = dec!(0);
        let err = sale.projected_sale_price(dec!(100)).unwrap_err();
        assert!(matches!(err, UnderwritingError::Numeric { .. }));
    }

    #[test]
    fn test_acquisition_cost() {
        let loan = resolve(&sample_loan()).unwrap();
        let roi = project(&sample_assumptions(), &loan).unwrap();
        // -6.5M - 225k - 1% * 4.55M + 4.55M
        assert_eq!(roi.acquisition_cost, dec!(-2_220_500));
        assert_eq!(roi.net_cash_flow_projection[0].net_cash_flow, dec!(-2_220_500));
    }

    #[test]
    fn test_projection_length() {
        let loan = resolve(&sample_loan()).unwrap();
        let roi = project(&sample_assumptions(), &loan).unwrap();
        assert_eq!(roi.net_cash_flow_projection.len(), 11);
        assert!(roi.net_cash_flow_projection[..10].iter().all(|y| y.sale.is_none()));
        assert!(roi.sale_year().unwrap().sale.is_some());
    }

    #[test]
    fn test_sale_year_must_match_term() {
        let loan = resolve(&sample_loan()).unwrap();
        let mut assumptions = sample_assumptions();
        assumptions.sale.sale_year = 7;
        let err = project(&assumptions, &loan).unwrap_err();
        assert_eq!(err.field(), Some("sale_year"));
    }

    #[test]
    fn test_zero_depreciation_timeline_error() {
        let loan = resolve(&sample_loan()).unwrap();
        let mut assumptions = sample_assumptions();
        assumptions.tax.depreciation_timeline = 0;
        let err = project(&assumptions, &loan).unwrap_err();
        assert_eq!(err.field(), Some("depreciation_timeline"));
    }

    #[test]
    fn test_depreciation_stops_at_timeline() {
        let loan = resolve(&sample_loan()).unwrap();
        let mut assumptions = sample_assumptions();
        assumptions.tax.depreciation_timeline = 5;
        let roi = project(&assumptions, &loan).unwrap();
        let dep: Vec<Money> = roi.net_cash_flow_projection[1..]
            .iter()
            .map(|y| y.depreciation_expense)
            .collect();
        assert!(dep[..4].iter().all(|d| *d == roi.building_depreciation));
        assert!(dep[4..].iter().all(|d| d.is_zero()));
    }

    #[test]
    fn test_runaway_growth_is_numeric_fault() {
        let loan = resolve(&sample_loan()).unwrap();
        let mut assumptions = sample_assumptions();
        assumptions.deal.projected_revenue_growth = dec!(1_000_000_000);
        let err = project(&assumptions, &loan).unwrap_err();
        assert!(matches!(err, UnderwritingError::Numeric { .. }), "{err:?}");
    }

    #[test]
    fn test_every_year_pays_the_amortizing_payment() {
        let loan = resolve(&sample_loan()).unwrap();
        let roi = project(&sample_assumptions(), &loan).unwrap();
        assert!(roi.net_cash_flow_projection[1..]
            .iter()
            .all(|y| y.debt_service == dec!(-279_331.52)));
    }

    #[test]
    fn test_return_metrics_left_unset() {
        let loan = resolve(&sample_loan()).unwrap();
        let roi = project(&sample_assumptions(), &loan).unwrap();
        assert!(roi.internal_rate_of_return.is_none());
        assert!(roi.equity_multiple.is_none());
        assert!(roi.average_cash_on_cash_return.is_none());
    }

    #[test]
    fn test_ratio_zero_base() {
        assert_eq!(ratio(dec!(100), dec!(0)), dec!(0));
        assert_eq!(ratio(dec!(112_110.61), dec!(-2_220_500)), dec!(0.0505));
    }
}
