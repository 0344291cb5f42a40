use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use underwriting_core::real_assets::investment::{
    analyze_investment, project, DealAssumptions, InvestmentAnalysisInput, InvestmentAssumptions,
    SaleAssumptions, TaxAssumptions,
};
use underwriting_core::real_assets::loan_sizing::{resolve, LoanSizingInput};
use underwriting_core::time_value;
use underwriting_core::{PaymentTiming, UnderwritingError};

// ===========================================================================
// Fixtures
// ===========================================================================

fn office_loan() -> LoanSizingInput {
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

fn office_assumptions() -> InvestmentAssumptions {
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

fn office_request() -> InvestmentAnalysisInput {
    let a = office_assumptions();
    InvestmentAnalysisInput {
        deal: a.deal,
        tax: a.tax,
        sale: a.sale,
        loan: office_loan(),
    }
}

// ===========================================================================
// Projection tests
// ===========================================================================

#[test]
fn test_building_basis_and_depreciation() {
    let loan = resolve(&office_loan()).unwrap();
    let roi = project(&office_assumptions(), &loan).unwrap();

    // 70% of 6.5M is depreciable, over 27 years
    assert_eq!(roi.building_value, dec!(4_550_000));
    assert_eq!(roi.building_depreciation, dec!(-168_518.52));
    assert_eq!(roi.acquisition_cost, dec!(-2_220_500));
}

#[test]
fn test_first_year_during_interest_only() {
    let loan = resolve(&office_loan()).unwrap();
    let roi = project(&office_assumptions(), &loan).unwrap();
    let y1 = &roi.net_cash_flow_projection[1];

    assert_eq!(y1.year, 1);
    assert_eq!(y1.noi, dec!(387_500));
    // Cash flow is charged the amortizing payment; tax sees only IO interest
    assert_eq!(y1.debt_service, dec!(-279_331.52));
    assert_eq!(y1.principal_payment, dec!(0));
    assert_eq!(y1.interest_payment, dec!(-204_750));
    assert_eq!(y1.cashflow_after_debt_service, dec!(115_668.48));
    assert_eq!(y1.income_tax, dec!(-3_557.87));
    assert_eq!(y1.implied_income_tax, dec!(0.0308));
    assert_eq!(y1.net_cash_flow, dec!(112_110.61));
    assert_eq!(y1.cash_on_cash_return, dec!(0.0505));
}

#[test]
fn test_growth_compounds_into_year_two() {
    let loan = resolve(&office_loan()).unwrap();
    let roi = project(&office_assumptions(), &loan).unwrap();
    let y2 = &roi.net_cash_flow_projection[2];

    assert_eq!(y2.revenue, dec!(711_562.50));
    assert_eq!(y2.expense, dec!(307_500));
    assert_eq!(y2.reserve, dec!(7_687.50));
    assert_eq!(y2.noi, dec!(404_062.50));
    assert_eq!(y2.cashflow_after_debt_service, dec!(132_418.48));
    assert_eq!(y2.income_tax, dec!(-7_698.50));
    assert_eq!(y2.implied_income_tax, dec!(0.0581));
    assert_eq!(y2.net_cash_flow, dec!(124_719.98));
    assert_eq!(y2.cash_on_cash_return, dec!(0.0562));
}

#[test]
fn test_interest_only_years_charge_amortizing_payment() {
    let loan = resolve(&office_loan()).unwrap();
    let roi = project(&office_assumptions(), &loan).unwrap();

    for year in &roi.net_cash_flow_projection[1..=2] {
        assert_eq!(year.debt_service, loan.loan_payment());
        assert_eq!(
            year.cashflow_after_debt_service,
            year.noi + year.reserve + loan.loan_payment(),
            "year {}",
            year.year
        );
        assert_eq!(year.interest_payment, loan.io_loan_payment());
    }
}

#[test]
fn test_amortization_starts_after_io() {
    let loan = resolve(&office_loan()).unwrap();
    let roi = project(&office_assumptions(), &loan).unwrap();
    let y3 = &roi.net_cash_flow_projection[3];

    assert_eq!(y3.debt_service, dec!(-279_331.52));
    assert_eq!(y3.principal_payment, dec!(-74_581.52));
    assert_eq!(y3.interest_payment, dec!(-204_750));
    assert_eq!(y3.cashflow_after_debt_service, dec!(149_827.86));
    assert_eq!(y3.net_cash_flow, dec!(137_825.07));
}

#[test]
fn test_sale_folded_into_final_year() {
    let loan = resolve(&office_loan()).unwrap();
    let roi = project(&office_assumptions(), &loan).unwrap();
    let last = roi.sale_year().unwrap();

    assert_eq!(last.year, 10);
    assert_eq!(last.noi, dec!(562_333.04));
    assert_eq!(last.cash_on_cash_return, dec!(0.1074));

    let sale = last.sale.as_ref().unwrap();
    assert_eq!(sale.forward_noi, dec!(585_761.29));
    assert_eq!(sale.sale_price, dec!(8_786_419.35));
    assert_eq!(sale.capital_gain, dec!(2_061_419.35));
    assert_eq!(sale.capital_gains_tax, dec!(309_212.90));
    assert_eq!(sale.depreciation_recapture_tax, dec!(-421_296.30));
    assert_eq!(sale.balloon_payment, dec!(3_850_424.34));
    assert_eq!(sale.operating_net_cash_flow, dec!(238_373.46));
    assert_eq!(last.net_cash_flow, dec!(12_763_133.75));
}

#[test]
fn test_projection_is_idempotent() {
    let loan = resolve(&office_loan()).unwrap();
    let assumptions = office_assumptions();
    assert_eq!(
        project(&assumptions, &loan).unwrap(),
        project(&assumptions, &loan).unwrap()
    );
}

#[test]
fn test_all_cash_deal_reports_zero_cash_on_cash() {
    // Loan covers price plus closing costs exactly
    let mut loan_input = office_loan();
    loan_input.max_ltv = dec!(1);
    loan_input.min_dscr = dec!(0.01);
    loan_input.loan_origination_fees = dec!(0);
    loan_input.requested_loan_amount = dec!(6_725_000);
    loan_input.property_value = dec!(6_725_000);
    let loan = resolve(&loan_input).unwrap();

    let roi = project(&office_assumptions(), &loan).unwrap();
    assert_eq!(roi.acquisition_cost, Decimal::ZERO);
    assert!(roi.net_cash_flow_projection[1..10]
        .iter()
        .all(|y| y.cash_on_cash_return.is_zero()));
}

// ===========================================================================
// Envelope tests
// ===========================================================================

#[test]
fn test_analyze_investment_clean_deal_has_no_warnings() {
    let output = analyze_investment(&office_request()).unwrap();
    assert_eq!(output.result.net_cash_flow_projection.len(), 11);
    assert_eq!(output.warnings, Vec::<String>::new());
    assert_eq!(output.assumptions["sale"]["sale_year"], serde_json::json!(10));
}

#[test]
fn test_analyze_investment_flags_cap_rate_mismatch() {
    let mut request = office_request();
    request.deal.going_in_cap_rate = dec!(0.08);
    let output = analyze_investment(&request).unwrap();
    assert!(output.warnings.iter().any(|w| w.contains("cap rate")));
}

#[test]
fn test_analyze_investment_rejects_sale_before_maturity() {
    let mut request = office_request();
    request.sale.sale_year = 5;
    let err = analyze_investment(&request).unwrap_err();
    assert_eq!(err.field(), Some("sale_year"));
}

#[test]
fn test_analyze_investment_propagates_loan_errors() {
    let mut request = office_request();
    request.loan.term = 0;
    let err = analyze_investment(&request).unwrap_err();
    assert_eq!(err.field(), Some("term"));
}

#[test]
fn test_result_serializes_loan_fields() {
    let output = analyze_investment(&office_request()).unwrap();
    let json = serde_json::to_value(&output.result).unwrap();
    assert_eq!(json["loan"]["binding_constraint"], serde_json::json!("LoanToValue"));
    assert!(json["internal_rate_of_return"].is_null());
    assert!(json["net_cash_flow_projection"][0]["sale"].is_null());
    assert!(json["net_cash_flow_projection"][10]["sale"].is_object());
}

// ===========================================================================
// Out-of-range input tests
// ===========================================================================

#[test]
fn test_oversized_amortization_is_rejected() {
    let mut request = office_request();
    request.loan.amortization = 4_000_000_000;
    request.loan.term = 1;
    request.loan.io_period = 0;
    request.loan.rate = dec!(0);
    request.sale.sale_year = 1;
    let err = analyze_investment(&request).unwrap_err();
    assert_eq!(err.field(), Some("amortization"));
}

#[test]
fn test_overflowing_income_is_numeric_fault() {
    let mut request = office_request();
    request.loan.noi = dec!(70_000_000_000_000_000_000_000_000_000);
    request.loan.min_dscr = dec!(0.5);
    match analyze_investment(&request).unwrap_err() {
        UnderwritingError::Numeric { .. } => {}
        other => panic!("Expected numeric fault, got {other:?}"),
    }
}

#[test]
fn test_overflowing_revenue_is_numeric_fault() {
    let mut request = office_request();
    request.deal.initial_revenue = Decimal::MAX;
    request.deal.projected_revenue_growth = dec!(0.5);
    let err = analyze_investment(&request).unwrap_err();
    assert!(matches!(err, UnderwritingError::Numeric { .. }), "{err:?}");
}

#[test]
fn test_quoted_payment_that_misses_the_balance_is_rejected() {
    let loan = resolve(&office_loan()).unwrap();
    // A payment 1,000 short of the computed one leaves a balance behind
    let short = loan.loan_payment() + dec!(1_000);
    let err = time_value::schedule_for_payment(
        loan.terms().rate,
        loan.terms().amortization,
        loan.maximum_loan_amount(),
        Decimal::ZERO,
        PaymentTiming::End,
        short,
    )
    .unwrap_err();
    assert_eq!(err.field(), Some("pv"));
}
