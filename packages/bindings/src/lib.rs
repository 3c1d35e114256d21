use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use property_finance_core::time_value::{self, IrrConfig};
use property_finance_core::types::{Money, Rate};
use property_finance_core::PropertyFinanceResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Deserialize `input_json`, run `f`, serialize the result.
fn call_json<I, O>(
    input_json: &str,
    f: impl FnOnce(&I) -> PropertyFinanceResult<O>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investment analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::real_estate::investment::analyze_investment,
    )
}

#[napi]
pub fn screen_acquisition(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::real_estate::returns::screen_acquisition,
    )
}

#[napi]
pub fn total_return(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::real_estate::returns::calculate_total_return,
    )
}

#[napi]
pub fn rental_cash_flow(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::real_estate::rental::analyze_rental_cash_flow,
    )
}

#[napi]
pub fn monthly_dcf(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::real_estate::monthly::analyze_monthly_dcf,
    )
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn mortgage(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::financing::amortization::analyze_mortgage,
    )
}

// ---------------------------------------------------------------------------
// Cash flows
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_cash_flows(input_json: String) -> NapiResult<String> {
    call_json(
        &input_json,
        property_finance_core::cash_flow::analysis::evaluate_cash_flows,
    )
}

#[derive(Deserialize)]
struct NpvRequest {
    rate: Rate,
    cash_flows: Vec<Money>,
}

#[derive(Deserialize)]
struct IrrRequest {
    cash_flows: Vec<Money>,
    #[serde(default)]
    config: IrrConfig,
}

/// `{"rate": "0.08", "cash_flows": [...]}` -> NPV as a decimal string.
#[napi]
pub fn npv(input_json: String) -> NapiResult<String> {
    call_json(&input_json, |req: &NpvRequest| {
        time_value::npv(req.rate, &req.cash_flows)
    })
}

/// `{"cash_flows": [...], "config": {...}}` -> tagged IRR outcome.
#[napi]
pub fn irr(input_json: String) -> NapiResult<String> {
    call_json(&input_json, |req: &IrrRequest| {
        time_value::irr(&req.cash_flows, &req.config)
    })
}
