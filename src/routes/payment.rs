use tracing::{info, warn};
use url::form_urlencoded;

use crate::{routes::Route, FarmhubError, Result};

/// Query parameters the payment gateway appends when it sends the
/// customer back. Nothing is verified here, the callback only decides
/// which outcome page to show
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCallback {
    pub response_code: String,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<f64>,
}

impl PaymentCallback {
    pub const SUCCESS_CODE: &'static str = "00";

    /// Parses a query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Result<Self> {
        let mut response_code = None;
        let mut transaction_id = None;
        let mut order_id = None;
        let mut amount = None;

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "responseCode" => response_code = Some(value),
                "transactionId" => transaction_id = Some(value),
                "orderId" => order_id = Some(value),
                "amount" => {
                    amount = Some(value.parse::<f64>().map_err(|_| {
                        FarmhubError::BadRequest(format!("invalid payment amount: {}", value))
                    })?)
                }
                _ => {}
            }
        }

        let response_code = response_code.ok_or_else(|| {
            FarmhubError::BadRequest("payment callback is missing a response code".to_string())
        })?;

        Ok(Self {
            response_code,
            transaction_id,
            order_id,
            amount,
        })
    }

    pub fn is_success(&self) -> bool {
        self.response_code == Self::SUCCESS_CODE
    }

    pub fn redirect(&self) -> Route {
        if self.is_success() {
            Route::OrderSuccess
        } else {
            Route::OrderFailure
        }
    }

    /// Where to send the customer for a raw callback query. Anything that
    /// can't be parsed is treated as a failed payment
    #[tracing::instrument]
    pub fn redirect_for(query: &str) -> Route {
        match Self::from_query(query) {
            Ok(callback) => {
                info!(
                    response_code = %callback.response_code,
                    order_id = ?callback.order_id,
                    transaction_id = ?callback.transaction_id,
                    "payment callback received"
                );
                callback.redirect()
            }
            Err(e) => {
                warn!(err = ?e, "unreadable payment callback");
                Route::OrderFailure
            }
        }
    }
}
