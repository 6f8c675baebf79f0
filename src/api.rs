//! Boundary to the remote prediction service.
//!
//! Everything the dashboard needs from the backend goes through [`FraudApi`]:
//! the transaction log, single-transaction scoring and bulk CSV scoring.
//! [`HttpFraudApi`] is the blocking HTTP implementation; tests substitute
//! their own. Input is validated before any request is built.

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{ApiError, ValidationError};
use crate::notify::{Notifier, Severity};
use crate::record::{transactions_from_maps, FieldValue, Transaction};

pub const FRAUDULENT_LABEL: &str = "Fraudulent";
pub const GENUINE_LABEL: &str = "Genuine";

/// Raw single-prediction input as typed by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionForm {
    pub amount: String,
    pub time: String,
    pub kind: String,
    pub merchant_id: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub amount: f64,
    pub time: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub merchant_id: String,
    pub customer_id: String,
}

impl PredictionForm {
    /// Checks every required field, reporting all missing ones at once, then
    /// parses the numeric ones.
    pub fn validate(&self) -> Result<PredictionRequest, ValidationError> {
        let required = [
            ("amount", &self.amount),
            ("time", &self.time),
            ("type", &self.kind),
            ("merchantId", &self.merchant_id),
            ("customerId", &self.customer_id),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        Ok(PredictionRequest {
            amount: parse_number("amount", &self.amount)?,
            time: parse_number("time", &self.time)?,
            kind: self.kind.trim().to_string(),
            merchant_id: self.merchant_id.trim().to_string(),
            customer_id: self.customer_id.trim().to_string(),
        })
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Scoring result. Older endpoints only send the label and confidence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    #[serde(default)]
    pub is_fraud: Option<u8>,
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl PredictionResponse {
    pub fn is_fraudulent(&self) -> bool {
        match (self.is_fraud, self.prediction.as_deref()) {
            (Some(flag), _) => flag == 1,
            (None, Some(label)) => label == FRAUDULENT_LABEL,
            (None, None) => false,
        }
    }

    pub fn label(&self) -> &str {
        if self.is_fraudulent() {
            FRAUDULENT_LABEL
        } else {
            GENUINE_LABEL
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggedTransaction {
    #[serde(default = "null_value")]
    amount: FieldValue,
    #[serde(default = "null_value")]
    time: FieldValue,
    #[serde(rename = "type", default = "null_value")]
    kind: FieldValue,
    #[serde(default = "null_value")]
    merchant_id: FieldValue,
    #[serde(default = "null_value")]
    customer_id: FieldValue,
}

fn null_value() -> FieldValue {
    FieldValue::Null
}

/// One entry of the service's transaction log.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    transaction: LoggedTransaction,
    #[serde(default)]
    prediction: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl LogEntry {
    /// Flattens the entry into a dashboard record. Customer and merchant
    /// become `nameOrig`/`nameDest`; fraud comes from the prediction label.
    pub fn into_transaction(self) -> Transaction {
        let LoggedTransaction {
            amount,
            time,
            kind,
            merchant_id,
            customer_id,
        } = self.transaction;

        Transaction::new(amount, kind.to_string(), self.prediction == FRAUDULENT_LABEL)
            .with_field("time", time)
            .with_field("nameOrig", customer_id)
            .with_field("nameDest", merchant_id)
            .with_field(
                "confidence",
                self.confidence.map_or(FieldValue::Null, FieldValue::Number),
            )
            .with_field(
                "timestamp",
                self.timestamp.map_or(FieldValue::Null, FieldValue::Text),
            )
    }
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Vec<LogEntry>,
}

/// Parses a `/logs` response body into records.
pub fn parse_logs(body: &str) -> Result<Vec<Transaction>, ApiError> {
    let parsed: LogsResponse = serde_json::from_str(body).map_err(crate::error::RecordError::from)?;
    Ok(parsed.logs.into_iter().map(LogEntry::into_transaction).collect())
}

/// Rejects uploads that are obviously not CSV before they are sent.
pub fn validate_upload(path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::NoFile);
    }
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFile(path.display().to_string()))
    }
}

/// Operations the dashboard consumes from the prediction service.
pub trait FraudApi {
    fn fetch_logs(&self) -> Result<Vec<Transaction>, ApiError>;

    fn fetch_customer_logs(&self, customer_id: &str) -> Result<Vec<Transaction>, ApiError>;

    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ApiError>;

    fn bulk_predict(&self, csv_path: &Path) -> Result<Vec<Transaction>, ApiError>;
}

/// Validates a form and submits it.
pub fn submit_prediction(
    api: &dyn FraudApi,
    form: &PredictionForm,
) -> Result<PredictionResponse, ApiError> {
    let request = form.validate()?;
    api.predict(&request)
}

pub struct HttpFraudApi {
    base_url: String,
    client: Client,
}

impl HttpFraudApi {
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_logs(&self, path: &str) -> Result<Vec<Transaction>, ApiError> {
        let url = self.url(path);
        debug!(%url, "fetching transaction log");
        let body = check_status(self.client.get(&url).send()?)?.text()?;
        let records = parse_logs(&body)?;
        info!(count = records.len(), "fetched transaction log");
        Ok(records)
    }
}

impl FraudApi for HttpFraudApi {
    fn fetch_logs(&self) -> Result<Vec<Transaction>, ApiError> {
        self.get_logs("logs")
    }

    fn fetch_customer_logs(&self, customer_id: &str) -> Result<Vec<Transaction>, ApiError> {
        self.get_logs(&format!("logs/{}", urlencoding::encode(customer_id)))
    }

    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ApiError> {
        let response = self.client.post(self.url("predict")).json(request).send()?;
        let prediction: PredictionResponse = check_status(response)?.json()?;
        info!(
            customer = %request.customer_id,
            label = prediction.label(),
            confidence = ?prediction.confidence,
            "scored transaction"
        );
        Ok(prediction)
    }

    fn bulk_predict(&self, csv_path: &Path) -> Result<Vec<Transaction>, ApiError> {
        validate_upload(csv_path)?;
        let form = multipart::Form::new().file("file", csv_path)?;
        let response = self
            .client
            .post(self.url("bulk-predict"))
            .multipart(form)
            .send()?;
        let rows: Vec<IndexMap<String, FieldValue>> = check_status(response)?.json()?;
        let records = transactions_from_maps(rows)?;
        info!(path = %csv_path.display(), count = records.len(), "bulk scoring complete");
        Ok(records)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.error)
        .unwrap_or(body);
    warn!(status = status.as_u16(), %message, "prediction service returned an error");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Outcome message for a finished bulk scoring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSummary {
    pub analyzed: usize,
    pub fraud_count: usize,
}

impl BulkSummary {
    pub fn of(results: &[Transaction]) -> Self {
        Self {
            analyzed: results.len(),
            fraud_count: results.iter().filter(|tx| tx.is_fraud).count(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Analyzed {} transactions. Found {} potential fraud cases.",
            self.analyzed, self.fraud_count
        )
    }

    pub fn severity(&self) -> Severity {
        if self.fraud_count > 0 {
            Severity::Warning
        } else {
            Severity::Success
        }
    }
}

/// Runs bulk scoring and reports the outcome through `notifier`.
pub fn run_bulk_prediction(
    api: &dyn FraudApi,
    csv_path: &Path,
    notifier: &dyn Notifier,
) -> Result<Vec<Transaction>, ApiError> {
    match api.bulk_predict(csv_path) {
        Ok(results) => {
            let summary = BulkSummary::of(&results);
            notifier.notify("Analysis Complete", &summary.message(), summary.severity());
            Ok(results)
        }
        Err(err) => {
            warn!(error = %err, "bulk scoring failed");
            let body = match &err {
                ApiError::Validation(invalid) => invalid.to_string(),
                _ => "There was an error processing your file. Please try again.".to_string(),
            };
            notifier.notify("Upload Failed", &body, Severity::Destructive);
            Err(err)
        }
    }
}
